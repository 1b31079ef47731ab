//! Frame and session summaries, and the sinks they are emitted to.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tabula_core::counters::Counters;
use tabula_core::instruction::StepResult;

use crate::error::ReportError;

/// Lifecycle of one program frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameState {
    Ready,
    Running,
    /// Stopped early; enclosing frames carry on.
    CaseTerminated,
    /// Stopped early together with every enclosing frame.
    SessionTerminated,
    /// Ran out of instructions.
    Completed,
}

impl FrameState {
    /// Whether the frame reached one of its terminal states.
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            Self::CaseTerminated | Self::SessionTerminated | Self::Completed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Running => "running",
            Self::CaseTerminated => "case-terminated",
            Self::SessionTerminated => "session-terminated",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for FrameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one program frame did, emitted once when the frame finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSummary {
    pub program: String,
    pub level: usize,
    pub parent_step: u64,
    pub state: FrameState,
    /// Instance counters of this frame.
    pub counters: Counters,
    /// Reportable tier at the moment of emission.
    pub reportable: Counters,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    pub steps: Vec<StepResult>,
}

impl FrameSummary {
    pub fn failed(&self) -> bool {
        self.counters.has_failures() || !self.errors.is_empty()
    }

    /// First step in this frame that recorded an exception.
    pub fn first_exception(&self) -> Option<(&StepResult, &str)> {
        self.steps
            .iter()
            .find_map(|s| s.exception.as_deref().map(|e| (s, e)))
    }
}

/// Final verdict of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed,
    Terminated,
}

impl Outcome {
    /// Process exit code: 0 when passed, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Passed => 0,
            Self::Failed | Self::Terminated => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Produced once per run, after the outermost frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub program: String,
    pub counters: Counters,
    pub terminated: bool,
    pub outcome: Outcome,
}

impl SessionSummary {
    pub fn new(program: impl Into<String>, counters: Counters, terminated: bool) -> Self {
        let outcome = if terminated {
            Outcome::Terminated
        } else if counters.has_failures() {
            Outcome::Failed
        } else {
            Outcome::Passed
        };
        Self {
            program: program.into(),
            counters,
            terminated,
            outcome,
        }
    }
}

// ---------------------------------------------------------------------------
// Reporter trait
// ---------------------------------------------------------------------------

/// Sink for run results. Every method has a no-op default.
///
/// A failing reporter is logged and never fails the run.
pub trait Reporter {
    /// Called once per counted instruction, after its outcome is final.
    fn on_step(&self, _step: &StepResult) -> Result<(), ReportError> {
        Ok(())
    }

    /// Called once per finished program frame.
    fn on_frame(&self, _frame: &FrameSummary) -> Result<(), ReportError> {
        Ok(())
    }

    /// Called once per run.
    fn on_session(&self, _session: &SessionSummary) -> Result<(), ReportError> {
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum ReportLine<'a> {
    Frame(&'a FrameSummary),
    Session(&'a SessionSummary),
}

/// Writes one JSON object per frame and per session.
pub struct JsonlReporter<W: Write> {
    writer: Mutex<W>,
}

impl JsonlReporter<BufWriter<File>> {
    /// Append to the file at `path`, creating it if needed.
    pub fn create(path: &Path) -> Result<Self, ReportError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonlReporter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    fn write_line(&self, line: &ReportLine<'_>) -> Result<(), ReportError> {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        serde_json::to_writer(&mut *writer, line)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

impl<W: Write> Reporter for JsonlReporter<W> {
    fn on_frame(&self, frame: &FrameSummary) -> Result<(), ReportError> {
        self.write_line(&ReportLine::Frame(frame))
    }

    fn on_session(&self, session: &SessionSummary) -> Result<(), ReportError> {
        self.write_line(&ReportLine::Session(session))
    }
}

/// Collects everything in memory. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryReporter {
    inner: Arc<Mutex<Collected>>,
}

#[derive(Debug, Default)]
struct Collected {
    steps: Vec<StepResult>,
    frames: Vec<FrameSummary>,
    sessions: Vec<SessionSummary>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<T>(&self, f: impl FnOnce(&mut Collected) -> T) -> T {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    pub fn steps(&self) -> Vec<StepResult> {
        self.with(|c| c.steps.clone())
    }

    /// Frames in the order they finished (innermost first).
    pub fn frames(&self) -> Vec<FrameSummary> {
        self.with(|c| c.frames.clone())
    }

    pub fn sessions(&self) -> Vec<SessionSummary> {
        self.with(|c| c.sessions.clone())
    }
}

impl Reporter for MemoryReporter {
    fn on_step(&self, step: &StepResult) -> Result<(), ReportError> {
        self.with(|c| c.steps.push(step.clone()));
        Ok(())
    }

    fn on_frame(&self, frame: &FrameSummary) -> Result<(), ReportError> {
        self.with(|c| c.frames.push(frame.clone()));
        Ok(())
    }

    fn on_session(&self, session: &SessionSummary) -> Result<(), ReportError> {
        self.with(|c| c.sessions.push(session.clone()));
        Ok(())
    }
}
