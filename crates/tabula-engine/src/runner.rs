//! [`Runner`] -- the recursive interpreter.
//!
//! One call to [`Runner::run_frame`] executes one [`Program`]: every record is
//! counted and initialized against the session environment. Active records
//! then have their parameters resolved and are dispatched, and the post-test
//! policy decides whether to skip ahead or stop. Nested programs recurse through the `RunProgram` action, sharing the
//! same [`SessionContext`].

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use chrono::FixedOffset;
use tabula_config::{ConfigError, RunnerConfig};
use tabula_core::counters::Counters;
use tabula_core::enums::Status;
use tabula_core::instruction::{InstructionRecord, StepPosition, StepResult};
use tabula_core::params::ParamSyntax;
use tabula_core::policy::Directive;
use tabula_vars::VariableEnvironment;
use tracing::{debug, info, warn};

use crate::capture::{FailureCapture, NoCapture};
use crate::error::ReportError;
use crate::loader::ProgramLoader;
use crate::program::Program;
use crate::registry::{ActionContext, ActionRegistry, Dispatch};
use crate::report::{FrameState, FrameSummary, Reporter, SessionSummary};
use crate::session::SessionContext;

/// Comment recorded on records skipped because of an earlier `skip:N`.
pub const FORCED_SKIP_COMMENT: &str = "skipped by prior step's post-test policy";

/// Executes programs. Holds everything that is fixed for a run; all mutable
/// run state lives in the [`SessionContext`] passed to each call.
pub struct Runner {
    config: RunnerConfig,
    syntax: ParamSyntax,
    offset: FixedOffset,
    registry: ActionRegistry,
    loader: ProgramLoader,
    reporters: Vec<Box<dyn Reporter>>,
    capture: Box<dyn FailureCapture>,
    interrupt: Arc<AtomicBool>,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            config: RunnerConfig::default(),
            syntax: ParamSyntax::default(),
            offset: VariableEnvironment::new().offset(),
            registry: ActionRegistry::with_builtins(),
            loader: ProgramLoader::default(),
            reporters: Vec::new(),
            capture: Box::new(NoCapture),
            interrupt: Arc::default(),
        }
    }
}

impl Runner {
    /// A runner with the built-in actions, validating `config` first.
    pub fn new(config: RunnerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            syntax: config.param_syntax()?,
            offset: config.offset()?,
            config,
            ..Self::default()
        })
    }

    pub fn with_registry(mut self, registry: ActionRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_loader(mut self, loader: ProgramLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporters.push(Box::new(reporter));
        self
    }

    pub fn with_capture(mut self, capture: impl FailureCapture + 'static) -> Self {
        self.capture = Box::new(capture);
        self
    }

    /// Share a flag that, once raised, stops the session before its next
    /// instruction.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = flag;
        self
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupt.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn loader(&self) -> &ProgramLoader {
        &self.loader
    }

    /// A fresh session whose environment uses the configured offset.
    pub fn new_session(&self) -> SessionContext {
        SessionContext::new(VariableEnvironment::new().with_offset(self.offset))
    }

    /// Run `program` as the outermost frame and summarize the session.
    pub fn run(&self, program: Program, session: &mut SessionContext) -> SessionSummary {
        let name = program.name().to_string();
        self.run_frame(program, session);

        let summary = SessionSummary::new(name, session.counters(), session.is_terminated());
        info!(
            outcome = %summary.outcome,
            counters = %summary.counters,
            "session finished"
        );
        self.notify(|r| r.on_session(&summary));
        summary
    }

    /// Execute one program frame to a terminal state.
    pub fn run_frame(&self, program: Program, session: &mut SessionContext) -> FrameSummary {
        let parent_step = program.parent_step();
        let Program {
            name,
            source_dir,
            records,
            level,
            ..
        } = program;

        let mut frame = Frame::new(name, level, parent_step);
        frame.state = FrameState::Running;
        info!(
            program = %frame.program,
            level,
            parent_step,
            instructions = records.len(),
            "program started"
        );

        let mut steps_to_skip: u32 = 0;
        for (index, mut record) in records.into_iter().enumerate() {
            let seq = index + 1;
            if record.is_empty() {
                debug!(level, seq, "ignoring row without action");
                continue;
            }
            if self.is_interrupted() {
                session.terminate();
                frame.interrupt(seq);
                break;
            }

            let reportable = !self.config.is_unreported(record.action());
            let step = session.begin(reportable);
            frame.counters.begin();
            record.initialize(
                StepPosition {
                    seq,
                    level,
                    parent_step,
                    step,
                },
                &session.env,
            );

            if steps_to_skip > 0 {
                record.force_skip(FORCED_SKIP_COMMENT);
                steps_to_skip -= 1;
            }

            let mut directive = Directive::default();
            if record.is_active() {
                record.resolve_params(&mut session.env, &self.syntax);
                directive = self.execute(&mut record, session, source_dir.as_deref());
                steps_to_skip = directive.skip_steps;
                if directive.quit_session {
                    session.terminate();
                }
            }

            let status = record.status();
            session.record(status, reportable);
            frame.counters.record(status);
            info!(
                level,
                seq,
                step,
                id = record.id(),
                action = record.action(),
                status = %status,
                "step"
            );

            let result = record.result();
            self.notify(|r| r.on_step(&result));
            frame.steps.push(result);

            if directive.stops_program() || session.is_terminated() {
                let reason = if directive.stops_program() {
                    directive.label()
                } else if self.is_interrupted() {
                    "interrupt"
                } else {
                    "quitsession in nested program"
                };
                frame.terminate(session.is_terminated(), reason, &record);
                break;
            }
        }

        if frame.state == FrameState::Running {
            frame.state = FrameState::Completed;
        }
        let summary = frame.finish(session.reportable());
        info!(
            program = %summary.program,
            level,
            state = %summary.state,
            counters = %summary.counters,
            "program finished"
        );
        self.notify(|r| r.on_frame(&summary));
        session.reset_reportable();
        summary
    }

    /// Dispatch an active record and work out the resulting directive.
    fn execute(
        &self,
        record: &mut InstructionRecord,
        session: &mut SessionContext,
        source_dir: Option<&Path>,
    ) -> Directive {
        let dispatch = if record.has_errors() {
            debug!(step = record.step(), "setup errors recorded, not dispatching");
            Dispatch::default()
        } else {
            let mut ctx = ActionContext::new(self, session, source_dir);
            self.registry.dispatch(record, &mut ctx)
        };

        let status = record.status();
        if dispatch.interactive && self.config.screenshot.should_capture(status == Status::Fail) {
            self.capture_artifact(record);
        }
        if self.config.step_delay_ms > 0 {
            thread::sleep(Duration::from_millis(self.config.step_delay_ms));
        }

        Directive::from(record.policy().for_status(status)).merge(dispatch.directive)
    }

    fn capture_artifact(&self, record: &mut InstructionRecord) {
        match self.capture.capture(record) {
            Ok(Some(path)) => record.record_comment(format!("captured {}", path.display())),
            Ok(None) => {}
            Err(e) => warn!(step = record.step(), error = %e, "failure capture failed"),
        }
    }

    fn notify(&self, f: impl Fn(&dyn Reporter) -> Result<(), ReportError>) {
        for reporter in &self.reporters {
            if let Err(e) = f(reporter.as_ref()) {
                warn!(error = %e, "reporter failed");
            }
        }
    }
}

/// Mutable state of one frame while it runs.
struct Frame {
    program: String,
    level: usize,
    parent_step: u64,
    state: FrameState,
    counters: Counters,
    comments: Vec<String>,
    errors: Vec<String>,
    steps: Vec<StepResult>,
}

impl Frame {
    fn new(program: String, level: usize, parent_step: u64) -> Self {
        Self {
            program,
            level,
            parent_step,
            state: FrameState::Ready,
            counters: Counters::default(),
            comments: Vec::new(),
            errors: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Stop early and note why. The blurb is an error when the frame has
    /// already failed, a comment otherwise.
    fn terminate(&mut self, session_wide: bool, reason: &str, record: &InstructionRecord) {
        self.state = if session_wide {
            FrameState::SessionTerminated
        } else {
            FrameState::CaseTerminated
        };
        let blurb = format!(
            "level {} stopped by {reason} at step {} (id '{}')",
            self.level,
            record.step(),
            record.id()
        );
        if self.counters.has_failures() {
            self.errors.push(blurb);
        } else {
            self.comments.push(blurb);
        }
    }

    /// Stop before instruction `seq` because the run was interrupted.
    fn interrupt(&mut self, seq: usize) {
        self.state = FrameState::SessionTerminated;
        let blurb = format!("level {} interrupted before instruction {seq}", self.level);
        if self.counters.has_failures() {
            self.errors.push(blurb);
        } else {
            self.comments.push(blurb);
        }
    }

    fn finish(self, reportable: Counters) -> FrameSummary {
        FrameSummary {
            program: self.program,
            level: self.level,
            parent_step: self.parent_step,
            state: self.state,
            counters: self.counters,
            reportable,
            comments: self.comments,
            errors: self.errors,
            steps: self.steps,
        }
    }
}
