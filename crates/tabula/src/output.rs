//! Output formatting helpers for the `tabula` CLI.
//!
//! JSON output, simple tables, and the console reporter that prints each
//! step as it finishes.

use std::io::{self, Write};

use serde::Serialize;
use tabula_engine::{FrameSummary, Outcome, ReportError, Reporter, SessionSummary};
use tabula_core::instruction::StepResult;
use tabula_ui::styles::{
    LEVEL_INDENT, TREE_CHILD, render_bold, render_counters, render_fail, render_muted,
    render_pass, render_step, render_warn,
};

/// Print a value as pretty-printed JSON to stdout.
pub fn output_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    // Ignore broken pipe errors (e.g., piped to `head`)
    let _ = writeln!(handle, "{}", json);
    Ok(())
}

/// Print a simple table with headers and rows.
///
/// Column widths are computed from the data for alignment.
pub fn output_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let _ = write!(handle, "{}", format_table(headers, rows));
}

fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let mut out = pad_line(headers, &widths);
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let separator: Vec<&str> = separator.iter().map(String::as_str).collect();
    out.push_str(&pad_line(&separator, &widths));
    for row in rows {
        let cells: Vec<&str> = row.iter().map(String::as_str).collect();
        out.push_str(&pad_line(&cells, &widths));
    }
    out
}

fn pad_line(cells: &[&str], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .enumerate()
        .map(|(i, cell)| match widths.get(i) {
            Some(w) => format!("{:<width$}", cell, width = *w),
            None => cell.to_string(),
        })
        .collect();
    format!("{}\n", padded.join("  ").trim_end())
}

/// One line closing a frame: `{indent}{program} (level N) {state}: counters`.
pub fn format_frame_line(frame: &FrameSummary) -> String {
    let indent = LEVEL_INDENT.repeat(frame.level.saturating_sub(1));
    let state = if frame.failed() {
        render_fail(frame.state.as_str())
    } else {
        render_muted(frame.state.as_str())
    };
    let mut lines = vec![format!(
        "{indent}{} (level {}) {}: {}",
        render_bold(&frame.program),
        frame.level,
        state,
        render_counters(&frame.counters),
    )];
    for error in &frame.errors {
        lines.push(format!("{indent}{TREE_CHILD}{}", render_fail(error)));
    }
    for comment in &frame.comments {
        lines.push(format!("{indent}{TREE_CHILD}{}", render_muted(comment)));
    }
    lines.join("\n")
}

/// The closing line of a run.
pub fn format_session_line(session: &SessionSummary) -> String {
    let outcome = match session.outcome {
        Outcome::Passed => render_pass("PASSED"),
        Outcome::Failed => render_fail("FAILED"),
        Outcome::Terminated => render_warn("TERMINATED"),
    };
    format!(
        "{} {}: {}",
        outcome,
        session.program,
        render_counters(&session.counters)
    )
}

/// Prints steps and frame results to stdout as they happen.
pub struct ConsoleReporter {
    quiet: bool,
}

impl ConsoleReporter {
    /// In quiet mode only failing steps are printed.
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Reporter for ConsoleReporter {
    fn on_step(&self, step: &StepResult) -> Result<(), ReportError> {
        if self.quiet && step.errors.is_empty() && step.exception.is_none() {
            return Ok(());
        }
        writeln!(io::stdout().lock(), "{}", render_step(step))?;
        Ok(())
    }

    fn on_frame(&self, frame: &FrameSummary) -> Result<(), ReportError> {
        if self.quiet {
            return Ok(());
        }
        writeln!(io::stdout().lock(), "{}", format_frame_line(frame))?;
        Ok(())
    }
}
