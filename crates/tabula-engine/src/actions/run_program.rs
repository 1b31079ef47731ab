use tabula_core::instruction::InstructionRecord;
use tracing::debug;

use super::required;
use crate::error::ActionError;
use crate::loader::LoadedSource;
use crate::program::Program;
use crate::registry::{ActionContext, ActionHandler, ActionOutcome};
use crate::report::FrameSummary;

/// Parameter naming the nested program's source.
pub const INPUT_SPECS_PARAM: &str = "inputspecs";

/// Runs another program one level below the current record.
///
/// The child's results are folded into comments on this record, so child
/// failures are informational. The exception is a child instruction that
/// raised an exception: that surfaces here as an exception too.
pub struct RunProgram;

impl ActionHandler for RunProgram {
    fn name(&self) -> &str {
        "RunProgram"
    }

    fn execute(
        &self,
        record: &InstructionRecord,
        ctx: &mut ActionContext<'_>,
    ) -> Result<ActionOutcome, ActionError> {
        let spec = required(record, INPUT_SPECS_PARAM, "InputSpecs")?.trim();
        if spec.is_empty() {
            return Err(ActionError::MissingParam("InputSpecs".into()));
        }

        let level = record.level() + 1;
        let max = ctx.max_depth();
        if level > max {
            return Err(ActionError::DepthExceeded { level, max });
        }

        let LoadedSource { name, rows, dir } = ctx
            .loader()
            .resolve(spec, ctx.source_dir())
            .map_err(|e| ActionError::invalid("InputSpecs", e.to_string()))?;
        let mut program = Program::child_of(record, name, rows);
        if let Some(dir) = dir {
            program = program.with_source_dir(dir);
        }
        debug!(step = record.step(), level, program = program.name(), "entering nested program");

        let summary = ctx.run_program(program);
        fold_child(&summary)
    }
}

fn fold_child(summary: &FrameSummary) -> Result<ActionOutcome, ActionError> {
    if let Some((step, exception)) = summary.first_exception() {
        return Err(ActionError::NestedException {
            program: summary.program.clone(),
            step: step.step,
            exception: exception.to_string(),
        });
    }

    let mut outcome = ActionOutcome::comment(format!(
        "nested program '{}' {}: {}",
        summary.program, summary.state, summary.counters
    ));
    for note in summary.errors.iter().chain(&summary.comments) {
        outcome = outcome.with_comment(note.clone());
    }
    Ok(outcome)
}
