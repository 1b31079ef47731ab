use std::thread;
use std::time::Duration;

use tabula_core::instruction::InstructionRecord;
use tabula_core::policy::Directive;

use super::{flag, number, required};
use crate::error::ActionError;
use crate::registry::{ActionContext, ActionHandler, ActionOutcome};

/// Records the substituted description. Always passes.
pub struct Comment;

impl ActionHandler for Comment {
    fn name(&self) -> &str {
        "Comment"
    }

    fn execute(
        &self,
        record: &InstructionRecord,
        _ctx: &mut ActionContext<'_>,
    ) -> Result<ActionOutcome, ActionError> {
        let text = record.description().trim();
        if text.is_empty() {
            return Ok(ActionOutcome::pass());
        }
        Ok(ActionOutcome::comment(text))
    }
}

/// Fails unconditionally with `Message`, falling back to the description.
pub struct Fail;

impl ActionHandler for Fail {
    fn name(&self) -> &str {
        "Fail"
    }

    fn execute(
        &self,
        record: &InstructionRecord,
        _ctx: &mut ActionContext<'_>,
    ) -> Result<ActionOutcome, ActionError> {
        let message = record
            .param("message")
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .or_else(|| Some(record.description().trim()).filter(|d| !d.is_empty()))
            .unwrap_or("failed by instruction");
        Ok(ActionOutcome::error(message))
    }
}

/// Blocks for `Millis` milliseconds.
pub struct Pause;

impl ActionHandler for Pause {
    fn name(&self) -> &str {
        "Pause"
    }

    fn execute(
        &self,
        record: &InstructionRecord,
        _ctx: &mut ActionContext<'_>,
    ) -> Result<ActionOutcome, ActionError> {
        required(record, "millis", "Millis")?;
        let millis: u64 = number(record, "millis", "Millis")?.unwrap_or_default();
        thread::sleep(Duration::from_millis(millis));
        Ok(ActionOutcome::comment(format!("paused {millis}ms")))
    }
}

/// Requests flow control from the handler side.
///
/// `QuitCase` and `QuitSession` take yes/no; `Skip` takes a count.
pub struct SetPolicy;

impl ActionHandler for SetPolicy {
    fn name(&self) -> &str {
        "SetPolicy"
    }

    fn execute(
        &self,
        record: &InstructionRecord,
        _ctx: &mut ActionContext<'_>,
    ) -> Result<ActionOutcome, ActionError> {
        let directive = Directive {
            quit_case: flag(record, "quitcase", "QuitCase")?,
            quit_session: flag(record, "quitsession", "QuitSession")?,
            skip_steps: number(record, "skip", "Skip")?.unwrap_or_default(),
        };
        Ok(ActionOutcome::pass().with_directive(directive))
    }
}
