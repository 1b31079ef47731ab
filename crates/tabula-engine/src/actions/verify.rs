use tabula_core::enums::VerifyMode;
use tabula_core::instruction::InstructionRecord;
use tabula_core::verifier::verify;

use super::required;
use crate::error::ActionError;
use crate::registry::{ActionContext, ActionHandler, ActionOutcome};

/// Compares `Actual` against `Expected`. A mismatch is a recorded error.
pub struct Verify;

impl ActionHandler for Verify {
    fn name(&self) -> &str {
        "Verify"
    }

    fn execute(
        &self,
        record: &InstructionRecord,
        _ctx: &mut ActionContext<'_>,
    ) -> Result<ActionOutcome, ActionError> {
        let mode = match record.param("mode").map(str::trim) {
            None | Some("") => VerifyMode::default(),
            Some(name) => VerifyMode::parse(name).ok_or_else(|| {
                let known: Vec<&str> = VerifyMode::ALL.iter().map(|m| m.as_str()).collect();
                ActionError::invalid("Mode", format!("unknown mode '{name}' (expected one of {})", known.join(", ")))
            })?,
        };
        let actual = required(record, "actual", "Actual")?;
        let expected = match mode {
            VerifyMode::Empty | VerifyMode::NotEmpty => record.param("expected").unwrap_or_default(),
            _ => required(record, "expected", "Expected")?,
        };

        Ok(match verify(actual, expected, mode) {
            Ok(()) => ActionOutcome::comment(format!("verified {mode}")),
            Err(mismatch) => ActionOutcome::error(mismatch),
        })
    }
}
