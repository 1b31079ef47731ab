//! Built-in actions.
//!
//! | Action       | Parameters                         |
//! |--------------|------------------------------------|
//! | `SetVars`    | every non-reserved pair            |
//! | `ClearVars`  | `Names` (optional, comma-separated)|
//! | `Comment`    | uses the description               |
//! | `Verify`     | `Actual`, `Expected`, `Mode`       |
//! | `Fail`       | `Message` (optional)               |
//! | `Pause`      | `Millis`                           |
//! | `RunProgram` | `InputSpecs`                       |
//! | `SetPolicy`  | `QuitCase`, `QuitSession`, `Skip`  |

mod flow;
mod run_program;
mod vars;
mod verify;

pub use flow::{Comment, Fail, Pause, SetPolicy};
pub use run_program::{INPUT_SPECS_PARAM, RunProgram};
pub use vars::{ClearVars, SetVars};
pub use verify::Verify;

use tabula_core::enums::Activation;
use tabula_core::instruction::InstructionRecord;
use tabula_core::policy::{ON_FAIL_PARAM, ON_PASS_PARAM};

use crate::error::ActionError;
use crate::registry::ActionRegistry;

pub(crate) fn register_builtins(registry: &mut ActionRegistry) {
    registry.register(SetVars);
    registry.register(ClearVars);
    registry.register(Comment);
    registry.register(Verify);
    registry.register(Fail);
    registry.register(Pause);
    registry.register(RunProgram);
    registry.register(SetPolicy);
}

/// Parameters consumed by the runner itself rather than by handlers.
fn is_reserved(key: &str) -> bool {
    key == ON_PASS_PARAM || key == ON_FAIL_PARAM
}

fn required<'r>(record: &'r InstructionRecord, key: &str, display: &str) -> Result<&'r str, ActionError> {
    record
        .param(key)
        .ok_or_else(|| ActionError::MissingParam(display.to_string()))
}

/// Read an optional boolean parameter using activation-flag spelling.
fn flag(record: &InstructionRecord, key: &str, display: &str) -> Result<bool, ActionError> {
    match record.param(key) {
        None => Ok(false),
        Some(value) => Activation::parse(value)
            .map(|a| a == Activation::Active)
            .ok_or_else(|| ActionError::invalid(display, format!("expected yes or no, got '{value}'"))),
    }
}

/// Read an optional unsigned parameter.
fn number<T: std::str::FromStr>(
    record: &InstructionRecord,
    key: &str,
    display: &str,
) -> Result<Option<T>, ActionError> {
    record
        .param(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ActionError::invalid(display, format!("expected a number, got '{value}'")))
        })
        .transpose()
}
