use tabula_core::instruction::InstructionRecord;

use super::is_reserved;
use crate::error::ActionError;
use crate::registry::{ActionContext, ActionHandler, ActionOutcome};

/// Copies every parameter into the environment.
///
/// Values were substituted (and date tokens expanded) just before dispatch,
/// so `SetVars` sees the environment as it was before itself.
pub struct SetVars;

impl ActionHandler for SetVars {
    fn name(&self) -> &str {
        "SetVars"
    }

    fn execute(
        &self,
        record: &InstructionRecord,
        ctx: &mut ActionContext<'_>,
    ) -> Result<ActionOutcome, ActionError> {
        let mut set = 0;
        for (key, value) in record.params().iter().filter(|(k, _)| !is_reserved(k)) {
            ctx.env_mut().set(key, value);
            set += 1;
        }
        Ok(ActionOutcome::comment(format!("set {set} variable(s)")))
    }
}

/// Removes the variables listed in `Names`, or every user variable.
pub struct ClearVars;

impl ActionHandler for ClearVars {
    fn name(&self) -> &str {
        "ClearVars"
    }

    fn execute(
        &self,
        record: &InstructionRecord,
        ctx: &mut ActionContext<'_>,
    ) -> Result<ActionOutcome, ActionError> {
        let Some(names) = record.param("names") else {
            ctx.env_mut().clear_user_vars();
            return Ok(ActionOutcome::comment("cleared all variables"));
        };

        let mut cleared = 0;
        for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            if ctx.env_mut().remove(name).is_some() {
                cleared += 1;
            }
        }
        Ok(ActionOutcome::comment(format!("cleared {cleared} variable(s)")))
    }
}
