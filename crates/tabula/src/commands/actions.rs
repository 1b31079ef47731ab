//! `tabula actions` -- list the registered actions.

use anyhow::Result;
use tabula_engine::ActionRegistry;

use crate::context::RuntimeContext;
use crate::output::{output_json, output_table};

/// Execute the `tabula actions` command.
pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let registry = ActionRegistry::with_builtins();

    if ctx.json {
        let actions: Vec<serde_json::Value> = registry
            .iter()
            .map(|h| {
                serde_json::json!({
                    "name": h.name(),
                    "interactive": h.requires_interactive_surface(),
                })
            })
            .collect();
        return output_json(&actions);
    }

    let rows: Vec<Vec<String>> = registry
        .iter()
        .map(|h| {
            let interactive = if h.requires_interactive_surface() { "yes" } else { "no" };
            vec![h.name().to_string(), interactive.to_string()]
        })
        .collect();
    output_table(&["ACTION", "INTERACTIVE"], &rows);
    Ok(())
}
