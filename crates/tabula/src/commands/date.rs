//! `tabula date` -- expand a date token.

use anyhow::{Context, Result};
use tabula_vars::date::parse_offset;
use tabula_vars::{Clock, VariableEnvironment};

use super::parse_instant;
use crate::cli::DateArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `tabula date` command.
pub fn run(ctx: &RuntimeContext, args: &DateArgs) -> Result<()> {
    let offset = match &args.offset {
        Some(offset) => parse_offset(offset)?,
        None => ctx.load_config()?.offset()?,
    };
    let clock = match &args.at {
        Some(at) => Clock::Fixed(parse_instant(at)?),
        None => Clock::System,
    };

    let mut env = VariableEnvironment::new()
        .with_clock(clock)
        .with_offset(offset);
    let expansion = env
        .expand_date_token(&args.token)
        .with_context(|| format!("cannot expand '{}'", args.token))?;

    if ctx.json {
        return output_json(&serde_json::json!({
            "token": args.token,
            "value": expansion.value,
            "bundle": expansion.bundle,
        }));
    }

    println!("{}", expansion.value);
    if !ctx.quiet {
        for (key, value) in &expansion.bundle {
            println!("  {key} = {value}");
        }
    }
    Ok(())
}
