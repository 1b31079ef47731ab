//! `tabula check` -- static checks on a program file.

use anyhow::{Context, Result};
use serde::Serialize;
use tabula_core::validation::{RowIssue, Severity, check_rows};
use tabula_engine::{ActionRegistry, load_path};
use tabula_ui::styles::{render_fail, render_pass, render_warn};

use crate::cli::CheckArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

#[derive(Serialize)]
struct CheckReport<'a> {
    program: &'a str,
    rows: usize,
    errors: usize,
    warnings: usize,
    issues: &'a [RowIssue],
}

/// Execute the `tabula check` command. Returns the process exit code:
/// 1 when any issue is an error, otherwise 0.
pub fn run(ctx: &RuntimeContext, args: &CheckArgs) -> Result<i32> {
    let config = ctx.load_config()?;
    let syntax = config.param_syntax()?;
    let source = load_path(&args.file)
        .with_context(|| format!("failed to load program {}", args.file.display()))?;

    let registry = ActionRegistry::with_builtins();
    let issues = check_rows(&source.rows, &syntax, &registry.names());
    let errors = issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count();
    let warnings = issues.len() - errors;

    if ctx.json {
        output_json(&CheckReport {
            program: &source.name,
            rows: source.rows.len(),
            errors,
            warnings,
            issues: &issues,
        })?;
    } else {
        for issue in &issues {
            let line = issue.to_string();
            match issue.severity {
                Severity::Error => println!("{}", render_fail(&line)),
                Severity::Warning if !ctx.quiet => println!("{}", render_warn(&line)),
                Severity::Warning => {}
            }
        }
        if !ctx.quiet {
            let verdict = format!(
                "{}: {} rows, {} errors, {} warnings",
                source.name,
                source.rows.len(),
                errors,
                warnings
            );
            if errors > 0 {
                println!("{}", render_fail(&verdict));
            } else {
                println!("{}", render_pass(&verdict));
            }
        }
    }

    Ok(if errors > 0 { 1 } else { 0 })
}
