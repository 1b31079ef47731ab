//! `tabula init` -- create `.tabula/config.yaml` with defaults.

use std::env;

use anyhow::{Context, Result, bail};
use tabula_config::{RunnerConfig, ensure_project_dir, save_config};

use crate::cli::InitArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `tabula init` command.
pub fn run(ctx: &RuntimeContext, args: &InitArgs) -> Result<()> {
    let base = match &ctx.project_dir {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("failed to get current directory")?,
    };
    let dir = ensure_project_dir(&base)
        .with_context(|| format!("failed to create {}", base.display()))?;

    let config_path = dir.join("config.yaml");
    if config_path.exists() && !args.force {
        bail!(
            "{} already exists\n\nUse --force to overwrite it with defaults.",
            config_path.display()
        );
    }
    save_config(&dir, &RunnerConfig::default())
        .with_context(|| format!("failed to write {}", config_path.display()))?;

    if ctx.json {
        output_json(&serde_json::json!({ "config": config_path }))?;
    } else if !ctx.quiet {
        println!("Initialized tabula project in {}", dir.display());
    }
    Ok(())
}
