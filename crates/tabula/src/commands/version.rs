//! `tabula version` -- print version, platform and interpreter capabilities.

use anyhow::Result;
use serde::Serialize;
use tabula_core::instruction::InstructionRow;
use tabula_engine::ActionRegistry;

use crate::context::RuntimeContext;
use crate::output::output_json;

/// Version string, from the workspace version.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build identifier. Can be overridden via environment variable at build time.
const BUILD: &str = {
    match option_env!("TABULA_BUILD") {
        Some(b) => b,
        None => "dev",
    }
};

/// Row sources `run` accepts, by file extension.
const ROW_FORMATS: [&str; 2] = ["jsonl", "tsv"];

#[derive(Debug, Serialize)]
struct VersionInfo {
    version: &'static str,
    build: &'static str,
    os: &'static str,
    arch: &'static str,
    row_fields: usize,
    row_formats: &'static [&'static str],
    actions: Vec<String>,
}

impl VersionInfo {
    fn current() -> Self {
        let registry = ActionRegistry::with_builtins();
        Self {
            version: VERSION,
            build: BUILD,
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            row_fields: InstructionRow::FIELD_COUNT,
            row_formats: &ROW_FORMATS,
            actions: registry.names().into_iter().map(String::from).collect(),
        }
    }

    fn headline(&self) -> String {
        format!(
            "tabula version {} ({}) {}/{}",
            self.version, self.build, self.os, self.arch
        )
    }

    fn capabilities(&self) -> String {
        format!(
            "{}-field rows ({}), {} built-in actions",
            self.row_fields,
            self.row_formats.join(", "),
            self.actions.len()
        )
    }
}

/// Execute the `tabula version` command.
pub fn run(ctx: &RuntimeContext) -> Result<()> {
    let info = VersionInfo::current();
    if ctx.json {
        output_json(&info)?;
    } else {
        println!("{}", info.headline());
        if !ctx.quiet {
            println!("{}", info.capabilities());
        }
    }
    Ok(())
}
