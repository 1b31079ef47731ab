//! Clap CLI definitions for the `tabula` command.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// tabula -- run programs written as tables of instructions.
#[derive(Parser, Debug)]
#[command(
    name = "tabula",
    about = "Data-driven instruction interpreter",
    long_about = "Runs programs written as rows of (id, action, parameters, description) \
                  with variable substitution, date tokens, post-test policies and nested programs.",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Project directory (default: $TABULA_DIR, or discover .tabula/ upwards).
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug logging on stderr.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output (errors only).
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a program file.
    Run(RunArgs),

    /// Check a program file for problems without running it.
    #[command(alias = "lint")]
    Check(CheckArgs),

    /// List the registered actions.
    Actions,

    /// Expand a %date...% token and print the generated variables.
    Date(DateArgs),

    /// Create .tabula/config.yaml with default settings.
    Init(InitArgs),

    /// Print version information.
    Version,
}

/// Arguments for `tabula run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Program file (.jsonl/.json for JSON Lines, anything else is TSV).
    pub file: PathBuf,

    /// Preset variable (key=value), repeatable.
    #[arg(long = "var", value_name = "KEY=VALUE")]
    pub vars: Vec<String>,

    /// Append frame and session summaries to this JSONL file.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Override the nesting ceiling.
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,

    /// Override the delay after each dispatched step.
    #[arg(long, value_name = "MS")]
    pub delay_ms: Option<u64>,

    /// Evaluate date tokens against this RFC 3339 instant instead of now.
    #[arg(long, value_name = "RFC3339")]
    pub at: Option<String>,
}

/// Arguments for `tabula check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Program file to check.
    pub file: PathBuf,
}

/// Arguments for `tabula date`.
#[derive(Args, Debug)]
pub struct DateArgs {
    /// Token such as `%date+1day,date,long%`.
    pub token: String,

    /// Reference instant (RFC 3339, default: now).
    #[arg(long, value_name = "RFC3339")]
    pub at: Option<String>,

    /// Timezone offset such as +02:00 (default: configured timezone-offset).
    #[arg(long, value_name = "OFFSET", allow_hyphen_values = true)]
    pub offset: Option<String>,
}

/// Arguments for `tabula init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config.yaml.
    #[arg(long)]
    pub force: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_accepts_repeated_vars() {
        let cli = Cli::parse_from(["tabula", "run", "main.tsv", "--var", "a=1", "--var", "b=2"]);
        match cli.command {
            Some(Commands::Run(args)) => {
                assert_eq!(args.file, PathBuf::from("main.tsv"));
                assert_eq!(args.vars, vec!["a=1", "b=2"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::parse_from(["tabula", "actions", "--json"]);
        assert!(cli.global.json);
    }
}
