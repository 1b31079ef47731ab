//! `tabula` -- data-driven instruction interpreter CLI.
//!
//! Parses CLI arguments with clap, resolves the runtime context, and
//! dispatches to command handlers. Exit codes: 0 when a run passes, 1 when
//! it fails or is terminated (or `check` finds errors), 2 for setup and
//! usage errors, 130 after Ctrl+C.

mod cli;
mod commands;
mod context;
mod output;

use std::sync::atomic::Ordering;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use context::RuntimeContext;

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "TABULA_LOG";

/// Filter used by `--verbose` when `TABULA_LOG` is unset.
const VERBOSE_FILTER: &str =
    "tabula=debug,tabula_engine=debug,tabula_config=debug,tabula_vars=debug";

/// Exit code for setup and usage errors.
const EXIT_SETUP: i32 = 2;

/// Exit code after an interrupt (128 + SIGINT).
const EXIT_INTERRUPTED: i32 = 130;

fn main() {
    let cli = Cli::parse();
    let ctx = RuntimeContext::from_global_args(&cli.global);
    init_logging(ctx.verbose);

    // First Ctrl+C: stop the run before its next instruction. Second: exit now.
    let interrupt = ctx.interrupt.clone();
    let _ = ctrlc::set_handler(move || {
        if interrupt.swap(true, Ordering::SeqCst) {
            std::process::exit(EXIT_INTERRUPTED);
        }
    });

    let result = match cli.command {
        Some(Commands::Run(args)) => commands::run::run(&ctx, &args).map(|outcome| {
            if ctx.is_interrupted() {
                EXIT_INTERRUPTED
            } else {
                outcome.exit_code()
            }
        }),
        Some(Commands::Check(args)) => commands::check::run(&ctx, &args),
        Some(Commands::Actions) => commands::actions::run(&ctx).map(|()| 0),
        Some(Commands::Date(args)) => commands::date::run(&ctx, &args).map(|()| 0),
        Some(Commands::Init(args)) => commands::init::run(&ctx, &args).map(|()| 0),
        Some(Commands::Version) => commands::version::run(&ctx).map(|()| 0),
        None => {
            // No subcommand -- print help
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(0)
        }
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            if cli.global.json {
                let err_json = serde_json::json!({
                    "error": format!("{:#}", e),
                });
                if let Ok(s) = serde_json::to_string_pretty(&err_json) {
                    eprintln!("{}", s);
                }
            } else {
                eprintln!("Error: {:#}", e);
            }
            std::process::exit(EXIT_SETUP);
        }
    }
}

/// Logs go to stderr, filtered by `TABULA_LOG`, or at debug level for
/// `--verbose`. Without either, nothing is installed.
fn init_logging(verbose: bool) {
    let filter = match EnvFilter::try_from_env(LOG_ENV) {
        Ok(filter) => filter,
        Err(_) if verbose => EnvFilter::new(VERBOSE_FILTER),
        Err(_) => return,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
