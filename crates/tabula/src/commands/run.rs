//! `tabula run` -- execute a program file.

use std::io;

use anyhow::{Context, Result, bail};
use tabula_engine::{JsonlReporter, Outcome, Runner, load_path};
use tabula_vars::Clock;
use tracing::debug;

use super::parse_instant;
use crate::cli::RunArgs;
use crate::context::RuntimeContext;
use crate::output::{ConsoleReporter, format_session_line};

/// Execute the `tabula run` command.
pub fn run(ctx: &RuntimeContext, args: &RunArgs) -> Result<Outcome> {
    let mut config = ctx.load_config()?;
    if let Some(max_depth) = args.max_depth {
        config.max_depth = max_depth;
    }
    if let Some(delay) = args.delay_ms {
        config.step_delay_ms = delay;
    }
    if let Some(report) = &args.report {
        config.report_path = Some(report.clone());
    }
    config.validate().context("invalid option")?;

    let vars = parse_var_flags(&args.vars)?;
    let clock = match &args.at {
        Some(at) => Clock::Fixed(parse_instant(at)?),
        None => Clock::System,
    };

    let source = load_path(&args.file)
        .with_context(|| format!("failed to load program {}", args.file.display()))?;
    let report_path = config.report_path.clone();

    let mut runner = Runner::new(config)?.with_interrupt(ctx.interrupt.clone());
    runner = if ctx.json {
        runner.with_reporter(JsonlReporter::new(io::stdout()))
    } else {
        runner.with_reporter(ConsoleReporter::new(ctx.quiet))
    };
    if let Some(path) = report_path {
        let reporter = JsonlReporter::create(&path)
            .with_context(|| format!("failed to open report file {}", path.display()))?;
        runner = runner.with_reporter(reporter);
    }

    let mut session = runner.new_session();
    session.env.set_clock(clock);
    for (key, value) in &vars {
        session.env.set(key, value.as_str());
    }
    debug!(program = %source.name, rows = source.rows.len(), vars = vars.len(), "starting run");

    let summary = runner.run(source.into_program(), &mut session);
    if !ctx.json {
        println!("{}", format_session_line(&summary));
    }
    Ok(summary.outcome)
}

/// Parse `--var key=value` flags, keeping their order.
pub(crate) fn parse_var_flags(vars: &[String]) -> Result<Vec<(String, String)>> {
    let mut parsed = Vec::with_capacity(vars.len());
    for v in vars {
        let Some((key, value)) = v.split_once('=') else {
            bail!("invalid variable format '{}': expected key=value", v);
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("invalid variable format '{}': key is empty", v);
        }
        parsed.push((key.to_string(), value.to_string()));
    }
    Ok(parsed)
}
