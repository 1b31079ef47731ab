//! Runtime context for command execution.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tabula_config::{RunnerConfig, find_project_dir, load_config};

use crate::cli::GlobalArgs;

/// Runtime context passed to every command handler.
///
/// Constructed once in `main` after CLI parsing, before command dispatch.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Explicit `.tabula/` directory from `--dir`.
    pub project_dir: Option<PathBuf>,

    /// Whether to produce JSON output.
    pub json: bool,

    /// Verbose logging.
    pub verbose: bool,

    /// Quiet mode: suppress non-essential output.
    pub quiet: bool,

    /// Raised by the first Ctrl+C; a running program stops before its
    /// next instruction.
    pub interrupt: Arc<AtomicBool>,
}

impl RuntimeContext {
    pub fn from_global_args(global: &GlobalArgs) -> Self {
        Self {
            project_dir: global.dir.clone(),
            json: global.json,
            verbose: global.verbose,
            quiet: global.quiet,
            interrupt: Arc::default(),
        }
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupt.load(Ordering::SeqCst)
    }

    /// The project directory: `--dir` if given, otherwise discovered from
    /// the working directory. `None` when there is no project.
    pub fn resolve_project_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.project_dir {
            return Some(dir.clone());
        }
        let cwd = env::current_dir().ok()?;
        find_project_dir(&cwd)
    }

    /// Load the layered runner configuration for this invocation.
    pub fn load_config(&self) -> Result<RunnerConfig> {
        let dir = self.resolve_project_dir();
        load_config(dir.as_deref()).with_context(|| match &dir {
            Some(d) => format!("failed to load configuration from {}", d.display()),
            None => "failed to load configuration".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_dir_wins() {
        let global = GlobalArgs {
            dir: Some(PathBuf::from("/tmp/somewhere/.tabula")),
            json: false,
            verbose: false,
            quiet: true,
        };
        let ctx = RuntimeContext::from_global_args(&global);
        assert_eq!(
            ctx.resolve_project_dir(),
            Some(PathBuf::from("/tmp/somewhere/.tabula"))
        );
        assert!(ctx.quiet);
        assert!(!ctx.is_interrupted());
    }
}
