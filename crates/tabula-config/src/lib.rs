//! Configuration for the tabula runner.
//!
//! This crate loads `.tabula/config.yaml` (or `config.toml`) layered under
//! `TABULA_*` environment variables, and discovers the `.tabula/` project
//! directory by walking up the filesystem.

pub mod config;
pub mod project_dir;

pub use config::{ConfigError, RunnerConfig, ScreenshotPolicy, load_config, save_config};
pub use project_dir::{ensure_project_dir, find_project_dir};
