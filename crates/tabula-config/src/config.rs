//! Runner configuration.
//!
//! The main entry point is [`RunnerConfig`], which represents the contents of
//! `.tabula/config.yaml`. Configuration is loaded with [`load_config`] and
//! saved with [`save_config`].

use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use tabula_core::params::{DEFAULT_DELIMITER, DEFAULT_VALID_DELIMITERS, ParamSyntax};
use thiserror::Error;

/// Prefix of environment variables that override configuration keys.
pub const ENV_PREFIX: &str = "TABULA_";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration layer could not be merged or extracted.
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// The configuration could not be serialized.
    #[error("failed to write config file: {0}")]
    Serialize(#[from] serde_yaml::Error),

    /// The `.tabula/` directory was not found.
    #[error("no .tabula directory found (run 'tabula init' first)")]
    ProjectDirNotFound,

    /// A configuration value was invalid.
    #[error("invalid configuration value for key '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::Load(Box::new(e))
    }
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Screenshot policy
// ---------------------------------------------------------------------------

/// When the failure-capture hook runs for actions that drive an
/// interactive surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ScreenshotPolicy {
    Never,
    #[default]
    OnFailure,
    Always,
}

impl ScreenshotPolicy {
    /// Whether a record that finished with `failed` should be captured.
    pub fn should_capture(&self, failed: bool) -> bool {
        match self {
            Self::Never => false,
            Self::OnFailure => failed,
            Self::Always => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Main config struct
// ---------------------------------------------------------------------------

/// The runner configuration, corresponding to `.tabula/config.yaml`.
///
/// All fields use `serde` defaults so a partially specified file yields
/// sensible values for everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunnerConfig {
    /// Parameter pair delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Characters that may lead a parameter blob to override the delimiter.
    #[serde(default = "default_valid_delimiters")]
    pub valid_delimiters: String,

    /// Deepest allowed program nesting level.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Pause after each executed instruction.
    #[serde(default)]
    pub step_delay_ms: u64,

    #[serde(default)]
    pub screenshot: ScreenshotPolicy,

    /// Actions excluded from the reportable counter tier.
    #[serde(default)]
    pub unreported_actions: Vec<String>,

    /// Fixed offset (`+HH:MM`) used for date tokens.
    #[serde(default = "default_timezone_offset")]
    pub timezone_offset: String,

    /// Append frame summaries to this JSONL file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            valid_delimiters: default_valid_delimiters(),
            max_depth: default_max_depth(),
            step_delay_ms: 0,
            screenshot: ScreenshotPolicy::default(),
            unreported_actions: Vec::new(),
            timezone_offset: default_timezone_offset(),
            report_path: None,
        }
    }
}

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

fn default_valid_delimiters() -> String {
    DEFAULT_VALID_DELIMITERS.to_string()
}

fn default_max_depth() -> usize {
    32
}

fn default_timezone_offset() -> String {
    "+00:00".to_string()
}

// ---------------------------------------------------------------------------
// Helper methods on RunnerConfig
// ---------------------------------------------------------------------------

impl RunnerConfig {
    /// Parameter splitting rules derived from `delimiter` and
    /// `valid-delimiters`.
    pub fn param_syntax(&self) -> Result<ParamSyntax> {
        let mut chars = self.delimiter.chars();
        let delimiter = match (chars.next(), chars.next()) {
            (Some(c), None) if c != '=' => c,
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: "delimiter".into(),
                    reason: format!("expected a single character other than '=', got '{}'", self.delimiter),
                });
            }
        };
        if self.valid_delimiters.contains('=') {
            return Err(ConfigError::InvalidValue {
                key: "valid-delimiters".into(),
                reason: "'=' cannot be a delimiter".into(),
            });
        }
        Ok(ParamSyntax {
            delimiter,
            valid_delimiters: self.valid_delimiters.clone(),
        })
    }

    /// The configured timezone offset.
    pub fn offset(&self) -> Result<FixedOffset> {
        tabula_vars::date::parse_offset(&self.timezone_offset).map_err(|e| {
            ConfigError::InvalidValue {
                key: "timezone-offset".into(),
                reason: e.to_string(),
            }
        })
    }

    /// Whether `action` is excluded from the reportable counters.
    pub fn is_unreported(&self, action: &str) -> bool {
        self.unreported_actions
            .iter()
            .any(|a| a.trim().eq_ignore_ascii_case(action.trim()))
    }

    /// Check every derived value at once.
    pub fn validate(&self) -> Result<()> {
        self.param_syntax()?;
        self.offset()?;
        if self.max_depth == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max-depth".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// The layered configuration sources for a project directory: defaults,
/// then `config.yaml`, then `config.toml`, then `TABULA_*` variables.
///
/// Passing `None` skips the file layers.
pub fn figment(project_dir: Option<&Path>) -> Figment {
    let mut figment = Figment::from(Serialized::defaults(RunnerConfig::default()));
    if let Some(dir) = project_dir {
        figment = figment
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Toml::file(dir.join("config.toml")));
    }
    figment.merge(Env::prefixed(ENV_PREFIX).map(|key| key.as_str().replace('_', "-").into()))
}

/// Load configuration for the given `.tabula/` directory.
///
/// Missing files are skipped, so a missing directory yields defaults plus
/// environment overrides.
///
/// # Errors
///
/// Returns [`ConfigError::Load`] if a layer is malformed, or
/// [`ConfigError::InvalidValue`] if a value fails validation.
pub fn load_config(project_dir: Option<&Path>) -> Result<RunnerConfig> {
    let config: RunnerConfig = figment(project_dir).extract()?;
    config.validate()?;
    Ok(config)
}

/// Save configuration to `config.yaml` inside the given `.tabula/` directory.
///
/// The directory is created if it does not exist.
pub fn save_config(project_dir: &Path, config: &RunnerConfig) -> Result<()> {
    std::fs::create_dir_all(project_dir)?;
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(project_dir.join("config.yaml"), yaml)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
