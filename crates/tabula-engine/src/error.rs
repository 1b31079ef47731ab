//! Engine error types.

use std::path::PathBuf;

use tabula_core::rows::RowError;

/// Errors raised by action handlers.
///
/// `MissingParam` and `InvalidParam` describe a malformed instruction and are
/// recorded as plain errors. Every other variant is an execution exception:
/// the record gets both an exception and an error.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// A required parameter is absent.
    #[error("missing required parameter '{0}'")]
    MissingParam(String),

    /// A parameter is present but unusable.
    #[error("invalid value for parameter '{param}': {reason}")]
    InvalidParam {
        /// Parameter name as the handler knows it.
        param: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A nested program would go deeper than `max-depth`.
    #[error("nesting level {level} exceeds max-depth {max}")]
    DepthExceeded { level: usize, max: usize },

    /// An instruction inside a nested program raised an exception.
    #[error("nested program '{program}' raised an exception at step {step}: {exception}")]
    NestedException {
        program: String,
        step: u64,
        exception: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other handler failure.
    #[error("{0}")]
    Failed(String),
}

impl ActionError {
    pub fn invalid(param: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParam {
            param: param.into(),
            reason: reason.into(),
        }
    }

    /// Whether this describes a malformed instruction rather than a fault.
    pub fn is_setup_error(&self) -> bool {
        matches!(self, Self::MissingParam(_) | Self::InvalidParam { .. })
    }
}

/// Errors resolving an `InputSpecs` reference into instruction rows.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("invalid input spec '{0}' (expected <provider>:<source>)")]
    InvalidSpec(String),

    #[error("unknown provider '{0}' (expected jsonl, tsv or inline)")]
    UnknownProvider(String),

    #[error("inline program '{0}' is not registered")]
    NotRegistered(String),

    #[error("failed to read {path}: {source}")]
    Rows {
        path: PathBuf,
        #[source]
        source: RowError,
    },
}

/// Errors writing reports.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
