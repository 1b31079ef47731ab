//! Variable environment for the tabula interpreter.
//!
//! Holds the process-wide, case-insensitive variable store that every
//! instruction reads from, the `{name}` substitution routine, and the
//! `%date...%` token expansion that writes bundles of derived date variables.

pub mod date;
pub mod environment;
pub mod substitute;

pub use date::{DateExpansion, DateToken, DateTokenError};
pub use environment::{Clock, VariableEnvironment};
pub use substitute::substitute_vars;
