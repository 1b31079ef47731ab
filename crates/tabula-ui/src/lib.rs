//! Terminal output helpers for the tabula CLI.
//!
//! Color styling for step statuses and summaries, plus TTY and color
//! detection.

pub mod styles;
pub mod terminal;
