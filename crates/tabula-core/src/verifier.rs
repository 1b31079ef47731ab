//! Stateless string comparison used to decide a single value check.

use crate::enums::VerifyMode;

/// Compare `actual` against `expected` using `mode`.
///
/// Returns a human-readable mismatch message on failure.
pub fn verify(actual: &str, expected: &str, mode: VerifyMode) -> Result<(), String> {
    let ok = match mode {
        VerifyMode::Equals => actual == expected,
        VerifyMode::EqualsIgnoreCase => actual.to_lowercase() == expected.to_lowercase(),
        VerifyMode::NotEquals => actual != expected,
        VerifyMode::Contains => actual.contains(expected),
        VerifyMode::StartsWith => actual.starts_with(expected),
        VerifyMode::EndsWith => actual.ends_with(expected),
        VerifyMode::Empty => actual.is_empty(),
        VerifyMode::NotEmpty => !actual.is_empty(),
    };
    if ok {
        return Ok(());
    }
    let message = match mode {
        VerifyMode::Empty => format!("expected empty value, got '{actual}'"),
        VerifyMode::NotEmpty => "expected a non-empty value".to_string(),
        _ => format!("'{actual}' does not satisfy {mode} '{expected}'"),
    };
    Err(message)
}
