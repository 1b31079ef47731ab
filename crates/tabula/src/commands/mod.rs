//! Command handlers, one module per subcommand.

pub mod actions;
pub mod check;
pub mod date;
pub mod init;
pub mod run;
pub mod version;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

/// Parse an `--at` value.
pub(crate) fn parse_instant(value: &str) -> Result<DateTime<Utc>> {
    let at = DateTime::parse_from_rfc3339(value.trim())
        .with_context(|| format!("invalid --at '{value}': expected an RFC 3339 timestamp"))?;
    Ok(at.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_instant_normalizes_to_utc() {
        let at = parse_instant("2015-02-06T10:00:00+02:00").unwrap();
        assert_eq!(at, Utc.with_ymd_and_hms(2015, 2, 6, 8, 0, 0).unwrap());
        assert!(parse_instant("yesterday").is_err());
    }
}
