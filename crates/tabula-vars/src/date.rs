//! `%date...%` token parsing and rendering.
//!
//! A token has the shape `%date[+|-N unit][,outputType][,outputStyle]%`
//! (case-insensitive). Expanding it renders a bundle of `$`-prefixed
//! variables describing the shifted instant, e.g. `$shortdate`,
//! `$longyear`, `$hours24`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Months, Offset, TimeDelta, Utc};

/// Errors produced while parsing a date token or a UTC offset.
///
/// The `Display` text is meant to be recorded verbatim on an instruction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateTokenError {
    #[error("not a date token: '{0}' (expected %date[+|-N unit][,type][,style]%)")]
    NotAToken(String),

    #[error("invalid date shift '{shift}' in '{token}': {reason}")]
    InvalidShift {
        token: String,
        shift: String,
        reason: String,
    },

    #[error("unknown date unit '{unit}' in '{token}' (expected years, months, days, hours, minutes or seconds)")]
    UnknownUnit { token: String, unit: String },

    #[error("unknown output type '{0}' (expected date, time, datetime, year, month, day, weekday, hours, minutes or seconds)")]
    UnknownOutputType(String),

    #[error("unknown output style '{0}' (expected short, medium, long or full)")]
    UnknownOutputStyle(String),

    #[error("too many fields in date token '{0}'")]
    TooManyFields(String),

    #[error("date shift in '{0}' is out of range")]
    OutOfRange(String),

    #[error("invalid timezone offset '{0}' (expected +HH:MM or -HH:MM)")]
    InvalidOffset(String),
}

/// Unit of a date shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateUnit {
    Years,
    Months,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl DateUnit {
    fn parse(s: &str) -> Option<Self> {
        let unit = match s.to_ascii_lowercase().as_str() {
            "year" | "years" => Self::Years,
            "month" | "months" => Self::Months,
            "day" | "days" => Self::Days,
            "hour" | "hours" => Self::Hours,
            "minute" | "minutes" => Self::Minutes,
            "second" | "seconds" => Self::Seconds,
            _ => return None,
        };
        Some(unit)
    }
}

/// What a token renders as its own value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputType {
    #[default]
    Date,
    Time,
    DateTime,
    Year,
    Month,
    Day,
    Weekday,
    Hours,
    Minutes,
    Seconds,
}

impl OutputType {
    /// Types that get one bundle entry per style.
    const STYLED: [OutputType; 7] = [
        Self::Date,
        Self::Time,
        Self::DateTime,
        Self::Year,
        Self::Month,
        Self::Day,
        Self::Weekday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Weekday => "weekday",
            Self::Hours => "hours",
            Self::Minutes => "minutes",
            Self::Seconds => "seconds",
        }
    }
}

impl FromStr for OutputType {
    type Err = DateTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = match s.trim().to_ascii_lowercase().as_str() {
            "date" => Self::Date,
            "time" => Self::Time,
            "datetime" => Self::DateTime,
            "year" => Self::Year,
            "month" => Self::Month,
            "day" => Self::Day,
            "weekday" => Self::Weekday,
            "hours" | "hour" => Self::Hours,
            "minutes" | "minute" => Self::Minutes,
            "seconds" | "second" => Self::Seconds,
            other => return Err(DateTokenError::UnknownOutputType(other.to_string())),
        };
        Ok(t)
    }
}

/// Rendering verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputStyle {
    #[default]
    Short,
    Medium,
    Long,
    Full,
}

impl OutputStyle {
    const ALL: [OutputStyle; 4] = [Self::Short, Self::Medium, Self::Long, Self::Full];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
            Self::Full => "full",
        }
    }
}

impl FromStr for OutputStyle {
    type Err = DateTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let style = match s.trim().to_ascii_lowercase().as_str() {
            "short" => Self::Short,
            "medium" => Self::Medium,
            "long" => Self::Long,
            "full" => Self::Full,
            other => return Err(DateTokenError::UnknownOutputStyle(other.to_string())),
        };
        Ok(style)
    }
}

/// A parsed `%date...%` token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DateToken {
    /// Signed amount and unit to shift the reference instant by.
    pub shift: Option<(i64, DateUnit)>,
    pub output_type: OutputType,
    pub output_style: OutputStyle,
}

/// Result of expanding a token against an environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateExpansion {
    /// The requested rendering (type + style) of the shifted instant.
    pub value: String,
    /// Every derived variable, keyed by its reserved `$` name.
    pub bundle: BTreeMap<String, String>,
    /// How many environment entries actually changed when merging.
    pub changed: usize,
}

/// Returns `true` if `value` looks like a date token (`%date...%`).
///
/// This only checks the envelope; [`DateToken::parse`] validates the body.
pub fn is_date_token(value: &str) -> bool {
    let v = value.trim();
    v.len() >= 6
        && v.ends_with('%')
        && v.get(..5).is_some_and(|p| p.eq_ignore_ascii_case("%date"))
}

impl DateToken {
    /// Parse a full token including the surrounding `%` markers.
    pub fn parse(token: &str) -> Result<Self, DateTokenError> {
        let trimmed = token.trim();
        if !is_date_token(trimmed) {
            return Err(DateTokenError::NotAToken(token.to_string()));
        }
        let body = &trimmed[5..trimmed.len() - 1];
        let parts: Vec<&str> = body.split(',').collect();
        if parts.len() > 3 {
            return Err(DateTokenError::TooManyFields(token.to_string()));
        }

        let shift_part = parts[0].trim();
        let shift = if shift_part.is_empty() {
            None
        } else {
            Some(parse_shift(token, shift_part)?)
        };

        let output_type = match parts.get(1).map(|s| s.trim()) {
            Some(t) if !t.is_empty() => t.parse()?,
            _ => OutputType::default(),
        };
        let output_style = match parts.get(2).map(|s| s.trim()) {
            Some(s) if !s.is_empty() => s.parse()?,
            _ => OutputStyle::default(),
        };

        Ok(Self {
            shift,
            output_type,
            output_style,
        })
    }

    /// Apply the shift (if any) to `at`.
    pub fn shifted(&self, at: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        let Some((amount, unit)) = self.shift else {
            return Some(at);
        };
        match unit {
            DateUnit::Years => shift_months(at, amount.checked_mul(12)?),
            DateUnit::Months => shift_months(at, amount),
            DateUnit::Days => at.checked_add_signed(TimeDelta::try_days(amount)?),
            DateUnit::Hours => at.checked_add_signed(TimeDelta::try_hours(amount)?),
            DateUnit::Minutes => at.checked_add_signed(TimeDelta::try_minutes(amount)?),
            DateUnit::Seconds => at.checked_add_signed(TimeDelta::try_seconds(amount)?),
        }
    }
}

impl fmt::Display for DateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("%date")?;
        if let Some((amount, unit)) = self.shift {
            let unit = match unit {
                DateUnit::Years => "years",
                DateUnit::Months => "months",
                DateUnit::Days => "days",
                DateUnit::Hours => "hours",
                DateUnit::Minutes => "minutes",
                DateUnit::Seconds => "seconds",
            };
            write!(f, "{amount:+}{unit}")?;
        }
        write!(
            f,
            ",{},{}%",
            self.output_type.as_str(),
            self.output_style.as_str()
        )
    }
}

fn parse_shift(token: &str, shift: &str) -> Result<(i64, DateUnit), DateTokenError> {
    let invalid = |reason: &str| DateTokenError::InvalidShift {
        token: token.to_string(),
        shift: shift.to_string(),
        reason: reason.to_string(),
    };

    let (sign, rest) = match shift.as_bytes()[0] {
        b'+' => (1i64, &shift[1..]),
        b'-' => (-1i64, &shift[1..]),
        _ => return Err(invalid("must start with '+' or '-'")),
    };
    let rest = rest.trim_start();
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return Err(invalid("missing amount"));
    }
    let amount: i64 = rest[..digits]
        .parse()
        .map_err(|_| invalid("amount is too large"))?;
    let unit_str = rest[digits..].trim();
    if unit_str.is_empty() {
        return Err(invalid("missing unit"));
    }
    let unit = DateUnit::parse(unit_str).ok_or_else(|| DateTokenError::UnknownUnit {
        token: token.to_string(),
        unit: unit_str.to_string(),
    })?;
    Ok((sign * amount, unit))
}

fn shift_months(at: DateTime<FixedOffset>, months: i64) -> Option<DateTime<FixedOffset>> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        at.checked_add_months(magnitude)
    } else {
        at.checked_sub_months(magnitude)
    }
}

/// Parse a `+HH:MM` / `-HH:MM` (or `Z`) offset.
pub fn parse_offset(s: &str) -> Result<FixedOffset, DateTokenError> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }
    let invalid = || DateTokenError::InvalidOffset(s.to_string());
    let sign = match s.as_bytes()[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return Err(invalid()),
    };
    let (h, m) = s[1..].split_once(':').unwrap_or((&s[1..], "0"));
    let (hours, minutes) = match (unsigned(h), unsigned(m)) {
        (Some(hours), Some(minutes)) if hours <= 23 && minutes <= 59 => (hours, minutes),
        _ => return Err(invalid()),
    };
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Bare ASCII digits only; `str::parse` would also take a sign.
fn unsigned(s: &str) -> Option<i32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Render one output type in one style.
pub fn render(at: &DateTime<FixedOffset>, output: OutputType, style: OutputStyle) -> String {
    use OutputStyle as S;
    use OutputType as T;

    let pattern = match (output, style) {
        (T::Date, S::Short) => "%-m/%-d/%y",
        (T::Date, S::Medium) => "%b %-d, %Y",
        (T::Date, S::Long) => "%B %-d, %Y",
        (T::Date, S::Full) => "%A, %B %-d, %Y",
        (T::Time, S::Short) => "%-I:%M %p",
        (T::Time, S::Medium) => "%-I:%M:%S %p",
        (T::Time, S::Long | S::Full) => "%-I:%M:%S %p %:z",
        (T::DateTime, _) => {
            return format!("{} {}", render(at, T::Date, style), render(at, T::Time, style));
        }
        (T::Year, S::Short) => "%y",
        (T::Year, _) => "%Y",
        (T::Month, S::Short) => "%-m",
        (T::Month, S::Medium) => "%m",
        (T::Month, S::Long) => "%b",
        (T::Month, S::Full) => "%B",
        (T::Day, S::Short) => "%-d",
        (T::Day, _) => "%d",
        (T::Weekday, S::Short | S::Medium) => "%a",
        (T::Weekday, S::Long | S::Full) => "%A",
        (T::Hours, S::Short) => "%-H",
        (T::Hours, _) => "%H",
        (T::Minutes, _) => "%M",
        (T::Seconds, _) => "%S",
    };
    at.format(pattern).to_string()
}

/// Render the complete `$`-prefixed variable bundle for `at`.
pub fn render_bundle(at: &DateTime<FixedOffset>) -> BTreeMap<String, String> {
    let mut bundle = BTreeMap::new();
    for style in OutputStyle::ALL {
        for output in OutputType::STYLED {
            bundle.insert(
                format!("${}{}", style.as_str(), output.as_str()),
                render(at, output, style),
            );
        }
    }
    bundle.insert("$hours24".into(), at.format("%H").to_string());
    bundle.insert("$hours12".into(), at.format("%-I").to_string());
    bundle.insert("$minutes".into(), at.format("%M").to_string());
    bundle.insert("$seconds".into(), at.format("%S").to_string());
    bundle.insert("$ampm".into(), at.format("%p").to_string());
    bundle.insert("$millis".into(), at.format("%3f").to_string());
    bundle.insert("$timestamp".into(), at.timestamp_millis().to_string());
    bundle
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn feb_6_2014() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2014, 2, 6, 15, 4, 5)
            .unwrap()
    }

    #[test]
    fn detects_envelope() {
        assert!(is_date_token("%date%"));
        assert!(is_date_token("%DATE+1days%"));
        assert!(!is_date_token("%dat%"));
        assert!(!is_date_token("date"));
        assert!(!is_date_token("%date"));
    }

    #[test]
    fn parse_bare_token() {
        assert_eq!(DateToken::parse("%date%").unwrap(), DateToken::default());
    }

    #[test]
    fn parse_full_token() {
        let t = DateToken::parse("%Date+1Years,Year,Long%").unwrap();
        assert_eq!(t.shift, Some((1, DateUnit::Years)));
        assert_eq!(t.output_type, OutputType::Year);
        assert_eq!(t.output_style, OutputStyle::Long);
    }

    #[test]
    fn parse_negative_shift_with_space() {
        let t = DateToken::parse("%date-3 days,date,full%").unwrap();
        assert_eq!(t.shift, Some((-3, DateUnit::Days)));
    }

    #[test]
    fn parse_type_without_shift() {
        let t = DateToken::parse("%date,weekday%").unwrap();
        assert_eq!(t.shift, None);
        assert_eq!(t.output_type, OutputType::Weekday);
        assert_eq!(t.output_style, OutputStyle::Short);
    }

    #[test]
    fn malformed_tokens_describe_the_problem() {
        let err = DateToken::parse("%date+xdays%").unwrap_err();
        assert!(err.to_string().contains("missing amount"), "{err}");

        let err = DateToken::parse("%date+2fortnights%").unwrap_err();
        assert!(matches!(err, DateTokenError::UnknownUnit { .. }));

        let err = DateToken::parse("%date,century%").unwrap_err();
        assert!(err.to_string().contains("century"));

        let err = DateToken::parse("%date,date,tiny%").unwrap_err();
        assert!(matches!(err, DateTokenError::UnknownOutputStyle(_)));

        let err = DateToken::parse("%date,a,b,c%").unwrap_err();
        assert!(matches!(err, DateTokenError::TooManyFields(_)));

        let err = DateToken::parse("3days").unwrap_err();
        assert!(matches!(err, DateTokenError::NotAToken(_)));
    }

    #[test]
    fn shift_by_year_yields_next_year() {
        let t = DateToken::parse("%date+1years,year,long%").unwrap();
        let at = t.shifted(feb_6_2014()).unwrap();
        assert_eq!(render(&at, t.output_type, t.output_style), "2015");
    }

    #[test]
    fn month_shift_clamps_to_month_end() {
        let jan31 = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2015, 1, 31, 0, 0, 0)
            .unwrap();
        let t = DateToken::parse("%date+1months%").unwrap();
        let at = t.shifted(jan31).unwrap();
        assert_eq!(render(&at, OutputType::Date, OutputStyle::Short), "2/28/15");
    }

    #[test]
    fn renders_date_styles() {
        let at = feb_6_2014();
        assert_eq!(render(&at, OutputType::Date, OutputStyle::Short), "2/6/14");
        assert_eq!(render(&at, OutputType::Date, OutputStyle::Medium), "Feb 6, 2014");
        assert_eq!(render(&at, OutputType::Date, OutputStyle::Long), "February 6, 2014");
        assert_eq!(
            render(&at, OutputType::Date, OutputStyle::Full),
            "Thursday, February 6, 2014"
        );
        assert_eq!(render(&at, OutputType::Time, OutputStyle::Short), "3:04 PM");
    }

    #[test]
    fn bundle_contains_components() {
        let bundle = render_bundle(&feb_6_2014());
        assert_eq!(bundle["$longyear"], "2014");
        assert_eq!(bundle["$shortyear"], "14");
        assert_eq!(bundle["$fullmonth"], "February");
        assert_eq!(bundle["$mediummonth"], "02");
        assert_eq!(bundle["$hours24"], "15");
        assert_eq!(bundle["$hours12"], "3");
        assert_eq!(bundle["$ampm"], "PM");
        assert_eq!(bundle["$fullweekday"], "Thursday");
    }

    #[test]
    fn parses_offsets() {
        assert_eq!(parse_offset("+05:30").unwrap().local_minus_utc(), 19800);
        assert_eq!(parse_offset("-08:00").unwrap().local_minus_utc(), -28800);
        assert_eq!(parse_offset("Z").unwrap().local_minus_utc(), 0);
        assert!(parse_offset("05:30").is_err());
        assert!(parse_offset("+25:00").is_err());
        assert!(parse_offset("+-5:00").is_err());
        assert!(parse_offset("-+5:00").is_err());
        assert!(parse_offset("+05:-30").is_err());
        assert!(parse_offset("+").is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        let t = DateToken::parse("%date-2hours,time,medium%").unwrap();
        assert_eq!(DateToken::parse(&t.to_string()).unwrap(), t);
    }
}
