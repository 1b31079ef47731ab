//! [`VariableEnvironment`] -- the shared, case-insensitive variable store.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, FixedOffset, Offset, Utc};
use tracing::debug;

use crate::date::{self, DateExpansion, DateToken, DateTokenError};
use crate::substitute::substitute_vars;

/// Prefix reserved for generated date variables.
pub const RESERVED_PREFIX: char = '$';

/// Source of the reference instant used by date tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Clock {
    /// The wall clock at the moment of expansion.
    #[default]
    System,
    /// A fixed instant (reproducible runs and tests).
    Fixed(DateTime<Utc>),
}

impl Clock {
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Self::System => Utc::now(),
            Self::Fixed(at) => *at,
        }
    }
}

/// Process-wide variable store.
///
/// Keys are lower-cased on the way in and on lookup. A missing key reads as
/// the empty string.
#[derive(Debug, Clone)]
pub struct VariableEnvironment {
    vars: HashMap<String, String>,
    clock: Clock,
    offset: FixedOffset,
}

impl Default for VariableEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl VariableEnvironment {
    /// Creates an empty environment using the system clock and UTC.
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
            clock: Clock::System,
            offset: utc(),
        }
    }

    /// Replaces the clock used for date tokens.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the timezone offset applied before rendering date tokens.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    pub fn set_offset(&mut self, offset: FixedOffset) {
        self.offset = offset;
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The reference instant in the configured offset.
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.clock.now().with_timezone(&self.offset)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.vars.insert(key.to_ascii_lowercase(), value.into());
    }

    /// Returns the value for `key`, or `""` when unset.
    pub fn get(&self, key: &str) -> &str {
        self.vars
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(&key.to_ascii_lowercase())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.vars.remove(&key.to_ascii_lowercase())
    }

    /// Removes every variable that is not a reserved date variable.
    pub fn clear_user_vars(&mut self) {
        self.vars.retain(|k, _| k.starts_with(RESERVED_PREFIX));
    }

    /// Removes everything (session reset).
    pub fn clear(&mut self) {
        self.vars.clear();
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// A sorted snapshot of all variables.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.vars
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Replace every `{name}` in `template` with its value. Never fails.
    pub fn substitute(&self, template: &str) -> String {
        substitute_vars(template, &self.vars)
    }

    /// Expand a `%date...%` token against the current clock and merge the
    /// generated bundle into the environment.
    ///
    /// Bundle entries are only written when their value changed. On error
    /// the environment is left untouched.
    pub fn expand_date_token(&mut self, token: &str) -> Result<DateExpansion, DateTokenError> {
        let parsed = DateToken::parse(token)?;
        let at = parsed
            .shifted(self.now())
            .ok_or_else(|| DateTokenError::OutOfRange(token.to_string()))?;

        let bundle = date::render_bundle(&at);
        let mut changed = 0;
        for (key, value) in &bundle {
            if self.vars.get(key) != Some(value) {
                self.vars.insert(key.clone(), value.clone());
                changed += 1;
            }
        }
        debug!(token, changed, "expanded date token");

        Ok(DateExpansion {
            value: date::render(&at, parsed.output_type, parsed.output_style),
            bundle,
            changed,
        })
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}
