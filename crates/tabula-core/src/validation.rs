//! Static checks on instruction rows, run before anything executes.
//!
//! These catch the problems that would otherwise only show up as setup
//! errors at run time. Values that still contain `{placeholders}` are not
//! checked since their final form depends on the environment.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use tabula_vars::DateToken;
use tabula_vars::date::is_date_token;
use tabula_vars::substitute::extract_vars;

use crate::enums::Activation;
use crate::instruction::InstructionRow;
use crate::params::{ParamSyntax, Parameters};
use crate::policy::{ON_FAIL_PARAM, ON_PASS_PARAM, PolicyAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// One finding for one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    /// 1-based position among the rows.
    pub row: usize,
    pub id: String,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for RowIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}", self.row)?;
        if !self.id.is_empty() {
            write!(f, " ({})", self.id)?;
        }
        write!(f, ": {}: {}", self.severity, self.message)
    }
}

/// Check every row. `known_actions` is the list of registered action names
/// (case-insensitive); an empty list disables the unknown-action check.
pub fn check_rows(
    rows: &[InstructionRow],
    syntax: &ParamSyntax,
    known_actions: &[&str],
) -> Vec<RowIssue> {
    let mut issues = Vec::new();
    let mut seen_ids = HashSet::new();

    for (i, row) in rows.iter().enumerate() {
        let mut push = |severity, message: String| {
            issues.push(RowIssue {
                row: i + 1,
                id: row.id.clone(),
                severity,
                message,
            })
        };

        if row.is_empty() {
            push(Severity::Warning, "blank action, row will be ignored".into());
            continue;
        }

        let action = row.action.trim();
        if !known_actions.is_empty()
            && !known_actions.iter().any(|a| a.eq_ignore_ascii_case(action))
        {
            push(Severity::Error, format!("unknown action '{action}'"));
        }

        let id = row.id.trim();
        if !id.is_empty() && !seen_ids.insert(id.to_ascii_lowercase()) {
            push(Severity::Warning, format!("duplicate id '{id}'"));
        }

        if !has_placeholder(&row.activation) && Activation::parse(&row.activation).is_none() {
            push(
                Severity::Warning,
                format!("unrecognised activation flag '{}'", row.activation.trim()),
            );
        }

        let params = match Parameters::parse(&row.parameters, syntax) {
            Ok(params) => params,
            Err(e) => {
                push(Severity::Error, format!("invalid parameters: {e}"));
                continue;
            }
        };

        for (key, value) in params.iter() {
            if has_placeholder(value) {
                continue;
            }
            if key == ON_PASS_PARAM || key == ON_FAIL_PARAM {
                if let Err(e) = value.parse::<PolicyAction>() {
                    push(Severity::Error, e.to_string());
                }
            }
            if is_date_token(value) {
                if let Err(e) = DateToken::parse(value) {
                    push(Severity::Error, format!("parameter '{key}': {e}"));
                }
            }
        }
    }

    issues
}

fn has_placeholder(value: &str) -> bool {
    !extract_vars(value).is_empty()
}
