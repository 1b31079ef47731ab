//! Post-test policy: what happens after an instruction has run.
//!
//! Data rows state a policy with the reserved `OnPass` / `OnFail`
//! parameters; handlers can add to it by returning a [`Directive`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::enums::Status;
use crate::params::Parameters;

/// Parameter consulted when the instruction passed.
pub const ON_PASS_PARAM: &str = "onpass";
/// Parameter consulted when the instruction failed.
pub const ON_FAIL_PARAM: &str = "onfail";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid post-test policy '{0}' (expected continue, quitcase, quitsession or skip:N)")]
pub struct PolicyError(pub String);

/// One policy decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyAction {
    #[default]
    Continue,
    QuitCase,
    QuitSession,
    Skip(u32),
}

impl FromStr for PolicyAction {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let action = match lower.as_str() {
            "" | "continue" => Self::Continue,
            "quitcase" | "quit_case" => Self::QuitCase,
            "quitsession" | "quit_session" => Self::QuitSession,
            other => {
                let n = other
                    .strip_prefix("skip:")
                    .and_then(|n| n.trim().parse().ok())
                    .ok_or_else(|| PolicyError(s.trim().to_string()))?;
                Self::Skip(n)
            }
        };
        Ok(action)
    }
}

impl fmt::Display for PolicyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => f.write_str("continue"),
            Self::QuitCase => f.write_str("quitcase"),
            Self::QuitSession => f.write_str("quitsession"),
            Self::Skip(n) => write!(f, "skip:{n}"),
        }
    }
}

/// The policy declared on one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PostTestPolicy {
    pub on_pass: PolicyAction,
    pub on_fail: PolicyAction,
}

impl PostTestPolicy {
    /// Read `OnPass` / `OnFail` from parsed parameters.
    pub fn from_params(params: &Parameters) -> Result<Self, PolicyError> {
        Ok(Self {
            on_pass: params.get_or(ON_PASS_PARAM, "").parse()?,
            on_fail: params.get_or(ON_FAIL_PARAM, "").parse()?,
        })
    }

    /// The action that applies to a record with `status`.
    ///
    /// A skipped record has no post-test policy.
    pub fn for_status(&self, status: Status) -> PolicyAction {
        match status {
            Status::Pass => self.on_pass,
            Status::Fail => self.on_fail,
            Status::Skip => PolicyAction::Continue,
        }
    }
}

/// Flow-control request produced after an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Directive {
    /// Stop the current program.
    #[serde(default)]
    pub quit_case: bool,
    /// Stop the current program and every enclosing one.
    #[serde(default)]
    pub quit_session: bool,
    /// Force the next N instructions to be skipped.
    #[serde(default)]
    pub skip_steps: u32,
}

impl Directive {
    pub fn quit_case() -> Self {
        Self {
            quit_case: true,
            ..Self::default()
        }
    }

    pub fn quit_session() -> Self {
        Self {
            quit_session: true,
            ..Self::default()
        }
    }

    pub fn skip(steps: u32) -> Self {
        Self {
            skip_steps: steps,
            ..Self::default()
        }
    }

    /// Combine two directives: flags are OR-ed, skip counts take the max.
    pub fn merge(self, other: Directive) -> Directive {
        Directive {
            quit_case: self.quit_case || other.quit_case,
            quit_session: self.quit_session || other.quit_session,
            skip_steps: self.skip_steps.max(other.skip_steps),
        }
    }

    /// Whether the current program must stop.
    pub fn stops_program(&self) -> bool {
        self.quit_case || self.quit_session
    }

    /// Short label used in termination blurbs.
    pub fn label(&self) -> &'static str {
        if self.quit_session {
            "quitsession"
        } else if self.quit_case {
            "quitcase"
        } else {
            "continue"
        }
    }
}

impl From<PolicyAction> for Directive {
    fn from(action: PolicyAction) -> Self {
        match action {
            PolicyAction::Continue => Self::default(),
            PolicyAction::QuitCase => Self::quit_case(),
            PolicyAction::QuitSession => Self::quit_session(),
            PolicyAction::Skip(n) => Self::skip(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamSyntax;

    #[test]
    fn parse_actions() {
        assert_eq!("".parse::<PolicyAction>().unwrap(), PolicyAction::Continue);
        assert_eq!("QuitCase".parse::<PolicyAction>().unwrap(), PolicyAction::QuitCase);
        assert_eq!(
            "quit_session".parse::<PolicyAction>().unwrap(),
            PolicyAction::QuitSession
        );
        assert_eq!("skip:3".parse::<PolicyAction>().unwrap(), PolicyAction::Skip(3));
        assert!("skip:x".parse::<PolicyAction>().is_err());
        assert!("explode".parse::<PolicyAction>().is_err());
    }

    #[test]
    fn policy_from_params_selects_by_status() {
        let params = Parameters::parse("OnFail=quitsession;OnPass=skip:2", &ParamSyntax::default())
            .unwrap();
        let policy = PostTestPolicy::from_params(&params).unwrap();
        assert_eq!(policy.for_status(Status::Pass), PolicyAction::Skip(2));
        assert_eq!(policy.for_status(Status::Fail), PolicyAction::QuitSession);
        assert_eq!(policy.for_status(Status::Skip), PolicyAction::Continue);
    }

    #[test]
    fn merge_is_or_and_max() {
        let merged = Directive::skip(2).merge(Directive::quit_case()).merge(Directive::skip(1));
        assert_eq!(
            merged,
            Directive {
                quit_case: true,
                quit_session: false,
                skip_steps: 2
            }
        );
        assert!(merged.stops_program());
        assert_eq!(merged.label(), "quitcase");
    }

    #[test]
    fn display_round_trips() {
        for action in [
            PolicyAction::Continue,
            PolicyAction::QuitCase,
            PolicyAction::QuitSession,
            PolicyAction::Skip(4),
        ] {
            assert_eq!(action.to_string().parse::<PolicyAction>().unwrap(), action);
        }
    }
}
