//! Keyword enums shared across the interpreter.
//!
//! Each keyword enum has:
//! - Serialize/Deserialize as its canonical string
//! - case-insensitive `parse()` (unknown input is `None`, never a panic)
//! - `as_str()`, `is_default()`, `Display`

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// Macro: a closed keyword enum with canonical strings and extra aliases.
// ---------------------------------------------------------------------------
macro_rules! define_keyword_enum {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident,
        variants: [
            $( ($variant:ident, $str:expr $(, $alias:expr)* ) ),+ $(,)?
        ]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[ $( Self::$variant, )+ ];

            /// Returns the canonical string representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $str, )+
                }
            }

            /// Returns `true` if this is the default variant.
            pub fn is_default(&self) -> bool {
                *self == Self::$default
            }

            /// Case-insensitive lookup by canonical name or alias.
            pub fn parse(s: &str) -> Option<Self> {
                let s = s.trim();
                $(
                    if s.eq_ignore_ascii_case($str) $( || s.eq_ignore_ascii_case($alias) )* {
                        return Some(Self::$variant);
                    }
                )+
                None
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::parse(&s).ok_or_else(|| {
                    serde::de::Error::custom(format!(
                        "unknown {} '{}'",
                        stringify!($name),
                        s
                    ))
                })
            }
        }
    };
}

// ===========================================================================
// Status
// ===========================================================================

define_keyword_enum! {
    /// Outcome of one executed instruction.
    Status, default = Pass,
    variants: [
        (Pass, "PASS"),
        (Fail, "FAIL"),
        (Skip, "SKIP"),
    ]
}

// ===========================================================================
// VerifyMode
// ===========================================================================

define_keyword_enum! {
    /// Comparison used by the [`Verifier`](crate::verifier).
    VerifyMode, default = Equals,
    variants: [
        (Equals, "equals", "eq", "="),
        (EqualsIgnoreCase, "equalsignorecase", "ieq"),
        (NotEquals, "notequals", "ne", "!="),
        (Contains, "contains"),
        (StartsWith, "startswith"),
        (EndsWith, "endswith"),
        (Empty, "empty"),
        (NotEmpty, "notempty"),
    ]
}

// ===========================================================================
// Activation
// ===========================================================================

/// Tri-state activation flag of an instruction.
///
/// A blank flag is `Unset` and behaves as active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Active,
    Inactive,
    #[default]
    Unset,
}

impl Activation {
    /// Interpret a raw flag value.
    ///
    /// Returns `None` for a non-blank value that is not a recognised
    /// yes/no keyword; callers treat that as active and note it.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Some(Self::Unset);
        }
        match s.to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" | "on" => Some(Self::Active),
            "false" | "no" | "n" | "0" | "off" => Some(Self::Inactive),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Inactive)
    }
}
