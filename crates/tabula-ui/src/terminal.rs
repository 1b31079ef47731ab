//! Terminal detection.

use std::env;

/// Returns `true` if stdout is connected to a terminal.
pub fn is_tty() -> bool {
    crossterm::tty::IsTty::is_tty(&std::io::stdout())
}

/// Determines if ANSI color codes should be used.
///
/// Respects standard conventions:
/// - `NO_COLOR` (any value): disables color (<https://no-color.org/>)
/// - `CLICOLOR=0`: disables color
/// - `TERM=dumb`: disables color
/// - `CLICOLOR_FORCE` (any value): forces color even in non-TTY
/// - Falls back to TTY detection
pub fn supports_color() -> bool {
    color_from_env(|key| env::var(key).ok()).unwrap_or_else(is_tty)
}

/// The color decision the environment forces, if any.
fn color_from_env(var: impl Fn(&str) -> Option<String>) -> Option<bool> {
    if var("NO_COLOR").is_some() {
        return Some(false);
    }
    if var("CLICOLOR").as_deref() == Some("0") {
        return Some(false);
    }
    if var("TERM").as_deref() == Some("dumb") {
        return Some(false);
    }
    if var("CLICOLOR_FORCE").is_some() {
        return Some(true);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn no_color_wins_over_force() {
        let env = [("NO_COLOR", ""), ("CLICOLOR_FORCE", "1")];
        assert_eq!(color_from_env(lookup(&env)), Some(false));
    }

    #[test]
    fn dumb_terminal_disables_color() {
        assert_eq!(color_from_env(lookup(&[("TERM", "dumb")])), Some(false));
        assert_eq!(color_from_env(lookup(&[("CLICOLOR", "0")])), Some(false));
    }

    #[test]
    fn force_and_fallback() {
        assert_eq!(color_from_env(lookup(&[("CLICOLOR_FORCE", "1")])), Some(true));
        assert_eq!(color_from_env(lookup(&[("TERM", "xterm")])), None);
    }
}
