//! `{name}` placeholder substitution.

use std::collections::{BTreeSet, HashMap};

/// Substitute `{name}` placeholders in `text` with values from `vars`.
///
/// Lookup is case-insensitive (`vars` must hold lower-cased keys). An unset
/// name is replaced by the empty string, so substitution never fails.
/// Substituted values are not re-scanned. Braces that do not enclose a valid
/// name (e.g. `{ "a": 1 }`) are copied through untouched.
pub fn substitute_vars(text: &str, vars: &HashMap<String, String>) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        result.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match placeholder_len(after) {
            Some(len) => {
                let name = after[..len].to_ascii_lowercase();
                if let Some(val) = vars.get(&name) {
                    result.push_str(val);
                }
                rest = &after[len + 1..];
            }
            None => {
                result.push('{');
                rest = after;
            }
        }
    }
    result.push_str(rest);
    result
}

/// Collect the distinct placeholder names referenced by `text`, lower-cased
/// and sorted.
pub fn extract_vars(text: &str) -> Vec<String> {
    let mut names = BTreeSet::new();
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match placeholder_len(after) {
            Some(len) => {
                names.insert(after[..len].to_ascii_lowercase());
                rest = &after[len + 1..];
            }
            None => rest = after,
        }
    }
    names.into_iter().collect()
}

/// Length of a placeholder name at the start of `s` when it is followed by
/// a closing brace.
fn placeholder_len(s: &str) -> Option<usize> {
    let len = s.bytes().take_while(|b| is_name_byte(*b)).count();
    if len > 0 && s.as_bytes().get(len) == Some(&b'}') {
        Some(len)
    } else {
        None
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b'$')
}
