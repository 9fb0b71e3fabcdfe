//! Header maps keyed case-insensitively, keeping the spelling of the last insert.

use std::collections::HashMap;

/// Set `name`, replacing any header whose name differs only in case.
pub(crate) fn set_header(headers: &mut HashMap<String, String>, name: String, value: String) {
    headers.retain(|k, _| !k.eq_ignore_ascii_case(&name));
    headers.insert(name, value);
}

/// Remove every spelling of `name`. Returns true if anything was removed.
pub(crate) fn remove_header(headers: &mut HashMap<String, String>, name: &str) -> bool {
    let before = headers.len();
    headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
    headers.len() != before
}

pub(crate) fn has_header(headers: &HashMap<String, String>, name: &str) -> bool {
    headers.keys().any(|k| k.eq_ignore_ascii_case(name))
}
