//! Computing the URL a state change should navigate to.

use std::collections::HashSet;

use serde::Serialize;

use crate::codec::{encode_fragment, parse_fragment, stringify, RawPair, EMPTY_SENTINEL};
use crate::schema::{FragmentSchema, Overrides};

/// How a navigation is written to the session history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationMode {
    /// Add a history entry.
    Push,
    /// Overwrite the current history entry.
    Replace,
}

/// A URL to move to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Navigation {
    pub url: String,
    pub mode: NavigationMode,
}

impl Navigation {
    /// The fragment part of the target URL, including `#`, or empty.
    pub fn hash(&self) -> &str {
        split_url(&self.url).1
    }
}

/// Split a URL at its first `#`. The fragment keeps its `#`.
pub fn split_url(url: &str) -> (&str, &str) {
    match url.find('#') {
        Some(idx) => url.split_at(idx),
        None => (url, ""),
    }
}

/// Work out where `current_url` should go so its fragment reflects `overrides`.
///
/// Keys the schema does not declare are left exactly where they are. Declared
/// keys are rewritten in place, dropped when they have no override (or the
/// override equals the default and `keep_defaults` is off), and appended in
/// declaration order otherwise. Returns `None` when the fragment would not
/// change. Clearing the fragment entirely replaces the history entry; any
/// other change pushes one.
pub fn compute_next_url(
    current_url: &str,
    schema: &FragmentSchema,
    overrides: &Overrides,
    keep_defaults: bool,
) -> Option<Navigation> {
    let (base, current_hash) = split_url(current_url);

    let wanted = |key: &str| -> Option<String> {
        let field = schema.get(key)?;
        let value = overrides.get(key)?;
        if !keep_defaults && *value == field.default {
            return None;
        }
        Some(stringify(value))
    };

    let mut written = HashSet::new();
    let mut pairs = Vec::new();
    for pair in parse_fragment(current_hash) {
        if !schema.contains(&pair.key) {
            pairs.push(pair);
            continue;
        }
        if written.contains(&pair.key) {
            continue;
        }
        if let Some(value) = wanted(&pair.key) {
            written.insert(pair.key.clone());
            pairs.push(RawPair::new(pair.key, value));
        }
    }
    for field in schema.iter() {
        if written.contains(&field.key) {
            continue;
        }
        if let Some(value) = wanted(&field.key) {
            pairs.push(RawPair::new(field.key.clone(), value));
        }
    }

    let next_hash = encode_fragment(&pairs);
    if next_hash == normalize(current_hash) {
        return None;
    }

    if next_hash.is_empty() {
        Some(Navigation {
            url: base.to_string(),
            mode: NavigationMode::Replace,
        })
    } else {
        Some(Navigation {
            url: format!("{}{}", base, next_hash),
            mode: NavigationMode::Push,
        })
    }
}

fn normalize(hash: &str) -> &str {
    match hash.strip_prefix('#') {
        None | Some("") => "",
        Some(EMPTY_SENTINEL) => "",
        Some(_) => hash,
    }
}
