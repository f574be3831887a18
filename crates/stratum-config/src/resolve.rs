//! Environment placeholder resolution
//!
//! Backing configuration records may embed `${NAME}` or `${NAME:default}` in
//! any string value. Resolution walks the raw record recursively and
//! substitutes from the process environment. A placeholder that resolves to
//! nothing and carries no default is kept literally and logged as a warning,
//! never treated as an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

/// Regex for `${NAME}` and `${NAME:default}` patterns.
static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::([^}]*))?\}").unwrap());

/// Sensitive key name fragments. Values under keys matching these are never
/// written to logs.
const SENSITIVE_KEY_PATTERNS: &[&str] = &[
    "PASSWORD", "SECRET", "TOKEN", "KEY", "CREDENTIAL", "AUTH", "PRIVATE",
];

/// Check whether a config key looks like it holds credential material.
pub fn is_sensitive_key(key: &str) -> bool {
    let upper = key.to_uppercase();
    SENSITIVE_KEY_PATTERNS
        .iter()
        .any(|pattern| upper.contains(pattern))
}

/// Substitute placeholders in a single string value.
///
/// `key` is only used for log hygiene: unresolved placeholders under a
/// sensitive-looking key log the variable name, never surrounding content.
pub fn resolve_str(input: &str, key: &str) -> String {
    PLACEHOLDER_REGEX
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let var_name = &caps[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    // Log names only; values under credential-like keys stay
                    // out of the logs entirely.
                    if is_sensitive_key(key) || is_sensitive_key(var_name) {
                        debug!(variable = var_name, "resolved secret placeholder");
                    } else {
                        debug!(variable = var_name, key = key, "resolved placeholder");
                    }
                    value
                }
                Err(_) => match caps.get(2) {
                    Some(default) => default.as_str().to_string(),
                    None => {
                        warn!(
                            variable = var_name,
                            key = key,
                            "unresolved environment placeholder, keeping literal"
                        );
                        caps[0].to_string()
                    }
                },
            }
        })
        .into_owned()
}

/// Recursively resolve placeholders in every string value of a raw record.
pub fn resolve_value(value: &mut Value) {
    resolve_value_inner(value, "");
}

fn resolve_value_inner(value: &mut Value, key: &str) {
    match value {
        Value::String(s) => {
            if s.contains("${") {
                *s = resolve_str(s, key);
            }
        }
        Value::Object(map) => {
            for (k, v) in map.iter_mut() {
                resolve_value_inner(v, k);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                resolve_value_inner(item, key);
            }
        }
        _ => {}
    }
}
