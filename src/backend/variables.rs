//! `$var.NAME` substitution for instantiated component documents.
//!
//! Tokens take two forms:
//!
//! - `$var.NAME` - replaced by the variable value
//! - `$var.NAME#'default'` - replaced by the value, or by `default` when unset
//!
//! String values are inserted verbatim; any other JSON value is inserted as
//! its JSON text. A token with neither a value nor a default fails the whole
//! document, so a caller never receives a half-instantiated component.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

use crate::core::BackendError;

static VARIABLE_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"\$var\.([A-Za-z0-9_]+(?:-[A-Za-z0-9_]+)*)(?:#'([^']*)')?"));

/// Substitute every `$var.` token of `document`.
///
/// # Errors
///
/// Returns [`BackendError::UnresolvedVariable`] naming the first token that
/// has no value and no default.
pub fn substitute(
    document: &str,
    component: &str,
    variables: &Map<String, Value>,
) -> Result<String, BackendError> {
    let pattern = VARIABLE_PATTERN.as_ref().map_err(|e| BackendError::Unavailable {
        operation: "substitute variables".to_string(),
        reason: e.to_string(),
    })?;

    let mut output = String::with_capacity(document.len());
    let mut last = 0;

    for caps in pattern.captures_iter(document) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        output.push_str(&document[last..whole.start()]);

        match (variables.get(name.as_str()), caps.get(2)) {
            (Some(Value::String(value)), _) => output.push_str(value),
            (Some(Value::Null) | None, Some(default)) => output.push_str(default.as_str()),
            (Some(Value::Null) | None, None) => {
                return Err(BackendError::UnresolvedVariable {
                    name: name.as_str().to_string(),
                    component: component.to_string(),
                });
            }
            (Some(value), _) => output.push_str(&value.to_string()),
        }

        last = whole.end();
    }

    output.push_str(&document[last..]);
    Ok(output)
}

/// Shallow-merge `updates` into `base`, overwriting existing keys.
pub fn merge(base: &mut Map<String, Value>, updates: &Map<String, Value>) {
    for (key, value) in updates {
        base.insert(key.clone(), value.clone());
    }
}
