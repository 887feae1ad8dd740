//! Template reference extraction.
//!
//! Component and datasource documents refer to other definitions through
//! template tokens embedded in free text:
//!
//! - `$datasources.NAME` - a datasource definition
//! - `$components.NAME` - a component dependency
//!
//! A name is one or more word characters, optionally joined by single
//! hyphens, so `$datasources.exp_c01` and `$datasources.mot-01` both match
//! while the `-` in `$datasources.a-$datasources.b` ends the first name.
//!
//! # Usage
//!
//! ```rust
//! use nxsds_cli::resolver::references::{datasource_references, used_references};
//!
//! let doc = r#"<datasource type="PYEVAL" name="sum">
//!   $datasources.a $datasources.b
//!   <result>ds.result = ds.a + 1</result>
//! </datasource>"#;
//!
//! assert_eq!(datasource_references(doc), vec!["a", "b"]);
//! assert_eq!(used_references(doc, "ds.result = ds.a + 1"), vec!["a"]);
//! ```

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::error;

use crate::constants::{COMPONENTS_PREFIX, DATASOURCES_PREFIX};

const NAME_PATTERN: &str = r"([A-Za-z0-9_]+(?:-[A-Za-z0-9_]+)*)";

static DATASOURCE_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| token_pattern(DATASOURCES_PREFIX));

static COMPONENT_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| token_pattern(COMPONENTS_PREFIX));

fn token_pattern(prefix: &str) -> Option<Regex> {
    match Regex::new(&format!("{}{NAME_PATTERN}", regex::escape(prefix))) {
        Ok(pattern) => Some(pattern),
        Err(e) => {
            error!("Invalid reference pattern for '{}': {}", prefix, e);
            None
        }
    }
}

/// All names referenced by `pattern` in `text`, deduplicated in first-seen order.
fn extract(pattern: Option<&Regex>, text: &str) -> Vec<String> {
    let Some(pattern) = pattern else {
        return Vec::new();
    };

    let mut references: Vec<String> = pattern
        .captures_iter(text)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect();

    // Deduplicate while preserving order
    let mut seen = HashSet::new();
    references.retain(|r| seen.insert(r.clone()));

    references
}

/// Names of every `$datasources.NAME` token in `text`.
#[must_use]
pub fn datasource_references(text: &str) -> Vec<String> {
    extract(DATASOURCE_PATTERN.as_ref(), text)
}

/// Name of the first `$datasources.NAME` token in `text`.
///
/// Later tokens are ignored; a node claims at most one referenced datasource.
#[must_use]
pub fn first_datasource_reference(text: &str) -> Option<String> {
    DATASOURCE_PATTERN
        .as_ref()?
        .captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}

/// Names of every `$components.NAME` token in `text`.
#[must_use]
pub fn component_references(text: &str) -> Vec<String> {
    extract(COMPONENT_PATTERN.as_ref(), text)
}

/// Datasource references of `document` whose name occurs in `result_text`.
///
/// This is a plain substring test, not an analysis of the script: a result
/// that mentions `ds.ab` keeps both `a` and `ab` when both are declared.
#[must_use]
pub fn used_references(document: &str, result_text: &str) -> Vec<String> {
    datasource_references(document).into_iter().filter(|name| result_text.contains(name.as_str())).collect()
}
