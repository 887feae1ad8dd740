//! XML helpers and embedded datasource record derivation.

use roxmltree::Node;

use crate::constants::DEFAULT_TANGO_PORT;
use crate::models::{DataSourceKind, DataSourceRecord};

pub(crate) const DATASOURCE_TAG: &str = "datasource";
pub(crate) const STRATEGY_TAG: &str = "strategy";
pub(crate) const DIMENSIONS_TAG: &str = "dimensions";
pub(crate) const DIM_TAG: &str = "dim";
pub(crate) const RESULT_TAG: &str = "result";
const RECORD_TAG: &str = "record";
const DEVICE_TAG: &str = "device";
const QUERY_TAG: &str = "query";

/// Elements that can carry a write strategy.
pub(crate) const STRATEGY_CARRIERS: [&str; 3] = ["field", "attribute", "dim"];

/// Direct element children of `node` named `tag`.
pub(crate) fn child_elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |child| child.is_element() && child.has_tag_name(tag))
}

/// First direct element child of `node` named `tag`.
pub(crate) fn first_child<'a, 'input: 'a>(node: Node<'a, 'input>, tag: &'static str) -> Option<Node<'a, 'input>> {
    child_elements(node, tag).next()
}

/// Trimmed attribute value; blank counts as absent.
pub(crate) fn attribute<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute(name).map(str::trim).filter(|value| !value.is_empty())
}

/// Text of the direct text children of `node`, nested elements excluded.
pub(crate) fn direct_text(node: Node<'_, '_>) -> String {
    node.children().filter(|child| child.is_text()).filter_map(|child| child.text()).collect()
}

/// Text of every descendant text node of `node`.
pub(crate) fn text_content(node: Node<'_, '_>) -> String {
    node.descendants().filter(|child| child.is_text()).filter_map(|child| child.text()).collect()
}

/// The original document text spanned by `node`.
pub(crate) fn source_text<'input>(node: Node<'_, 'input>) -> &'input str {
    let input = node.document().input_text();
    input.get(node.range()).unwrap_or_default()
}

/// Text of the first `result` element at or below `node`.
pub(crate) fn result_text(node: Node<'_, '_>) -> Option<String> {
    node.descendants().find(|n| n.is_element() && n.has_tag_name(RESULT_TAG)).map(text_content)
}

/// Whether `node` is a strategy-carrying element with a direct `strategy` child.
pub(crate) fn carries_strategy(node: Node<'_, '_>) -> bool {
    node.is_element()
        && STRATEGY_CARRIERS.iter().any(|tag| node.has_tag_name(*tag))
        && first_child(node, STRATEGY_TAG).is_some()
}

/// Identity of an embedded `datasource` element.
///
/// The access record depends on the kind:
///
/// - `TANGO`: `host:port/device/record` when the device names a host (port
///   defaults to 10000), `device/record` without a host, the bare record
///   name without a device
/// - `DB`: the query text
/// - `PYEVAL`: none
/// - anything else: the `record` child's `name`
pub(crate) fn embedded_record(datasource: Node<'_, '_>) -> DataSourceRecord {
    let name = attribute(datasource, "name");
    let kind = attribute(datasource, "type");

    let record = match kind.map(DataSourceKind::parse) {
        Some(DataSourceKind::Tango) => tango_record(datasource),
        Some(DataSourceKind::Db) => first_child(datasource, QUERY_TAG)
            .map(text_content)
            .map(|query| query.trim().to_string())
            .filter(|query| !query.is_empty()),
        Some(DataSourceKind::PyEval) => None,
        _ => record_name(datasource).map(str::to_string),
    };

    DataSourceRecord::new(name, kind, record)
}

fn record_name<'a>(datasource: Node<'a, '_>) -> Option<&'a str> {
    first_child(datasource, RECORD_TAG).and_then(|record| attribute(record, "name"))
}

fn tango_record(datasource: Node<'_, '_>) -> Option<String> {
    let record = record_name(datasource)?;

    let Some(device) = first_child(datasource, DEVICE_TAG) else {
        return Some(record.to_string());
    };
    let Some(device_name) = attribute(device, "name") else {
        return Some(record.to_string());
    };

    match attribute(device, "hostname") {
        Some(host) => {
            let port = attribute(device, "port").unwrap_or(DEFAULT_TANGO_PORT);
            Some(format!("{host}:{port}/{device_name}/{record}"))
        }
        None => Some(format!("{device_name}/{record}")),
    }
}
