//! Shape resolution from a `<dimensions>` subtree.
//!
//! ```xml
//! <dimensions rank="2">
//!   <dim index="1" value="34"/>
//!   <dim index="2"><datasource name="roi_size" type="CLIENT"/></dim>
//! </dimensions>
//! ```
//!
//! The shape has exactly `rank` slots. Each `dim` fills slot `index - 1`:
//!
//! 1. a `value` attribute becomes [`ShapeDim::Literal`] when it parses as an
//!    integer, [`ShapeDim::Text`] otherwise
//! 2. a nested `datasource` becomes [`ShapeDim::Reference`] to its name; the
//!    referenced datasource is never resolved here
//! 3. otherwise the trimmed text: integer, non-empty text, or nothing
//!
//! Slots never supplied stay [`ShapeDim::Unknown`]. Indices outside
//! `1..=rank` are dropped. A missing or unparsable `rank`, or one above
//! [`MAX_RANK`], yields an empty shape.

use roxmltree::Node;
use tracing::trace;

use super::node::{DATASOURCE_TAG, DIM_TAG, DIMENSIONS_TAG, attribute, child_elements, first_child, text_content};
use crate::constants::{MAX_RANK, UNNAMED_REFERENCE};
use crate::models::ShapeDim;

/// Shape of the node owning an optional direct `dimensions` child.
///
/// A node without `dimensions` is a scalar: the shape is empty.
pub fn node_shape(node: Node<'_, '_>) -> Vec<ShapeDim> {
    first_child(node, DIMENSIONS_TAG).map(resolve_shape).unwrap_or_default()
}

/// Shape described by a `dimensions` element.
pub fn resolve_shape(dimensions: Node<'_, '_>) -> Vec<ShapeDim> {
    let Some(rank) = attribute(dimensions, "rank").and_then(|rank| rank.parse::<usize>().ok()) else {
        trace!("dimensions without a usable rank: {:?}", dimensions.attribute("rank"));
        return Vec::new();
    };
    if rank > MAX_RANK {
        trace!("dimensions rank {} above limit {}", rank, MAX_RANK);
        return Vec::new();
    }

    let mut shape = vec![ShapeDim::Unknown; rank];

    for dim in child_elements(dimensions, DIM_TAG) {
        let Some(index) = attribute(dim, "index").and_then(|index| index.parse::<usize>().ok()) else {
            continue;
        };
        let Some(slot) = index.checked_sub(1).and_then(|position| shape.get_mut(position)) else {
            trace!("dim index {} outside rank {}", index, rank);
            continue;
        };
        *slot = dim_value(dim);
    }

    shape
}

fn dim_value(dim: Node<'_, '_>) -> ShapeDim {
    if let Some(value) = dim.attribute("value") {
        return match value.trim().parse::<i64>() {
            Ok(n) => ShapeDim::Literal(n),
            Err(_) => ShapeDim::Text(value.to_string()),
        };
    }

    if let Some(datasource) = dim.descendants().find(|n| n.is_element() && n.has_tag_name(DATASOURCE_TAG)) {
        let name = attribute(datasource, "name").unwrap_or(UNNAMED_REFERENCE);
        return ShapeDim::Reference(name.to_string());
    }

    let text = text_content(dim);
    let text = text.trim();
    match text.parse::<i64>() {
        Ok(n) => ShapeDim::Literal(n),
        Err(_) if !text.is_empty() => ShapeDim::Text(text.to_string()),
        Err(_) => ShapeDim::Unknown,
    }
}
