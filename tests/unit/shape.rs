//! Shape resolution through the public API.

use nxsds_cli::models::ShapeDim;
use nxsds_cli::resolver::shape::resolve_shape;
use roxmltree::Document;

fn shape(xml: &str) -> Vec<ShapeDim> {
    let doc = Document::parse(xml).unwrap();
    resolve_shape(doc.root_element())
}

#[test]
fn only_second_index_supplied() {
    assert_eq!(
        shape(r#"<dimensions rank="2"><dim index="2" value="123"/></dimensions>"#),
        vec![ShapeDim::Unknown, ShapeDim::Literal(123)]
    );
}

#[test]
fn no_dims_at_all() {
    assert_eq!(shape(r#"<dimensions rank="2"/>"#), vec![ShapeDim::Unknown, ShapeDim::Unknown]);
}

#[test]
fn malformed_dimensions_never_fail() {
    assert!(shape(r#"<dimensions rank="-1"/>"#).is_empty());
    assert_eq!(
        shape(r#"<dimensions rank="1"><dim value="5"/><dim index="1.5" value="6"/></dimensions>"#),
        vec![ShapeDim::Unknown]
    );
}

#[test]
fn shape_serialization() {
    let dims = shape(
        r#"<dimensions rank="4">
             <dim index="1" value="10"/>
             <dim index="2" value="$var.n"/>
             <dim index="3"><datasource name="roi"/></dim>
           </dimensions>"#,
    );
    assert_eq!(
        serde_json::to_value(&dims).unwrap(),
        serde_json::json!([10, "$var.n", "$datasources.roi", null])
    );
}
