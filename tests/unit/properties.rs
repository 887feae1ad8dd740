//! Resolution properties over whole components.

use nxsds_cli::backend::MemoryBackend;
use nxsds_cli::models::{ShapeDim, StrategyMode};
use nxsds_cli::output::{FlatRecord, OutputMode, RecordFilter};
use nxsds_cli::resolver::{ComponentResolver, ResolverOptions};
use nxsds_cli::test_utils::{ComponentFixture, DataSourceFixture, init_test_logging, memory_backend};

fn flat(backend: &MemoryBackend, filter: &RecordFilter) -> Vec<FlatRecord> {
    let resolver = ComponentResolver::new(backend, ResolverOptions::default()).unwrap();
    let description = resolver.components(None, filter, None, OutputMode::Flat).unwrap();
    description.as_flat().unwrap().to_vec()
}

fn beamline() -> MemoryBackend {
    memory_backend(
        &[ComponentFixture::slit(), ComponentFixture::mca(), ComponentFixture::pilatus()],
        &[DataSourceFixture::tango("gap", "haso.desy.de", "p09/slit/exp.01", "Gap")],
    )
}

#[test]
fn isolated_datasource_document_yields_its_own_identity() {
    init_test_logging(None);

    for (name, fixture) in [
        ("title", DataSourceFixture::client("title", "exp_title")),
        ("gap", DataSourceFixture::tango("gap", "h", "d/e/f", "Gap")),
        ("sum", DataSourceFixture::pyeval("sum", &["a"], "ds.result = ds.a")),
    ] {
        let backend = memory_backend(&[], std::slice::from_ref(&fixture));
        let resolver = ComponentResolver::new(&backend, ResolverOptions::default()).unwrap();
        let records = resolver.describe_data_source(name);

        assert_eq!(records.len(), 1, "{name}");
        assert_eq!(records[0].name(), Some(name));
        assert!(records[0].kind().is_some());
    }
}

#[test]
fn dimension_reference_is_never_resolved() {
    let backend = memory_backend(
        &[ComponentFixture::new(
            "c",
            r#"<definition><field name="img" type="NX_UINT32"><strategy mode="STEP"/>
                 <dimensions rank="1"><dim index="1"><datasource name="ann" type="CLIENT"/></dim></dimensions>
                 <datasource type="CLIENT" name="img"><record name="image"/></datasource>
               </field></definition>"#,
        )],
        &[DataSourceFixture::client("ann", "annotation_size")],
    );

    let records = flat(&backend, &RecordFilter::default());
    let image = records.iter().find(|r| r.name == "img").unwrap();
    assert_eq!(image.shape, Some(vec![ShapeDim::Reference("ann".to_string())]));

    let json = serde_json::to_value(image).unwrap();
    assert_eq!(json["shape"], serde_json::json!(["$datasources.ann"]));
}

#[test]
fn same_datasource_with_two_strategies_stays_two_records() {
    let records = flat(&beamline(), &RecordFilter::default());
    let gaps: Vec<&FlatRecord> = records.iter().filter(|r| r.name == "gap").collect();

    assert_eq!(gaps.len(), 2);
    assert_eq!(gaps[0].strategy.as_deref(), Some("STEP"));
    assert_eq!(gaps[1].strategy.as_deref(), Some("FINAL"));
}

#[test]
fn anonymous_names_are_reproducible() {
    let backend = memory_backend(
        &[ComponentFixture::new(
            "anon",
            r#"<definition>
                 <field name="a"><strategy mode="STEP"/><datasource type="CLIENT"><record name="ra"/></datasource></field>
                 <field name="b"><strategy mode="STEP"/><datasource type="DB"><query>SELECT 2</query></datasource></field>
               </definition>"#,
        )],
        &[],
    );

    let first = flat(&backend, &RecordFilter::default());
    let second = flat(&backend, &RecordFilter::default());

    let names: Vec<&str> = first.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["__unnamed__1", "__unnamed__2"]);
    assert_eq!(first, second);
}

#[test]
fn strategy_filters_partition_the_unfiltered_result() {
    let backend = beamline();
    let all = flat(&backend, &RecordFilter::default());

    let mut union = Vec::new();
    for mode in StrategyMode::ALL {
        let filtered = flat(&backend, &RecordFilter::new(Some(mode.as_str()), None));
        assert!(filtered.iter().all(|r| r.strategy.as_deref() == Some(mode.as_str())));
        union.extend(filtered);
    }

    assert_eq!(union.len(), all.len());
    for record in &all {
        assert_eq!(
            union.iter().filter(|r| *r == record).count(),
            all.iter().filter(|r| *r == record).count()
        );
    }
}

#[test]
fn lowercase_mode_and_type_are_filtered_like_wire_casing() {
    let backend = memory_backend(
        &[ComponentFixture::new(
            "lower",
            r#"<definition><field name="g" type="NX_FLOAT"><strategy mode="step"/>
                 <datasource type="tango" name="g"><device hostname="h" name="d/e/f"/><record name="a"/></datasource>
               </field></definition>"#,
        )],
        &[],
    );

    let all = flat(&backend, &RecordFilter::default());
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].record.as_deref(), Some("h:10000/d/e/f/a"));

    assert_eq!(flat(&backend, &RecordFilter::by_kind(Some("TANGO"))), all);
    assert_eq!(flat(&backend, &RecordFilter::new(Some(StrategyMode::Step.as_str()), None)), all);

    let union: usize = StrategyMode::ALL
        .iter()
        .map(|mode| flat(&backend, &RecordFilter::new(Some(mode.as_str()), None)).len())
        .sum();
    assert_eq!(union, all.len());
}

#[test]
fn expansion_keeps_only_used_references() {
    let backend = memory_backend(
        &[],
        &[
            DataSourceFixture::pyeval("sum", &["a", "b"], "ds.result = ds.a * 2"),
            DataSourceFixture::client("a", "ra"),
            DataSourceFixture::client("b", "rb"),
        ],
    );
    let resolver = ComponentResolver::new(&backend, ResolverOptions { expand_scripts: true }).unwrap();

    let names = vec!["sum".to_string()];
    let registry = resolver.resolve_data_sources(Some(names.as_slice())).unwrap();
    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["sum", "a"]);
}

#[test]
fn init_once_tango_field_end_to_end() {
    let backend = memory_backend(&[ComponentFixture::mca()], &[]);
    let records = flat(&backend, &RecordFilter::default());

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.name, "mca_data");
    assert_eq!(record.kind.as_deref(), Some("TANGO"));
    assert_eq!(record.record.as_deref(), Some("haso.desy.de:10000/p09/mca/exp.01/Data"));
    assert_eq!(record.strategy.as_deref(), Some("INIT"));
    assert_eq!(record.shape, Some(vec![ShapeDim::Literal(34)]));
    assert_eq!(record.component.as_deref(), Some("mca"));
}
