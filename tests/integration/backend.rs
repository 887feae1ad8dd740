//! Resolution against the directory backend.

use nxsds_cli::backend::ConfigBackend;
use nxsds_cli::core::{BackendError, ResolverError};
use nxsds_cli::output::{OutputMode, RecordFilter};
use nxsds_cli::resolver::{ComponentResolver, ResolverOptions};
use nxsds_cli::test_utils::{BackendEnvironment, ComponentFixture, DataSourceFixture, init_test_logging};
use serde_json::json;

#[test]
fn dependency_closure_resolves_every_component() {
    init_test_logging(None);
    let env = BackendEnvironment::with_beamline().unwrap();
    let backend = env.backend().unwrap();
    let resolver = ComponentResolver::new(&backend, ResolverOptions::default()).unwrap();

    let names = vec!["beamline".to_string()];
    let resolved = resolver.resolve_components(Some(names.as_slice()), None).unwrap();
    let order: Vec<&str> = resolved.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(order, vec!["beamline", "slit", "mca"]);

    let description = resolver
        .components(Some(names.as_slice()), &RecordFilter::default(), None, OutputMode::Tree)
        .unwrap();
    let value = serde_json::to_value(&description).unwrap();
    assert_eq!(value["beamline"], json!({}));
    assert_eq!(value["mca"]["mca_data"][0][0], "INIT");
    assert_eq!(value["slit"]["gap"].as_array().unwrap().len(), 2);
}

#[test]
fn missing_dependency_fails_the_call() {
    let env = BackendEnvironment::new().unwrap();
    env.add_component(&ComponentFixture::new("top", "<definition>$components.ghost</definition>")).unwrap();
    let backend = env.backend().unwrap();
    let resolver = ComponentResolver::new(&backend, ResolverOptions::default()).unwrap();

    let err = resolver.resolve_components(None, None).unwrap_err();
    assert!(matches!(err, ResolverError::Backend(BackendError::NotFound { .. })));
}

#[test]
fn variables_from_file_and_call_are_merged() {
    let env = BackendEnvironment::with_beamline().unwrap();
    env.set_variables(&json!({"entryname": "run"})).unwrap();
    let backend = env.backend().unwrap();
    let resolver = ComponentResolver::new(&backend, ResolverOptions::default()).unwrap();

    let names = vec!["mca".to_string()];
    let resolved = resolver
        .resolve_components(Some(names.as_slice()), Some(&json!({"serialno": 7})))
        .unwrap();
    assert!(resolved[0].registry.contains("mca_data"));

    let variables = backend.variables().unwrap();
    assert_eq!(variables.get("entryname"), Some(&json!("run")));
    assert_eq!(variables.get("serialno"), Some(&json!(7)));
}

#[test]
fn missing_variable_is_an_error() {
    let env = BackendEnvironment::with_beamline().unwrap();
    let backend = env.backend().unwrap();
    let resolver = ComponentResolver::new(&backend, ResolverOptions::default()).unwrap();

    let names = vec!["mca".to_string()];
    let err = resolver.resolve_components(Some(names.as_slice()), Some(&json!({}))).unwrap_err();
    match err {
        ResolverError::Backend(BackendError::UnresolvedVariable { name, component }) => {
            assert_eq!(name, "serialno");
            assert_eq!(component, "mca");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn malformed_component_fails_the_call() {
    let env = BackendEnvironment::new().unwrap();
    env.add_component(&ComponentFixture::invalid()).unwrap();
    let backend = env.backend().unwrap();
    let resolver = ComponentResolver::new(&backend, ResolverOptions::default()).unwrap();

    assert!(matches!(resolver.resolve_components(None, None), Err(ResolverError::InvalidXml { .. })));
}

#[test]
fn datasources_with_script_expansion() {
    let env = BackendEnvironment::new().unwrap();
    env.add_data_source(&DataSourceFixture::pyeval("ratio", &["i0", "i1", "i2"], "ds.result = ds.i1 / ds.i0"))
        .unwrap();
    env.add_data_source(&DataSourceFixture::client("i0", "counter_0")).unwrap();
    env.add_data_source(&DataSourceFixture::client("i1", "counter_1")).unwrap();
    env.add_data_source(&DataSourceFixture::client("i2", "counter_2")).unwrap();
    let backend = env.backend().unwrap();

    let names = vec!["ratio".to_string()];
    let plain = ComponentResolver::new(&backend, ResolverOptions::default()).unwrap();
    let description = plain.data_sources(Some(names.as_slice()), &RecordFilter::default(), OutputMode::Tree).unwrap();
    assert_eq!(serde_json::to_value(&description).unwrap(), json!({"ratio": [["PYEVAL", null]]}));

    let expanded = ComponentResolver::new(&backend, ResolverOptions { expand_scripts: true }).unwrap();
    let description = expanded
        .data_sources(Some(names.as_slice()), &RecordFilter::by_kind(Some("CLIENT")), OutputMode::Tree)
        .unwrap();
    assert_eq!(
        serde_json::to_value(&description).unwrap(),
        json!({"i0": [["CLIENT", "counter_0"]], "i1": [["CLIENT", "counter_1"]]})
    );
}
