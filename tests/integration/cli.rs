//! The `nxsds` binary end to end.

use nxsds_cli::test_utils::{BackendEnvironment, DataSourceFixture};
use predicates::prelude::*;
use serde_json::json;

use crate::common::{nxsds, nxsds_json};

#[test]
fn components_tree_is_default() {
    let env = BackendEnvironment::with_beamline().unwrap();
    let value = nxsds_json(&env, &["components", "mca"]);

    assert_eq!(
        value,
        json!({
            "mca": {
                "mca_data": [["INIT", "TANGO", "haso.desy.de:10000/p09/mca/exp.01/Data", "NX_FLOAT", [34]]]
            }
        })
    );
}

#[test]
fn components_flat_filtered_by_kind() {
    let env = BackendEnvironment::with_beamline().unwrap();
    let value = nxsds_json(&env, &["components", "pilatus", "--flat", "--kind", "CLIENT"]);

    let records = value.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["name"], "__unnamed__1");
    assert_eq!(records[0]["shape"], json!([195, "$datasources.roi_size"]));
    assert_eq!(records[1]["name"], "roi_size");
    assert_eq!(records[1]["strategy"], "CONFIG");
    assert!(records.iter().all(|r| r["component"] == "pilatus"));
}

#[test]
fn unknown_component_names_are_ignored() {
    let env = BackendEnvironment::with_beamline().unwrap();
    assert_eq!(nxsds_json(&env, &["components", "nothing-here"]), json!({}));
    assert_eq!(nxsds_json(&env, &["components", "nothing-here", "--flat"]), json!([]));
}

#[test]
fn variables_flag_substitutes_documents() {
    let env = BackendEnvironment::with_beamline().unwrap();
    nxsds(&env)
        .args(["components", "mca", "--variables", r#"{"serialno": 3}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("mca_data"));
}

#[test]
fn missing_variable_reports_suggestion() {
    let env = BackendEnvironment::with_beamline().unwrap();
    nxsds(&env)
        .args(["components", "mca", "--variables", "{}"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("serialno"))
        .stderr(predicate::str::contains("--variables"));
}

#[test]
fn invalid_variables_json_fails() {
    let env = BackendEnvironment::with_beamline().unwrap();
    nxsds(&env)
        .args(["components", "--variables", "[1, 2]"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid variables"));
}

#[test]
fn datasources_yaml() {
    let env = BackendEnvironment::with_beamline().unwrap();
    env.add_data_source(&DataSourceFixture::client("title", "exp_title")).unwrap();

    nxsds(&env)
        .args(["datasources", "--format", "yaml", "--kind", "CLIENT"])
        .assert()
        .success()
        .stdout(predicate::str::contains("title:"))
        .stdout(predicate::str::contains("exp_title"))
        .stdout(predicate::str::contains("gap").not());
}

#[test]
fn available_names() {
    let env = BackendEnvironment::with_beamline().unwrap();
    assert_eq!(nxsds_json(&env, &["available", "datasources"]), json!(["gap"]));
}

#[test]
fn nonexistent_backend_dir_fails() {
    let env = BackendEnvironment::new().unwrap();
    let mut cmd = nxsds(&env);
    cmd.args(["--backend-dir", "/definitely/not/here", "available", "components"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a directory"));
}
