//! Configuration file discovery and precedence.

use assert_cmd::Command;
use nxsds_cli::test_utils::{BackendEnvironment, DataSourceFixture};
use predicates::prelude::*;
use serial_test::serial;

fn bare_nxsds(env: &BackendEnvironment) -> Command {
    let mut cmd = Command::cargo_bin("nxsds").unwrap();
    cmd.env_remove("NXSDS_CONFIG").env_remove("RUST_LOG").env("HOME", env.path());
    cmd
}

fn config_for(env: &BackendEnvironment, extra: &str) -> String {
    format!("[backend]\ndirectory = \"{}\"\n{extra}", env.backend_root().display())
}

#[test]
#[serial]
fn backend_directory_from_config_file() {
    let env = BackendEnvironment::with_beamline().unwrap();
    let config = env.write_config(&config_for(&env, "")).unwrap();

    bare_nxsds(&env)
        .arg("--config")
        .arg(&config)
        .args(["available", "components"])
        .assert()
        .success()
        .stdout(predicate::str::contains("slit"));
}

#[test]
#[serial]
fn config_from_environment_variable() {
    let env = BackendEnvironment::with_beamline().unwrap();
    let config = env.write_config(&config_for(&env, "[output]\nformat = \"yaml\"\n")).unwrap();

    bare_nxsds(&env)
        .env("NXSDS_CONFIG", &config)
        .args(["available", "datasources"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("- gap"));
}

#[test]
#[serial]
fn default_config_in_home_directory() {
    let env = BackendEnvironment::with_beamline().unwrap();
    let dir = env.path().join(".nxsds");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), config_for(&env, "[output]\nmode = \"flat\"\n")).unwrap();

    let output = bare_nxsds(&env).args(["components", "slit"]).output().unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(value.is_array());
}

#[test]
#[serial]
fn flags_override_config_file() {
    let env = BackendEnvironment::with_beamline().unwrap();
    env.add_data_source(&DataSourceFixture::pyeval("sum", &["gap"], "ds.result = ds.gap + 1")).unwrap();
    let config = env
        .write_config(&config_for(&env, "[resolver]\nexpand_scripts = true\n[output]\nformat = \"yaml\"\n"))
        .unwrap();

    bare_nxsds(&env)
        .arg("--config")
        .arg(&config)
        .args(["datasources", "sum", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("{"))
        .stdout(predicate::str::contains("haso.desy.de:10000/p09/slit/exp.01/Gap"));
}

#[test]
#[serial]
fn missing_explicit_config_fails() {
    let env = BackendEnvironment::new().unwrap();
    bare_nxsds(&env)
        .args(["--config", "/no/such/nxsds.toml", "available", "components"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
#[serial]
fn malformed_config_fails() {
    let env = BackendEnvironment::new().unwrap();
    let config = env.write_config("[backend\n").unwrap();
    bare_nxsds(&env)
        .arg("--config")
        .arg(&config)
        .args(["available", "components"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse configuration file"));
}
