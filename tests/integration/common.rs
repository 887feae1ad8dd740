//! Shared helpers for integration tests

use assert_cmd::Command;
use nxsds_cli::test_utils::BackendEnvironment;

/// `nxsds` isolated from the user's configuration, pointed at `env`.
pub fn nxsds(env: &BackendEnvironment) -> Command {
    let mut cmd = Command::cargo_bin("nxsds").unwrap();
    cmd.env_remove("NXSDS_CONFIG")
        .env_remove("RUST_LOG")
        .env("HOME", env.path())
        .arg("--backend-dir")
        .arg(env.backend_root());
    cmd
}

/// Run `nxsds` and parse stdout as JSON.
pub fn nxsds_json(env: &BackendEnvironment, args: &[&str]) -> serde_json::Value {
    let output = nxsds(env).args(args).output().unwrap();
    assert!(output.status.success(), "nxsds {args:?} failed: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}
