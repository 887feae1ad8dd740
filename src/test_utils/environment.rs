//! Temporary backend directories for tests

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::fixtures::{ComponentFixture, DataSourceFixture};
use crate::backend::DirectoryBackend;

/// A backend directory inside a temporary directory.
///
/// The layout is `<temp>/backend/{components,datasources}`; the temporary
/// root also has room for config files. Everything is removed on drop.
pub struct BackendEnvironment {
    temp_dir: TempDir,
    backend_root: PathBuf,
}

impl BackendEnvironment {
    /// Create an empty backend directory
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new().context("Failed to create temp directory")?;
        let backend_root = temp_dir.path().join("backend");
        fs::create_dir_all(backend_root.join("components"))?;
        fs::create_dir_all(backend_root.join("datasources"))?;
        Ok(Self {
            temp_dir,
            backend_root,
        })
    }

    /// Slit, mca and pilatus components plus the `gap` datasource
    pub fn with_beamline() -> Result<Self> {
        let env = Self::new()?;
        env.add_component(&ComponentFixture::beamline())?;
        env.add_component(&ComponentFixture::slit())?;
        env.add_component(&ComponentFixture::mca())?;
        env.add_component(&ComponentFixture::pilatus())?;
        env.add_data_source(&DataSourceFixture::tango("gap", "haso.desy.de", "p09/slit/exp.01", "Gap"))?;
        Ok(env)
    }

    pub fn add_component(&self, fixture: &ComponentFixture) -> Result<PathBuf> {
        fixture.write_to(&self.backend_root)
    }

    pub fn add_data_source(&self, fixture: &DataSourceFixture) -> Result<PathBuf> {
        fixture.write_to(&self.backend_root)
    }

    /// Write `variables.json`
    pub fn set_variables(&self, variables: &Value) -> Result<PathBuf> {
        let path = self.backend_root.join("variables.json");
        fs::write(&path, serde_json::to_string_pretty(variables)?)?;
        Ok(path)
    }

    /// Write a config file next to the backend directory
    pub fn write_config(&self, content: &str) -> Result<PathBuf> {
        let path = self.temp_dir.path().join("nxsds.toml");
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Open the directory backend
    pub fn backend(&self) -> Result<DirectoryBackend> {
        Ok(DirectoryBackend::open(&self.backend_root)?)
    }

    pub fn backend_root(&self) -> &Path {
        &self.backend_root
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }
}
