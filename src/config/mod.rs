//! Configuration file handling for nxsds
//!
//! All settings are optional; command-line flags override whatever the file
//! provides.
//!
//! # Location Priority
//!
//! 1. `--config <path>` on the command line
//! 2. `NXSDS_CONFIG` environment variable
//! 3. `~/.nxsds/config.toml` (`%LOCALAPPDATA%\nxsds\config.toml` on Windows)
//!
//! An explicitly named file must exist. A missing default file yields the
//! default configuration.
//!
//! # Format
//!
//! ```toml
//! [backend]
//! # Root holding components/*.xml, datasources/*.xml and variables.json.
//! # `~` and environment variables are expanded.
//! directory = "$HOME/nxs/config"
//!
//! [resolver]
//! expand_scripts = false
//!
//! [output]
//! mode = "tree"    # or "flat"
//! format = "json"  # or "yaml"
//! ```

mod parser;

pub use parser::parse_config;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::CONFIG_ENV_VAR;
use crate::core::ResolverError;
use crate::output::{OutputFormat, OutputMode};
use crate::resolver::ResolverOptions;

/// Top-level configuration file contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub backend: BackendConfig,
    pub resolver: ResolverOptions,
    pub output: OutputConfig,
}

/// Where configuration documents are read from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    /// Backend root directory, before `~`/`$VAR` expansion.
    pub directory: Option<String>,
}

/// Default rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub mode: OutputMode,
    pub format: OutputFormat,
}

impl Config {
    /// Load configuration following the location priority.
    ///
    /// # Errors
    ///
    /// Fails when an explicit path (argument or `NXSDS_CONFIG`) does not
    /// exist, or when the selected file cannot be parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ResolverError> {
        if let Some(path) = explicit {
            debug!("Loading config from {}", path.display());
            return parse_config(path);
        }

        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|value| !value.is_empty()) {
            let path = PathBuf::from(path);
            debug!("Loading config from {} ({})", path.display(), CONFIG_ENV_VAR);
            return parse_config(&path);
        }

        match Self::default_path() {
            Some(path) if path.is_file() => {
                debug!("Loading config from {}", path.display());
                parse_config(&path)
            }
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Platform default config location, if a home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()?.join("nxsds")
        } else {
            dirs::home_dir()?.join(".nxsds")
        };
        Some(config_dir.join("config.toml"))
    }
}

impl BackendConfig {
    /// The backend directory with `~` and environment variables expanded.
    pub fn directory_path(&self) -> Result<Option<PathBuf>, ResolverError> {
        let Some(directory) = self.directory.as_deref() else {
            return Ok(None);
        };
        expand_path(directory).map(Some)
    }
}

/// Expand `~` and `$VAR` references in a path.
pub fn expand_path(path: &str) -> Result<PathBuf, ResolverError> {
    shellexpand::full(path).map(|expanded| PathBuf::from(expanded.into_owned())).map_err(|e| ResolverError::Other {
        message: format!("Failed to expand path '{path}': {e}"),
    })
}
