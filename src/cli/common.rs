//! Shared state and helpers for CLI commands

use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

use super::CliConfig;
use crate::backend::DirectoryBackend;
use crate::config::Config;
use crate::core::ResolverError;
use crate::output::{Description, OutputFormat, OutputMode};
use crate::resolver::ResolverOptions;

/// Configuration file merged with the global command-line flags.
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    pub config: Config,
    backend_dir: Option<PathBuf>,
}

impl CommandContext {
    /// Load the configuration file selected by `cli`.
    pub fn load(cli: &CliConfig) -> Result<Self> {
        let config = Config::load(cli.config_path.as_deref())?;
        Ok(Self::new(config, cli.backend_dir.clone()))
    }

    pub fn new(config: Config, backend_dir: Option<PathBuf>) -> Self {
        Self {
            config,
            backend_dir,
        }
    }

    /// Backend directory: `--backend-dir` first, then `[backend] directory`.
    pub fn backend_root(&self) -> Result<PathBuf, ResolverError> {
        if let Some(dir) = &self.backend_dir {
            return Ok(dir.clone());
        }
        self.config.backend.directory_path()?.ok_or(ResolverError::BackendNotConfigured)
    }

    pub fn open_backend(&self) -> Result<DirectoryBackend> {
        let root = self.backend_root()?;
        debug!("Using backend directory {}", root.display());
        Ok(DirectoryBackend::open(root)?)
    }

    /// `--expand-scripts` turns expansion on; it never turns it off.
    pub fn resolver_options(&self, expand_scripts: bool) -> ResolverOptions {
        ResolverOptions {
            expand_scripts: expand_scripts || self.config.resolver.expand_scripts,
        }
    }

    pub fn output_mode(&self, flat: bool) -> OutputMode {
        if flat { OutputMode::Flat } else { self.config.output.mode }
    }

    pub fn output_format(&self, format: Option<OutputFormat>) -> OutputFormat {
        format.unwrap_or(self.config.output.format)
    }
}

/// Write an encoded description followed by a newline.
pub fn write_description(out: &mut dyn Write, description: &Description, format: OutputFormat) -> Result<()> {
    let text = description.encode(format)?;
    writeln!(out, "{}", text.trim_end())?;
    Ok(())
}
