//! List the definitions a backend provides.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::io::Write;

use super::common::CommandContext;
use crate::backend::ConfigBackend;
use crate::output::OutputFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AvailableKind {
    Components,
    Datasources,
}

/// Arguments of `nxsds available`.
#[derive(Args, Debug)]
pub struct AvailableCommand {
    /// Which definitions to list
    #[arg(value_enum)]
    pub kind: AvailableKind,

    /// Output encoding
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

impl AvailableCommand {
    pub fn execute(self, ctx: &CommandContext, out: &mut dyn Write) -> Result<()> {
        let backend = ctx.open_backend()?;
        let names = match self.kind {
            AvailableKind::Components => backend.available_components()?,
            AvailableKind::Datasources => backend.available_data_sources()?,
        };

        let text = match ctx.output_format(self.format) {
            OutputFormat::Json => serde_json::to_string_pretty(&names).context("Failed to serialize names as JSON")?,
            OutputFormat::Yaml => serde_yaml::to_string(&names).context("Failed to serialize names as YAML")?,
        };
        writeln!(out, "{}", text.trim_end())?;
        Ok(())
    }
}
