//! Describe datasources by name.

use anyhow::Result;
use clap::Args;
use std::io::Write;
use tracing::info;

use super::common::{CommandContext, write_description};
use crate::output::{OutputFormat, RecordFilter};
use crate::resolver::ComponentResolver;

/// Arguments of `nxsds datasources`.
#[derive(Args, Debug)]
pub struct DataSourcesCommand {
    /// Datasources to describe; all available datasources when omitted
    pub names: Vec<String>,

    /// Only show datasources of this kind
    #[arg(long)]
    pub kind: Option<String>,

    /// One record per datasource instead of a tree
    #[arg(long)]
    pub flat: bool,

    /// Include the datasources used by PYEVAL scripts
    #[arg(long)]
    pub expand_scripts: bool,

    /// Output encoding
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

impl DataSourcesCommand {
    pub fn execute(self, ctx: &CommandContext, out: &mut dyn Write) -> Result<()> {
        let backend = ctx.open_backend()?;
        let resolver = ComponentResolver::new(&backend, ctx.resolver_options(self.expand_scripts))?;

        let names = (!self.names.is_empty()).then_some(self.names.as_slice());
        let filter = RecordFilter::by_kind(self.kind.as_deref());
        let description = resolver.data_sources(names, &filter, ctx.output_mode(self.flat))?;
        info!("Described {} datasources", description.occurrences());

        write_description(out, &description, ctx.output_format(self.format))
    }
}
