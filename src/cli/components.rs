//! Resolve components into their datasources.

use anyhow::Result;
use clap::Args;
use serde_json::Value;
use std::io::Write;
use tracing::info;

use super::common::{CommandContext, write_description};
use crate::core::ResolverError;
use crate::models::StrategyMode;
use crate::output::{OutputFormat, RecordFilter};
use crate::resolver::ComponentResolver;

/// Arguments of `nxsds components`.
#[derive(Args, Debug)]
pub struct ComponentsCommand {
    /// Components to resolve; all available components when omitted
    pub names: Vec<String>,

    /// Only show datasources written with this strategy (CONFIG, INIT, STEP, FINAL)
    #[arg(long, value_name = "MODE")]
    pub strategy: Option<String>,

    /// Only show datasources of this kind (e.g. TANGO, CLIENT)
    #[arg(long)]
    pub kind: Option<String>,

    /// JSON object merged into the backend variables before fetching
    #[arg(long, value_name = "JSON")]
    pub variables: Option<String>,

    /// One record per datasource occurrence instead of a tree
    #[arg(long)]
    pub flat: bool,

    /// Include the datasources used by PYEVAL scripts
    #[arg(long)]
    pub expand_scripts: bool,

    /// Output encoding
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

impl ComponentsCommand {
    pub fn execute(self, ctx: &CommandContext, out: &mut dyn Write) -> Result<()> {
        let strategy = parse_strategy(self.strategy.as_deref())?;
        let variables = parse_variables(self.variables.as_deref())?;

        let backend = ctx.open_backend()?;
        let resolver = ComponentResolver::new(&backend, ctx.resolver_options(self.expand_scripts))?;

        let names = (!self.names.is_empty()).then_some(self.names.as_slice());
        let filter = RecordFilter::new(strategy.map(|s| s.as_str()), self.kind.as_deref());
        let description = resolver.components(names, &filter, variables.as_ref(), ctx.output_mode(self.flat))?;
        info!("Resolved {} datasource occurrences", description.occurrences());

        write_description(out, &description, ctx.output_format(self.format))
    }
}

fn parse_strategy(value: Option<&str>) -> Result<Option<StrategyMode>, ResolverError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(mode) => mode.parse().map(Some),
        None => Ok(None),
    }
}

fn parse_variables(value: Option<&str>) -> Result<Option<Value>, ResolverError> {
    let Some(text) = value else {
        return Ok(None);
    };

    let parsed: Value = serde_json::from_str(text).map_err(|e| ResolverError::InvalidVariables {
        reason: e.to_string(),
    })?;
    if !parsed.is_object() {
        return Err(ResolverError::InvalidVariables {
            reason: "expected a JSON object".to_string(),
        });
    }
    Ok(Some(parsed))
}
