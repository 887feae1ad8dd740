//! Command-line interface for nxsds.
//!
//! ```text
//! nxsds [--verbose|--quiet] [--config FILE] [--backend-dir DIR] <COMMAND>
//!
//!   components [NAMES]...   datasources needed by components and their dependencies
//!   datasources [NAMES]...  describe datasources by name
//!   available <KIND>        list component or datasource names
//! ```
//!
//! Results go to stdout as JSON (default) or YAML; logs go to stderr.
//!
//! # Examples
//!
//! ```bash
//! # Everything the slit component writes per step, as flat records
//! nxsds --backend-dir ./config components slit --strategy STEP --flat
//!
//! # Substitute variables before resolving
//! nxsds components mca --variables '{"serialno": 12}'
//!
//! # Follow script inputs
//! nxsds datasources sum --expand-scripts --format yaml
//! ```

mod available;
pub mod common;
mod components;
mod datasources;


pub use available::{AvailableCommand, AvailableKind};
pub use common::CommandContext;
pub use components::ComponentsCommand;
pub use datasources::DataSourcesCommand;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Settings derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Default log filter; `None` disables logging. `RUST_LOG` takes
    /// precedence when set.
    pub log_level: Option<String>,

    /// Explicit configuration file.
    pub config_path: Option<PathBuf>,

    /// Backend directory overriding the configuration file.
    pub backend_dir: Option<PathBuf>,
}

impl CliConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a stderr tracing subscriber for the configured level.
    ///
    /// Does nothing when logging is disabled or a subscriber already exists.
    pub fn init_logging(&self) {
        let Some(level) = &self.log_level else {
            return;
        };

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Resolve NeXus component and datasource definitions.
#[derive(Parser, Debug)]
#[command(name = "nxsds", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show debug logging on stderr
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file (default: $NXSDS_CONFIG, then ~/.nxsds/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Backend directory with components/ and datasources/
    #[arg(long, global = true, value_name = "DIR")]
    backend_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve the datasources of components and their dependencies
    Components(ComponentsCommand),

    /// Describe datasources by name
    #[command(name = "datasources")]
    DataSources(DataSourcesCommand),

    /// List the names a backend provides
    Available(AvailableCommand),
}

impl Cli {
    /// Execute the parsed command, writing results to stdout.
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.execute_with_config(config, &mut out)
    }

    /// Translate the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            Some("warn".to_string())
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
            backend_dir: self.backend_dir.clone(),
        }
    }

    /// Execute with an injected configuration and output sink.
    pub fn execute_with_config(self, config: CliConfig, out: &mut dyn Write) -> Result<()> {
        let ctx = CommandContext::load(&config)?;

        match self.command {
            Commands::Components(cmd) => cmd.execute(&ctx, out),
            Commands::DataSources(cmd) => cmd.execute(&ctx, out),
            Commands::Available(cmd) => cmd.execute(&ctx, out),
        }
    }
}
