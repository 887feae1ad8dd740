//! nxsds - NeXus datasource resolver
//!
//! Answers the question "which datasources does this set of NeXus components
//! need, and how is each one written?" against a configuration backend that
//! stores component and datasource definitions as XML documents.
//!
//! # Architecture Overview
//!
//! - A **component** is an XML fragment of a NeXus file layout. Components
//!   depend on each other through `$components.NAME` tokens.
//! - A **datasource** says where a value comes from: a Tango attribute, a
//!   client-provided value, a database query, or a Python script (`PYEVAL`).
//! - Each `field`, `attribute` or `dim` with a `strategy` child is written at
//!   one phase of a scan: `CONFIG`, `INIT`, `STEP` or `FINAL`.
//!
//! Resolution walks every component of the dependency closure, resolves the
//! datasource of each strategy-carrying node, and records it with the node's
//! strategy, value type and shape. Results render as a tree keyed by
//! component or as flat records.
//!
//! # Core Modules
//!
//! - [`backend`] - the [`backend::ConfigBackend`] contract, an in-memory and a
//!   directory implementation
//! - [`resolver`] - component walking, node resolution, shape resolution and
//!   the datasource registry
//! - [`output`] - filtering and tree/flat rendering
//! - [`models`] - datasource records, shapes, kinds and strategies
//! - [`core`] - error types and user-facing error context
//! - [`config`] - the optional TOML configuration file
//! - [`cli`] - the `nxsds` command-line interface
//!
//! # Example
//!
//! ```rust
//! use nxsds_cli::backend::MemoryBackend;
//! use nxsds_cli::output::{OutputMode, RecordFilter};
//! use nxsds_cli::resolver::{ComponentResolver, ResolverOptions};
//!
//! let backend = MemoryBackend::new()
//!     .with_component(
//!         "slit",
//!         r#"<definition><field name="gap" type="NX_FLOAT">
//!              <strategy mode="STEP"/>$datasources.gap</field></definition>"#,
//!     )
//!     .with_data_source(
//!         "gap",
//!         r#"<datasource type="CLIENT" name="gap"><record name="slit_gap"/></datasource>"#,
//!     );
//!
//! let resolver = ComponentResolver::new(&backend, ResolverOptions::default())?;
//! let description = resolver.components(None, &RecordFilter::default(), None, OutputMode::Tree)?;
//! let json = serde_json::to_value(&description).unwrap();
//! assert_eq!(json["slit"]["gap"][0][2], "slit_gap");
//! # Ok::<(), nxsds_cli::core::ResolverError>(())
//! ```

pub mod backend;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod models;
pub mod output;
pub mod resolver;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
