//! Test utilities for nxsds
//!
//! Helpers shared by unit and integration tests:
//! - XML fixtures for components and datasources
//! - Temporary backend directories
//! - One-time logging initialization
//!
//! # Example
//!
//! ```rust,no_run
//! use nxsds_cli::resolver::{ComponentResolver, ResolverOptions};
//! use nxsds_cli::test_utils::BackendEnvironment;
//!
//! let env = BackendEnvironment::with_beamline().unwrap();
//! let backend = env.backend().unwrap();
//! let resolver = ComponentResolver::new(&backend, ResolverOptions::default()).unwrap();
//! assert!(resolver.available_components().contains(&"slit".to_string()));
//! ```

pub mod environment;
pub mod fixtures;

pub use environment::BackendEnvironment;
pub use fixtures::{ComponentFixture, DataSourceFixture, memory_backend};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Initializes the tracing subscriber once per process. Uses `level` when
/// given, `RUST_LOG` otherwise, and stays silent when neither is set.
///
/// ```bash
/// RUST_LOG=nxsds_cli=trace cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
