//! Core types for nxsds
//!
//! - [`error`] - typed library errors and the CLI-facing [`ErrorContext`]

pub mod error;

pub use error::{BackendError, ErrorContext, ResolverError, user_friendly_error};
