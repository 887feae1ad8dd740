//! Integration test suite for nxsds
//!
//! End-to-end tests over real backend directories: the resolver against the
//! directory backend, and the `nxsds` binary.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **backend**: resolution against `DirectoryBackend`, variables included
//! - **cli**: the binary's commands, output formats and exit codes
//! - **config**: configuration file discovery and precedence

mod common;

mod backend;
mod cli;
mod config;
