//! Unit test suite for nxsds
//!
//! Behavioural properties of resolution checked through the public API with
//! in-memory backends.
//!
//! ```bash
//! cargo test --test unit
//! ```

mod properties;
mod registry;
mod shape;
