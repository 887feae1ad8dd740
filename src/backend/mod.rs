//! Configuration backend contract.
//!
//! The resolver never talks to a configuration service directly. It consumes
//! a [`ConfigBackend`], a blocking request/response interface that hands out
//! component and datasource documents as XML strings. Two implementations
//! ship with the crate:
//!
//! - [`memory::MemoryBackend`] - in-process maps, with a call journal and
//!   failure injection for tests
//! - [`directory::DirectoryBackend`] - `components/*.xml` and
//!   `datasources/*.xml` under a root directory
//!
//! Backends own the variable set used by
//! [`ConfigBackend::instantiated_components`]; [`variables::substitute`]
//! implements the `$var.NAME` template shared by both.

pub mod directory;
pub mod graph;
pub mod memory;
pub mod variables;

pub use directory::DirectoryBackend;
pub use memory::{BackendCall, BackendOperation, MemoryBackend};

use serde_json::{Map, Value};

use crate::core::BackendError;

/// Result type returned by every backend operation.
pub type BackendResult<T> = Result<T, BackendError>;

/// A synchronous configuration service.
///
/// All methods take `&self`; implementations keep their mutable variable set
/// behind interior mutability. Bulk fetches return one document per requested
/// name, in request order.
pub trait ConfigBackend {
    /// Names of every stored component.
    fn available_components(&self) -> BackendResult<Vec<String>>;

    /// Names of every stored datasource.
    fn available_data_sources(&self) -> BackendResult<Vec<String>>;

    /// Transitive dependency closure of `names`, including `names` themselves.
    fn dependent_components(&self, names: &[String]) -> BackendResult<Vec<String>>;

    /// Raw component documents.
    fn components(&self, names: &[String]) -> BackendResult<Vec<String>>;

    /// Component documents with the current variables substituted.
    ///
    /// Fails when a document needs a variable that is not set.
    fn instantiated_components(&self, names: &[String]) -> BackendResult<Vec<String>>;

    /// Datasource documents.
    fn data_sources(&self, names: &[String]) -> BackendResult<Vec<String>>;

    /// Current substitution variables.
    fn variables(&self) -> BackendResult<Map<String, Value>>;

    /// Replace the substitution variables.
    fn set_variables(&self, variables: Map<String, Value>) -> BackendResult<()>;
}

impl<B: ConfigBackend + ?Sized> ConfigBackend for &B {
    fn available_components(&self) -> BackendResult<Vec<String>> {
        (**self).available_components()
    }

    fn available_data_sources(&self) -> BackendResult<Vec<String>> {
        (**self).available_data_sources()
    }

    fn dependent_components(&self, names: &[String]) -> BackendResult<Vec<String>> {
        (**self).dependent_components(names)
    }

    fn components(&self, names: &[String]) -> BackendResult<Vec<String>> {
        (**self).components(names)
    }

    fn instantiated_components(&self, names: &[String]) -> BackendResult<Vec<String>> {
        (**self).instantiated_components(names)
    }

    fn data_sources(&self, names: &[String]) -> BackendResult<Vec<String>> {
        (**self).data_sources(names)
    }

    fn variables(&self) -> BackendResult<Map<String, Value>> {
        (**self).variables()
    }

    fn set_variables(&self, variables: Map<String, Value>) -> BackendResult<()> {
        (**self).set_variables(variables)
    }
}

impl<B: ConfigBackend + ?Sized> ConfigBackend for Box<B> {
    fn available_components(&self) -> BackendResult<Vec<String>> {
        (**self).available_components()
    }

    fn available_data_sources(&self) -> BackendResult<Vec<String>> {
        (**self).available_data_sources()
    }

    fn dependent_components(&self, names: &[String]) -> BackendResult<Vec<String>> {
        (**self).dependent_components(names)
    }

    fn components(&self, names: &[String]) -> BackendResult<Vec<String>> {
        (**self).components(names)
    }

    fn instantiated_components(&self, names: &[String]) -> BackendResult<Vec<String>> {
        (**self).instantiated_components(names)
    }

    fn data_sources(&self, names: &[String]) -> BackendResult<Vec<String>> {
        (**self).data_sources(names)
    }

    fn variables(&self) -> BackendResult<Map<String, Value>> {
        (**self).variables()
    }

    fn set_variables(&self, variables: Map<String, Value>) -> BackendResult<()> {
        (**self).set_variables(variables)
    }
}
