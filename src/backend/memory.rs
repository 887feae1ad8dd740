//! In-memory configuration backend.
//!
//! Holds component and datasource documents in maps and records every call it
//! receives, so tests can assert the exact backend traffic a resolution
//! produces. Individual operations can be made to fail.
//!
//! ```rust
//! use nxsds_cli::backend::{ConfigBackend, MemoryBackend};
//!
//! let backend = MemoryBackend::new()
//!     .with_component("slit", "<definition/>")
//!     .with_data_source("gap", r#"<definition><datasource type="CLIENT" name="gap"/></definition>"#);
//!
//! assert_eq!(backend.available_components().unwrap(), vec!["slit"]);
//! assert_eq!(backend.calls().len(), 1);
//! ```

use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use super::graph::ComponentGraph;
use super::variables;
use super::{BackendResult, ConfigBackend};
use crate::core::BackendError;
use crate::resolver::references::component_references;

/// Backend operations, as recorded in the call journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOperation {
    AvailableComponents,
    AvailableDataSources,
    DependentComponents,
    Components,
    InstantiatedComponents,
    DataSources,
    Variables,
    SetVariables,
}

impl BackendOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendOperation::AvailableComponents => "availableComponents",
            BackendOperation::AvailableDataSources => "availableDataSources",
            BackendOperation::DependentComponents => "dependentComponents",
            BackendOperation::Components => "components",
            BackendOperation::InstantiatedComponents => "instantiatedComponents",
            BackendOperation::DataSources => "dataSources",
            BackendOperation::Variables => "variables",
            BackendOperation::SetVariables => "setVariables",
        }
    }
}

/// One journal entry: the operation and the names it was called with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCall {
    pub operation: BackendOperation,
    pub names: Vec<String>,
}

/// Map-backed [`ConfigBackend`].
#[derive(Debug, Default)]
pub struct MemoryBackend {
    components: BTreeMap<String, String>,
    data_sources: BTreeMap<String, String>,
    dependencies: HashMap<String, Vec<String>>,
    failing: HashSet<BackendOperation>,
    variables: Mutex<Map<String, Value>>,
    calls: Mutex<Vec<BackendCall>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a component document.
    ///
    /// Unless [`with_dependencies`](Self::with_dependencies) overrides them,
    /// its dependencies are the `$components.NAME` tokens in `xml`.
    #[must_use]
    pub fn with_component(mut self, name: impl Into<String>, xml: impl Into<String>) -> Self {
        self.components.insert(name.into(), xml.into());
        self
    }

    /// Store a datasource document.
    #[must_use]
    pub fn with_data_source(mut self, name: impl Into<String>, xml: impl Into<String>) -> Self {
        self.data_sources.insert(name.into(), xml.into());
        self
    }

    /// Declare the direct dependencies of a component explicitly.
    #[must_use]
    pub fn with_dependencies(mut self, name: impl Into<String>, dependencies: &[&str]) -> Self {
        self.dependencies
            .insert(name.into(), dependencies.iter().map(|d| (*d).to_string()).collect());
        self
    }

    /// Seed the backend variables. Non-object values are ignored.
    #[must_use]
    pub fn with_variables(self, variables: Value) -> Self {
        if let Value::Object(map) = variables
            && let Ok(mut current) = self.variables.lock()
        {
            *current = map;
        }
        self
    }

    /// Make every call to `operation` fail.
    #[must_use]
    pub fn failing(mut self, operation: BackendOperation) -> Self {
        self.failing.insert(operation);
        self
    }

    /// Calls received so far, oldest first.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Operations received so far, oldest first.
    pub fn operations(&self) -> Vec<BackendOperation> {
        self.calls().into_iter().map(|call| call.operation).collect()
    }

    /// Forget the call journal.
    pub fn clear_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn record(&self, operation: BackendOperation, names: &[String]) -> BackendResult<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(BackendCall {
                operation,
                names: names.to_vec(),
            });
        }

        if self.failing.contains(&operation) {
            return Err(BackendError::Unavailable {
                operation: operation.as_str().to_string(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn graph(&self) -> ComponentGraph {
        let mut graph = ComponentGraph::new();
        for (name, xml) in &self.components {
            graph.add_component(name);
            let deps = match self.dependencies.get(name) {
                Some(deps) => deps.clone(),
                None => component_references(xml),
            };
            for dep in deps {
                graph.add_dependency(name, &dep);
            }
        }
        graph
    }

    fn fetch(
        store: &BTreeMap<String, String>,
        kind: &str,
        names: &[String],
    ) -> BackendResult<Vec<String>> {
        names
            .iter()
            .map(|name| {
                store.get(name).cloned().ok_or_else(|| BackendError::NotFound {
                    kind: kind.to_string(),
                    name: name.clone(),
                })
            })
            .collect()
    }

    fn current_variables(&self) -> BackendResult<Map<String, Value>> {
        self.variables.lock().map(|vars| vars.clone()).map_err(|e| BackendError::Unavailable {
            operation: BackendOperation::Variables.as_str().to_string(),
            reason: e.to_string(),
        })
    }
}

impl ConfigBackend for MemoryBackend {
    fn available_components(&self) -> BackendResult<Vec<String>> {
        self.record(BackendOperation::AvailableComponents, &[])?;
        Ok(self.components.keys().cloned().collect())
    }

    fn available_data_sources(&self) -> BackendResult<Vec<String>> {
        self.record(BackendOperation::AvailableDataSources, &[])?;
        Ok(self.data_sources.keys().cloned().collect())
    }

    fn dependent_components(&self, names: &[String]) -> BackendResult<Vec<String>> {
        self.record(BackendOperation::DependentComponents, names)?;
        let closure = self.graph().closure(names);
        if let Some(missing) = closure.iter().find(|name| !self.components.contains_key(*name)) {
            return Err(BackendError::NotFound {
                kind: "component".to_string(),
                name: missing.clone(),
            });
        }
        Ok(closure)
    }

    fn components(&self, names: &[String]) -> BackendResult<Vec<String>> {
        self.record(BackendOperation::Components, names)?;
        Self::fetch(&self.components, "component", names)
    }

    fn instantiated_components(&self, names: &[String]) -> BackendResult<Vec<String>> {
        self.record(BackendOperation::InstantiatedComponents, names)?;
        let vars = self.current_variables()?;
        let documents = Self::fetch(&self.components, "component", names)?;
        names
            .iter()
            .zip(documents)
            .map(|(name, xml)| variables::substitute(&xml, name, &vars))
            .collect()
    }

    fn data_sources(&self, names: &[String]) -> BackendResult<Vec<String>> {
        self.record(BackendOperation::DataSources, names)?;
        Self::fetch(&self.data_sources, "datasource", names)
    }

    fn variables(&self) -> BackendResult<Map<String, Value>> {
        self.record(BackendOperation::Variables, &[])?;
        self.current_variables()
    }

    fn set_variables(&self, variables: Map<String, Value>) -> BackendResult<()> {
        self.record(BackendOperation::SetVariables, &[])?;
        let mut current = self.variables.lock().map_err(|e| BackendError::Unavailable {
            operation: BackendOperation::SetVariables.as_str().to_string(),
            reason: e.to_string(),
        })?;
        *current = variables;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn test_dependencies_from_component_tokens() {
        let backend = MemoryBackend::new()
            .with_component("scan", "<definition>$components.slit</definition>")
            .with_component("slit", "<definition/>");

        let closure = backend.dependent_components(&names(&["scan"])).unwrap();
        assert_eq!(closure, names(&["scan", "slit"]));
    }

    #[test]
    fn test_missing_dependency_is_not_found() {
        let backend = MemoryBackend::new().with_component("scan", "<definition>$components.ghost</definition>");

        let err = backend.dependent_components(&names(&["scan"])).unwrap_err();
        assert!(matches!(err, BackendError::NotFound { ref name, .. } if name == "ghost"));
    }

    #[test]
    fn test_explicit_dependencies_override_tokens() {
        let backend = MemoryBackend::new()
            .with_component("scan", "<definition>$components.slit</definition>")
            .with_component("slit", "<definition/>")
            .with_component("motor", "<definition/>")
            .with_dependencies("scan", &["motor"]);

        assert_eq!(backend.dependent_components(&names(&["scan"])).unwrap(), names(&["scan", "motor"]));
    }

    #[test]
    fn test_instantiated_components_substitute_variables() {
        let backend = MemoryBackend::new()
            .with_component("cp", "<definition><group name=\"$var.entry\"/></definition>")
            .with_variables(json!({"entry": "scan_7"}));

        let docs = backend.instantiated_components(&names(&["cp"])).unwrap();
        assert_eq!(docs, vec!["<definition><group name=\"scan_7\"/></definition>"]);

        let raw = backend.components(&names(&["cp"])).unwrap();
        assert!(raw[0].contains("$var.entry"));
    }

    #[test]
    fn test_failure_injection_and_journal() {
        let backend = MemoryBackend::new()
            .with_data_source("gap", "<definition/>")
            .failing(BackendOperation::DataSources);

        assert!(backend.data_sources(&names(&["gap"])).is_err());
        assert_eq!(
            backend.calls(),
            vec![BackendCall {
                operation: BackendOperation::DataSources,
                names: names(&["gap"]),
            }]
        );
    }

    #[test]
    fn test_set_variables_replaces_map() {
        let backend = MemoryBackend::new().with_variables(json!({"a": 1}));
        backend.set_variables(json!({"b": 2}).as_object().cloned().unwrap()).unwrap();
        assert_eq!(Value::Object(backend.variables().unwrap()), json!({"b": 2}));
    }
}
