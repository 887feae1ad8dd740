//! Datasource resolution for NeXus component definitions.
//!
//! A component is an XML fragment of a NeXus file layout. Its `field`,
//! `attribute` and `dim` elements say *what* gets written; a direct
//! `strategy` child says *when* (`CONFIG`, `INIT`, `STEP`, `FINAL`); and a
//! datasource says *where the value comes from*. [`ComponentResolver`] turns a
//! set of component names into the list of datasources they need, each tagged
//! with the strategy, value type and shape of the element that uses it.
//!
//! # Resolution Process
//!
//! ## Components
//! 1. **Selection**: requested names are intersected with the
//!    available-components snapshot taken when the resolver was built;
//!    unknown names are dropped without error
//! 2. **Closure**: the backend expands the selection to its full dependency
//!    closure
//! 3. **Fetch**: documents are fetched in one bulk call, after merging any
//!    caller variables into the backend when variables were supplied
//! 4. **Walk**: every strategy-carrying node of every document is resolved
//!    into a per-component [`DataSourceRegistry`]
//! 5. **Render**: filters are applied and the tree or flat result is built
//!    (see [`crate::output`])
//!
//! ## Node resolution
//! A node declares its datasource in one of three ways, tried in order:
//!
//! ```xml
//! <!-- embedded -->
//! <field name="gap" type="NX_FLOAT">
//!   <strategy mode="STEP"/>
//!   <datasource type="TANGO" name="gap">
//!     <device hostname="haso" member="attribute" name="p09/motor/exp.01"/>
//!     <record name="Position"/>
//!   </datasource>
//! </field>
//!
//! <!-- referenced by name -->
//! <field name="title" type="NX_CHAR">
//!   <strategy mode="INIT"/>$datasources.title</field>
//! ```
//!
//! Embedded datasources are appended in document order until one claims a
//! name. Otherwise the first `$datasources.NAME` token in the node's own text
//! is looked up: an available name is described from its own document, an
//! unavailable one becomes an in-band `__ERROR__` record. A node with neither
//! contributes nothing.
//!
//! ## Script expansion
//! With [`ResolverOptions::expand_scripts`], a computed (`PYEVAL`) datasource
//! also pulls in the datasources its script actually uses: every
//! `$datasources.NAME` token of its document whose name occurs in its
//! `result` text is described and appended alongside it. Expansion keeps a
//! visited set per chain and stops at [`MAX_EXPANSION_DEPTH`], so
//! self-referencing scripts terminate.
//!
//! # Error Handling
//!
//! Bulk backend calls and unparsable component documents fail the whole call
//! with a [`ResolverError`]. Fetching a single referenced datasource never
//! does: a failure is logged and the reference resolves to nothing.
//!
//! # Example
//!
//! ```rust
//! use nxsds_cli::backend::MemoryBackend;
//! use nxsds_cli::output::{OutputMode, RecordFilter};
//! use nxsds_cli::resolver::{ComponentResolver, ResolverOptions};
//!
//! let backend = MemoryBackend::new().with_component(
//!     "slit",
//!     r#"<definition><field name="gap" type="NX_FLOAT"><strategy mode="STEP"/>
//!          <datasource type="CLIENT" name="gap"><record name="slit_gap"/></datasource>
//!        </field></definition>"#,
//! );
//!
//! let resolver = ComponentResolver::new(&backend, ResolverOptions::default())?;
//! let description = resolver.components(None, &RecordFilter::default(), None, OutputMode::Flat)?;
//! assert_eq!(description.occurrences(), 1);
//! # Ok::<(), nxsds_cli::core::ResolverError>(())
//! ```

pub mod node;
pub mod references;
pub mod registry;
pub mod shape;

pub use registry::DataSourceRegistry;

use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::{debug, trace, warn};

use crate::backend::{ConfigBackend, variables};
use crate::constants::MAX_EXPANSION_DEPTH;
use crate::core::ResolverError;
use crate::models::DataSourceRecord;
use crate::output::{Description, OutputMode, RecordFilter, render_components, render_data_sources};
use node::{
    DATASOURCE_TAG, STRATEGY_TAG, attribute, carries_strategy, child_elements, direct_text, embedded_record,
    first_child, result_text, source_text,
};
use references::{first_datasource_reference, used_references};

/// Resolution switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// Follow the datasources used by computed (`PYEVAL`) scripts.
    pub expand_scripts: bool,
}

/// Unfiltered resolution result for one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDescription {
    pub name: String,
    pub registry: DataSourceRegistry,
}

/// Resolves components and datasources against a [`ConfigBackend`].
///
/// Availability is snapshotted once in [`new`](Self::new); names added to the
/// backend afterwards are treated as unknown.
pub struct ComponentResolver<B: ConfigBackend> {
    backend: B,
    options: ResolverOptions,
    available_components: Vec<String>,
    available_data_sources: Vec<String>,
    known_data_sources: HashSet<String>,
}

impl<B: ConfigBackend> ComponentResolver<B> {
    /// Create a resolver, capturing the backend's available names.
    pub fn new(backend: B, options: ResolverOptions) -> Result<Self, ResolverError> {
        let available_components = backend.available_components()?;
        let available_data_sources = backend.available_data_sources()?;
        debug!(
            "Resolver snapshot: {} components, {} datasources (expand_scripts={})",
            available_components.len(),
            available_data_sources.len(),
            options.expand_scripts
        );

        let known_data_sources = available_data_sources.iter().cloned().collect();
        Ok(Self {
            backend,
            options,
            available_components,
            available_data_sources,
            known_data_sources,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn options(&self) -> ResolverOptions {
        self.options
    }

    /// Component names captured at construction.
    pub fn available_components(&self) -> &[String] {
        &self.available_components
    }

    /// Datasource names captured at construction.
    pub fn available_data_sources(&self) -> &[String] {
        &self.available_data_sources
    }

    /// Resolve components and render them.
    ///
    /// `names` defaults to every available component. `variables`, when
    /// given, must be a JSON object; it is merged into the backend variables
    /// (a lasting change to backend state) before a substituting fetch.
    pub fn components(
        &self,
        names: Option<&[String]>,
        filter: &RecordFilter,
        variables: Option<&Value>,
        mode: OutputMode,
    ) -> Result<Description, ResolverError> {
        let resolved = self.resolve_components(names, variables)?;
        Ok(render_components(&resolved, mode, filter))
    }

    /// Resolve components without filtering, one registry per closure member.
    pub fn resolve_components(
        &self,
        names: Option<&[String]>,
        variables: Option<&Value>,
    ) -> Result<Vec<ComponentDescription>, ResolverError> {
        let variables = variables.map(variable_map).transpose()?;

        let selected = select(names, &self.available_components);
        if selected.is_empty() {
            debug!("No available components requested");
            return Ok(Vec::new());
        }

        let closure = self.backend.dependent_components(&selected)?;
        debug!("Dependency closure of {:?}: {:?}", selected, closure);

        let documents = match variables {
            Some(updates) => {
                self.apply_variables(updates)?;
                self.backend.instantiated_components(&closure)?
            }
            None => self.backend.components(&closure)?,
        };
        check_count("components", closure.len(), documents.len())?;

        closure
            .into_iter()
            .zip(documents)
            .map(|(name, xml)| {
                let registry = self.describe_component(&name, &xml)?;
                debug!("Component '{}': {} datasources", name, registry.len());
                Ok(ComponentDescription {
                    name,
                    registry,
                })
            })
            .collect()
    }

    /// Resolve datasources and render them.
    pub fn data_sources(
        &self,
        names: Option<&[String]>,
        filter: &RecordFilter,
        mode: OutputMode,
    ) -> Result<Description, ResolverError> {
        let registry = self.resolve_data_sources(names)?;
        Ok(render_data_sources(&registry, mode, filter))
    }

    /// Resolve datasources without filtering.
    ///
    /// `names` defaults to every available datasource. Expansion, when
    /// enabled, appends the used sub-datasources after each computed one.
    pub fn resolve_data_sources(&self, names: Option<&[String]>) -> Result<DataSourceRegistry, ResolverError> {
        let mut registry = DataSourceRegistry::new();

        let selected = select(names, &self.available_data_sources);
        if selected.is_empty() {
            debug!("No available datasources requested");
            return Ok(registry);
        }

        let documents = self.backend.data_sources(&selected)?;
        check_count("dataSources", selected.len(), documents.len())?;

        for (name, xml) in selected.iter().zip(&documents) {
            let mut visited = HashSet::from([name.clone()]);
            let records = self.describe_document(name, xml, &mut visited, 0)?;
            registry.append(&records, None, None, None);
        }

        Ok(registry)
    }

    /// Describe one datasource from its own document.
    ///
    /// Never fails: an unknown name, a fetch failure or a malformed document
    /// all yield an empty list.
    pub fn describe_data_source(&self, name: &str) -> Vec<DataSourceRecord> {
        let mut visited = HashSet::new();
        self.describe_chain(name, &mut visited, 0)
    }

    fn describe_component(&self, name: &str, xml: &str) -> Result<DataSourceRegistry, ResolverError> {
        let document = Document::parse(xml).map_err(|e| ResolverError::InvalidXml {
            document: format!("component '{name}'"),
            reason: e.to_string(),
        })?;

        let mut registry = DataSourceRegistry::new();
        for node in document.descendants().filter(|n| carries_strategy(*n)) {
            self.resolve_node(node, &mut registry);
        }
        Ok(registry)
    }

    fn resolve_node(&self, node: Node<'_, '_>, registry: &mut DataSourceRegistry) {
        let strategy = first_child(node, STRATEGY_TAG).and_then(|s| attribute(s, "mode"));
        let value_type = attribute(node, "type");
        let shape = shape::node_shape(node);

        let mut embedded = child_elements(node, DATASOURCE_TAG).peekable();

        if embedded.peek().is_none() {
            if let Some(name) = first_datasource_reference(&direct_text(node)) {
                let records = self.referenced_records(&name);
                registry.append(&records, strategy, value_type, Some(shape.as_slice()));
            }
            return;
        }

        for datasource in embedded {
            let records = self.embedded_records(datasource);
            if let Some(claimed) = registry.append(&records, strategy, value_type, Some(shape.as_slice())) {
                trace!("Node <{}> claimed by '{}'", node.tag_name().name(), claimed);
                break;
            }
        }
    }

    fn referenced_records(&self, name: &str) -> Vec<DataSourceRecord> {
        if !self.known_data_sources.contains(name) {
            debug!("Datasource '{}' is not available", name);
            return vec![DataSourceRecord::unresolved(name)];
        }
        self.describe_data_source(name)
    }

    fn embedded_records(&self, datasource: Node<'_, '_>) -> Vec<DataSourceRecord> {
        let record = embedded_record(datasource);
        if !self.options.expand_scripts || !is_computed(&record) {
            return vec![record];
        }

        let mut visited: HashSet<String> = record.name().map(str::to_string).into_iter().collect();
        let mut records = vec![record];

        let mut nested = child_elements(datasource, DATASOURCE_TAG).peekable();
        if nested.peek().is_some() {
            records.extend(nested.map(embedded_record));
        } else {
            records.extend(self.expand(source_text(datasource), result_text(datasource), &mut visited, 1));
        }
        records
    }

    fn describe_chain(&self, name: &str, visited: &mut HashSet<String>, depth: usize) -> Vec<DataSourceRecord> {
        if !visited.insert(name.to_string()) {
            trace!("Datasource '{}' already described in this chain", name);
            return Vec::new();
        }

        let xml = match self.fetch_data_source(name) {
            Ok(xml) => xml,
            Err(e) => {
                warn!("Failed to fetch datasource '{}': {}", name, e);
                return Vec::new();
            }
        };

        self.describe_document(name, &xml, visited, depth).unwrap_or_else(|e| {
            warn!("Failed to describe datasource '{}': {}", name, e);
            Vec::new()
        })
    }

    fn fetch_data_source(&self, name: &str) -> Result<String, ResolverError> {
        let documents = self.backend.data_sources(&[name.to_string()])?;
        let actual = documents.len();
        documents.into_iter().next().ok_or(ResolverError::DocumentCountMismatch {
            operation: "dataSources".to_string(),
            expected: 1,
            actual,
        })
    }

    /// Records defined by a datasource document.
    ///
    /// The document is either a bare `datasource` element or a wrapper whose
    /// direct `datasource` children are the definitions. A definition without
    /// a name takes the name it was requested under.
    fn describe_document(
        &self,
        name: &str,
        xml: &str,
        visited: &mut HashSet<String>,
        depth: usize,
    ) -> Result<Vec<DataSourceRecord>, ResolverError> {
        let document = Document::parse(xml).map_err(|e| ResolverError::InvalidXml {
            document: format!("datasource '{name}'"),
            reason: e.to_string(),
        })?;

        let root = document.root_element();
        let definitions: Vec<Node<'_, '_>> = if root.has_tag_name(DATASOURCE_TAG) {
            vec![root]
        } else {
            child_elements(root, DATASOURCE_TAG).collect()
        };

        let mut records = Vec::new();
        for definition in definitions {
            let mut record = embedded_record(definition);
            if record.name().is_none() {
                record = record.derive(Some(name));
            }
            if let Some(own_name) = record.name() {
                visited.insert(own_name.to_string());
            }

            let expand = self.options.expand_scripts && is_computed(&record);
            records.push(record);

            if expand {
                records.extend(self.expand(xml, result_text(definition), visited, depth + 1));
            }
        }

        Ok(records)
    }

    /// Describe the datasources a computed script uses.
    fn expand(
        &self,
        document: &str,
        result: Option<String>,
        visited: &mut HashSet<String>,
        depth: usize,
    ) -> Vec<DataSourceRecord> {
        let Some(result) = result else {
            return Vec::new();
        };

        if depth > MAX_EXPANSION_DEPTH {
            warn!("Datasource expansion stopped at depth {}", MAX_EXPANSION_DEPTH);
            return Vec::new();
        }

        let mut records = Vec::new();
        for name in used_references(document, &result) {
            if visited.contains(&name) {
                continue;
            }
            if !self.known_data_sources.contains(&name) {
                debug!("Script references unavailable datasource '{}'", name);
                continue;
            }
            records.extend(self.describe_chain(&name, visited, depth));
        }
        records
    }

    fn apply_variables(&self, updates: &Map<String, Value>) -> Result<(), ResolverError> {
        let mut current = self.backend.variables()?;
        variables::merge(&mut current, updates);
        self.backend.set_variables(current)?;
        Ok(())
    }
}

fn is_computed(record: &DataSourceRecord) -> bool {
    record.parsed_kind().is_some_and(|kind| kind.is_computed())
}

/// Requested names that are available, in request order, without duplicates.
fn select(requested: Option<&[String]>, available: &[String]) -> Vec<String> {
    let Some(requested) = requested else {
        return available.to_vec();
    };

    let mut seen = HashSet::new();
    requested
        .iter()
        .filter(|name| {
            let known = available.contains(name);
            if !known {
                debug!("Ignoring unknown name '{}'", name);
            }
            known
        })
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}

fn variable_map(value: &Value) -> Result<&Map<String, Value>, ResolverError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ResolverError::InvalidVariables {
            reason: format!("expected a JSON object, got {}", json_type(other)),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn check_count(operation: &str, expected: usize, actual: usize) -> Result<(), ResolverError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ResolverError::DocumentCountMismatch {
            operation: operation.to_string(),
            expected,
            actual,
        })
    }
}
