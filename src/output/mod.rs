//! Rendering resolved datasources.
//!
//! Two result shapes are produced from the same unfiltered resolution:
//!
//! - **tree** - nested by owner:
//!   `{component: {datasource: [[strategy, kind, record, value_type, shape], ...]}}`
//!   for components and `{datasource: [[kind, record], ...]}` for datasources
//! - **flat** - one self-contained object per occurrence:
//!   `{name, strategy, kind, record, value_type, shape, component}`
//!
//! Map keys keep resolution order: components follow the dependency closure
//! returned by the backend, datasources their first discovery.

mod filters;

pub use filters::RecordFilter;

use anyhow::{Context, Result};
use serde::ser::{SerializeMap, SerializeTuple};
use serde::{Deserialize, Serialize, Serializer};

use crate::models::{EnrichedDataSourceRecord, ShapeDim};
use crate::resolver::{ComponentDescription, DataSourceRegistry};

/// Result shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Nested by component (or by datasource name)
    #[default]
    Tree,
    /// One record per occurrence
    Flat,
}

/// Text encoding used by the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

/// Map that serializes its entries in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V>(pub Vec<(String, V)>);

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> OrderedMap<V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// One occurrence in component tree output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub strategy: Option<String>,
    pub kind: Option<String>,
    pub record: Option<String>,
    pub value_type: Option<String>,
    pub shape: Option<Vec<ShapeDim>>,
}

impl From<&EnrichedDataSourceRecord> for TreeEntry {
    fn from(record: &EnrichedDataSourceRecord) -> Self {
        Self {
            strategy: record.strategy().map(str::to_string),
            kind: record.kind().map(str::to_string),
            record: record.record().map(str::to_string),
            value_type: record.value_type().map(str::to_string),
            shape: record.shape().map(<[ShapeDim]>::to_vec),
        }
    }
}

impl Serialize for TreeEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(5)?;
        tuple.serialize_element(&self.strategy)?;
        tuple.serialize_element(&self.kind)?;
        tuple.serialize_element(&self.record)?;
        tuple.serialize_element(&self.value_type)?;
        tuple.serialize_element(&self.shape)?;
        tuple.end()
    }
}

/// One occurrence in datasource tree output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub kind: Option<String>,
    pub record: Option<String>,
}

impl Serialize for SourceEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.kind)?;
        tuple.serialize_element(&self.record)?;
        tuple.end()
    }
}

/// One independently addressable occurrence in flat output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatRecord {
    pub name: String,
    pub strategy: Option<String>,
    pub kind: Option<String>,
    pub record: Option<String>,
    pub value_type: Option<String>,
    pub shape: Option<Vec<ShapeDim>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
}

impl FlatRecord {
    fn new(name: &str, record: &EnrichedDataSourceRecord, component: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            strategy: record.strategy().map(str::to_string),
            kind: record.kind().map(str::to_string),
            record: record.record().map(str::to_string),
            value_type: record.value_type().map(str::to_string),
            shape: record.shape().map(<[ShapeDim]>::to_vec),
            component: component.map(str::to_string),
        }
    }
}

pub type ComponentTree = OrderedMap<OrderedMap<Vec<TreeEntry>>>;
pub type DataSourceTree = OrderedMap<Vec<SourceEntry>>;

/// A rendered resolution result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Description {
    Components(ComponentTree),
    DataSources(DataSourceTree),
    Flat(Vec<FlatRecord>),
}

impl Description {
    /// Number of datasource occurrences rendered.
    pub fn occurrences(&self) -> usize {
        match self {
            Description::Components(tree) => {
                tree.0.iter().flat_map(|(_, sources)| sources.0.iter()).map(|(_, entries)| entries.len()).sum()
            }
            Description::DataSources(tree) => tree.0.iter().map(|(_, entries)| entries.len()).sum(),
            Description::Flat(records) => records.len(),
        }
    }

    /// The flat records, if this is flat output.
    pub fn as_flat(&self) -> Option<&[FlatRecord]> {
        match self {
            Description::Flat(records) => Some(records),
            _ => None,
        }
    }

    /// Encode as text.
    pub fn encode(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => serde_json::to_string_pretty(self).context("Failed to serialize output as JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(self).context("Failed to serialize output as YAML"),
        }
    }
}

/// Render per-component registries.
pub fn render_components(components: &[ComponentDescription], mode: OutputMode, filter: &RecordFilter) -> Description {
    match mode {
        OutputMode::Tree => {
            let tree = components
                .iter()
                .map(|component| {
                    let sources = component
                        .registry
                        .iter()
                        .filter_map(|(name, records)| {
                            let entries: Vec<TreeEntry> =
                                records.iter().filter(|r| filter.matches(r)).map(TreeEntry::from).collect();
                            (!entries.is_empty()).then(|| (name.to_string(), entries))
                        })
                        .collect();
                    (component.name.clone(), OrderedMap(sources))
                })
                .collect();
            Description::Components(OrderedMap(tree))
        }
        OutputMode::Flat => {
            let records = components
                .iter()
                .flat_map(|component| {
                    component.registry.iter().flat_map(move |(name, records)| {
                        records
                            .iter()
                            .filter(|r| filter.matches(r))
                            .map(move |r| FlatRecord::new(name, r, Some(&component.name)))
                    })
                })
                .collect();
            Description::Flat(records)
        }
    }
}

/// Render a datasource registry.
pub fn render_data_sources(registry: &DataSourceRegistry, mode: OutputMode, filter: &RecordFilter) -> Description {
    match mode {
        OutputMode::Tree => {
            let tree = registry
                .iter()
                .filter_map(|(name, records)| {
                    let entries: Vec<SourceEntry> = records
                        .iter()
                        .filter(|r| filter.matches(r))
                        .map(|r| SourceEntry {
                            kind: r.kind().map(str::to_string),
                            record: r.record().map(str::to_string),
                        })
                        .collect();
                    (!entries.is_empty()).then(|| (name.to_string(), entries))
                })
                .collect();
            Description::DataSources(OrderedMap(tree))
        }
        OutputMode::Flat => Description::Flat(
            registry
                .iter()
                .flat_map(|(name, records)| {
                    records.iter().filter(|r| filter.matches(r)).map(move |r| FlatRecord::new(name, r, None))
                })
                .collect(),
        ),
    }
}
