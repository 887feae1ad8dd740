//! Shared data models for datasource resolution
//!
//! These are plain value types: they hold no backend handles, so every record
//! produced by a resolution call can be cloned, compared, and serialized
//! freely after the call returns.
//!
//! - [`DataSourceRecord`] - identity of a datasource (name, kind, access record)
//! - [`EnrichedDataSourceRecord`] - a record plus the context it was found in
//! - [`ShapeDim`] - one slot of a datasource shape
//! - [`DataSourceKind`] / [`StrategyMode`] - the known wire vocabularies

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::{DATASOURCES_PREFIX, ERROR_SENTINEL};
use crate::core::ResolverError;

/// Minimal identity of a datasource.
///
/// Every field is optional: anonymous datasources carry only a kind, and
/// computed datasources carry no access record. Records are immutable once
/// built; use [`DataSourceRecord::derive`] to start a new record from an
/// existing one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DataSourceRecord {
    name: Option<String>,
    kind: Option<String>,
    record: Option<String>,
}

impl DataSourceRecord {
    /// Create a record, normalizing blank strings to `None`.
    pub fn new(
        name: Option<impl Into<String>>,
        kind: Option<impl Into<String>>,
        record: Option<impl Into<String>>,
    ) -> Self {
        Self {
            name: non_blank(name.map(Into::into)),
            kind: non_blank(kind.map(Into::into)),
            record: non_blank(record.map(Into::into)),
        }
    }

    /// In-band error record for a reference to an unavailable datasource.
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self::new(Some(name), Some(ERROR_SENTINEL), Some(ERROR_SENTINEL))
    }

    /// Start a new record from this one, replacing the name.
    ///
    /// Kind and access record are carried over unchanged.
    #[must_use]
    pub fn derive(&self, name: Option<impl Into<String>>) -> Self {
        Self {
            name: non_blank(name.map(Into::into)),
            kind: self.kind.clone(),
            record: self.record.clone(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    pub fn record(&self) -> Option<&str> {
        self.record.as_deref()
    }

    /// Parsed kind, if any.
    pub fn parsed_kind(&self) -> Option<DataSourceKind> {
        self.kind.as_deref().map(DataSourceKind::parse)
    }

    /// Whether this is the error record produced for an unresolvable reference.
    pub fn is_unresolved(&self) -> bool {
        self.kind.as_deref() == Some(ERROR_SENTINEL) && self.record.as_deref() == Some(ERROR_SENTINEL)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// A [`DataSourceRecord`] together with the component context it was found in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichedDataSourceRecord {
    source: DataSourceRecord,
    strategy: Option<String>,
    value_type: Option<String>,
    shape: Option<Vec<ShapeDim>>,
}

impl EnrichedDataSourceRecord {
    pub fn new(
        source: DataSourceRecord,
        strategy: Option<String>,
        value_type: Option<String>,
        shape: Option<Vec<ShapeDim>>,
    ) -> Self {
        Self {
            source,
            strategy: non_blank(strategy),
            value_type: non_blank(value_type),
            shape,
        }
    }

    pub fn source(&self) -> &DataSourceRecord {
        &self.source
    }

    pub fn name(&self) -> Option<&str> {
        self.source.name()
    }

    pub fn kind(&self) -> Option<&str> {
        self.source.kind()
    }

    pub fn record(&self) -> Option<&str> {
        self.source.record()
    }

    pub fn strategy(&self) -> Option<&str> {
        self.strategy.as_deref()
    }

    pub fn value_type(&self) -> Option<&str> {
        self.value_type.as_deref()
    }

    pub fn shape(&self) -> Option<&[ShapeDim]> {
        self.shape.as_deref()
    }
}

/// One slot of a datasource shape.
///
/// Serializes as a JSON number, a string, the literal token
/// `"$datasources.<name>"`, or `null` respectively.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShapeDim {
    /// Fixed extent.
    Literal(i64),
    /// Free text that did not parse as an integer.
    Text(String),
    /// Extent given by another datasource, kept as a textual pointer.
    Reference(String),
    /// Slot never supplied.
    Unknown,
}

impl ShapeDim {
    /// The `$datasources.<name>` token a reference stands for.
    pub fn reference_token(name: &str) -> String {
        format!("{DATASOURCES_PREFIX}{name}")
    }
}

impl fmt::Display for ShapeDim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeDim::Literal(n) => write!(f, "{n}"),
            ShapeDim::Text(text) => write!(f, "{text}"),
            ShapeDim::Reference(name) => write!(f, "{}", Self::reference_token(name)),
            ShapeDim::Unknown => write!(f, "None"),
        }
    }
}

impl Serialize for ShapeDim {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ShapeDim::Literal(n) => serializer.serialize_i64(*n),
            ShapeDim::Text(text) => serializer.serialize_str(text),
            ShapeDim::Reference(name) => serializer.serialize_str(&Self::reference_token(name)),
            ShapeDim::Unknown => serializer.serialize_none(),
        }
    }
}

/// Known datasource kinds.
///
/// Unrecognized kinds are preserved in [`DataSourceKind::Other`] so future
/// kinds pass through resolution untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataSourceKind {
    /// Hardware attribute read through a Tango device.
    Tango,
    /// Value supplied by the client at run time.
    Client,
    /// Database query.
    Db,
    /// Computed by a script over other datasources.
    PyEval,
    Other(String),
}

impl DataSourceKind {
    /// Parse a `type` attribute value. Never fails.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "TANGO" => DataSourceKind::Tango,
            "CLIENT" => DataSourceKind::Client,
            "DB" => DataSourceKind::Db,
            "PYEVAL" => DataSourceKind::PyEval,
            _ => DataSourceKind::Other(value.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DataSourceKind::Tango => "TANGO",
            DataSourceKind::Client => "CLIENT",
            DataSourceKind::Db => "DB",
            DataSourceKind::PyEval => "PYEVAL",
            DataSourceKind::Other(kind) => kind,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, DataSourceKind::PyEval)
    }
}

impl fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When during a scan a datasource is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyMode {
    /// Configuration time only.
    Config,
    /// Once, before the first step.
    Init,
    /// Every step.
    Step,
    /// Once, after the last step.
    Final,
}

impl StrategyMode {
    pub const ALL: [StrategyMode; 4] =
        [StrategyMode::Config, StrategyMode::Init, StrategyMode::Step, StrategyMode::Final];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyMode::Config => "CONFIG",
            StrategyMode::Init => "INIT",
            StrategyMode::Step => "STEP",
            StrategyMode::Final => "FINAL",
        }
    }
}

impl fmt::Display for StrategyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyMode {
    type Err = ResolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CONFIG" => Ok(StrategyMode::Config),
            "INIT" => Ok(StrategyMode::Init),
            "STEP" => Ok(StrategyMode::Step),
            "FINAL" => Ok(StrategyMode::Final),
            _ => Err(ResolverError::InvalidStrategy {
                mode: s.to_string(),
            }),
        }
    }
}
