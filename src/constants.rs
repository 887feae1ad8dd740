//! Global constants used throughout the nxsds codebase.
//!
//! Reserved names, template token prefixes, and recursion limits shared by the
//! resolver, the backends, and the output renderers. Defining them centrally
//! keeps the wire strings in one place.

/// Sentinel stored in both `kind` and `record` of a datasource whose
/// `$datasources.NAME` reference points at an unavailable name.
pub const ERROR_SENTINEL: &str = "__ERROR__";

/// Prefix for names synthesized for anonymous datasources.
///
/// The registry appends a counter starting at [`FIRST_SYNTHESIZED_INDEX`].
pub const UNNAMED_PREFIX: &str = "__unnamed__";

/// First counter value used when synthesizing a datasource name.
pub const FIRST_SYNTHESIZED_INDEX: usize = 1;

/// Name used in a dimension reference when the nested datasource has no name.
pub const UNNAMED_REFERENCE: &str = "__unnamed__";

/// Template prefix introducing a datasource reference in document text.
pub const DATASOURCES_PREFIX: &str = "$datasources.";

/// Template prefix introducing a component dependency in document text.
pub const COMPONENTS_PREFIX: &str = "$components.";

/// Template prefix introducing a backend-side variable in document text.
pub const VARIABLES_PREFIX: &str = "$var.";

/// Default Tango database port used when a device names a host but no port.
pub const DEFAULT_TANGO_PORT: &str = "10000";

/// Largest `dimensions` rank accepted; NeXus datasets have at most 32 dimensions.
pub const MAX_RANK: usize = 32;

/// Maximum nesting of computed-datasource sub-reference expansion.
///
/// Expansion also keeps a visited set, so this only bounds long acyclic chains.
pub const MAX_EXPANSION_DEPTH: usize = 16;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "NXSDS_CONFIG";
