//! Generic TOML parsing with file path context.

use std::io::ErrorKind;
use std::path::Path;

use crate::core::ResolverError;

/// Parse a TOML configuration file into `T`.
///
/// A missing file is [`ResolverError::ConfigNotFound`]; any other read or
/// deserialization failure is [`ResolverError::ConfigParseError`] carrying
/// the path.
///
/// ```rust,no_run
/// use nxsds_cli::config::{Config, parse_config};
/// use std::path::Path;
///
/// # fn example() -> Result<(), nxsds_cli::core::ResolverError> {
/// let config: Config = parse_config(Path::new("nxsds.toml"))?;
/// println!("expand scripts: {}", config.resolver.expand_scripts);
/// # Ok(())
/// # }
/// ```
pub fn parse_config<T>(path: &Path) -> Result<T, ResolverError>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ResolverError::ConfigNotFound {
            path: path.display().to_string(),
        },
        _ => ResolverError::ConfigParseError {
            path: path.display().to_string(),
            reason: e.to_string(),
        },
    })?;

    toml::from_str(&content).map_err(|e| ResolverError::ConfigParseError {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
