//! Error handling for nxsds
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** in the library ([`BackendError`], [`ResolverError`])
//! 2. **User-friendly messages** with actionable suggestions for CLI users ([`ErrorContext`])
//!
//! Failures that are part of normal resolution (an unresolvable
//! `$datasources.NAME` reference, a single datasource that cannot be fetched,
//! malformed dimensions) are reported in-band or degrade silently; they never
//! surface as these errors. Only bulk backend fetches, unparsable component
//! documents, and invalid caller input do.
//!
//! # Examples
//!
//! ```rust,no_run
//! use nxsds_cli::core::{ResolverError, user_friendly_error};
//!
//! let error = ResolverError::InvalidVariables {
//!     reason: "expected a JSON object".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Failures reported by a configuration backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// A component or datasource name the backend does not know.
    #[error("{kind} '{name}' not found in configuration backend")]
    NotFound {
        /// `"component"` or `"datasource"`
        kind: String,
        name: String,
    },

    /// A `$var.NAME` token without a value or default.
    #[error("Variable '{name}' is not set (required by component '{component}')")]
    UnresolvedVariable { name: String, component: String },

    /// A filesystem failure in a file-backed store.
    #[error("Failed to {operation} '{path}': {reason}")]
    Io {
        operation: String,
        path: String,
        reason: String,
    },

    /// The backend refused or failed an operation.
    #[error("Backend operation '{operation}' failed: {reason}")]
    Unavailable { operation: String, reason: String },
}

/// Failures of a resolution call or of the surrounding tooling.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    /// A bulk backend call failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A component document is not well-formed XML.
    #[error("Invalid XML in {document}: {reason}")]
    InvalidXml { document: String, reason: String },

    /// Caller-supplied variables are not a JSON object.
    #[error("Invalid variables: {reason}")]
    InvalidVariables { reason: String },

    /// The backend answered a bulk fetch with the wrong number of documents.
    #[error("Backend returned {actual} documents for {expected} names in '{operation}'")]
    DocumentCountMismatch {
        operation: String,
        expected: usize,
        actual: usize,
    },

    /// A strategy filter outside the known vocabulary.
    #[error("Invalid strategy mode: {mode}")]
    InvalidStrategy { mode: String },

    /// An explicitly requested configuration file is missing.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// A configuration file could not be parsed.
    #[error("Failed to parse configuration file {path}: {reason}")]
    ConfigParseError { path: String, reason: String },

    /// No backend location was configured.
    #[error("No configuration backend specified")]
    BackendNotConfigured,

    #[error("{message}")]
    Other { message: String },
}

/// Error context wrapper that adds a suggestion and details for CLI display.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ResolverError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(error: ResolverError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with suggestions where the
/// failure is recognized.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(resolver_error) = error.downcast_ref::<ResolverError>() {
        return create_error_context(resolver_error.clone());
    }

    if let Some(backend_error) = error.downcast_ref::<BackendError>() {
        return create_error_context(ResolverError::Backend(backend_error.clone()));
    }

    if let Some(json_error) = error.downcast_ref::<serde_json::Error>() {
        return ErrorContext::new(ResolverError::InvalidVariables {
            reason: json_error.to_string(),
        })
        .with_suggestion("Pass variables as a JSON object, e.g. --variables '{\"sample\": \"Si\"}'");
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>()
        && io_error.kind() == std::io::ErrorKind::PermissionDenied
    {
        return ErrorContext::new(ResolverError::Other {
            message: io_error.to_string(),
        })
        .with_suggestion("Check the permissions of the backend directory and configuration file");
    }

    // Generic error - include the full error chain for better diagnostics
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(ResolverError::Other {
        message,
    })
}

fn create_error_context(error: ResolverError) -> ErrorContext {
    match &error {
        ResolverError::Backend(BackendError::NotFound { kind, name }) => {
            let suggestion = format!(
                "Check that the {kind} '{name}' exists in the backend. Run 'nxsds available {kind}s' to list known names"
            );
            ErrorContext::new(error).with_suggestion(suggestion).with_details(
                "A component in the dependency closure refers to a definition the backend cannot provide",
            )
        }

        ResolverError::Backend(BackendError::UnresolvedVariable { name, .. }) => {
            let suggestion = format!(
                "Supply the variable with --variables '{{\"{name}\": ...}}' or give the token a default ($var.{name}#'value')"
            );
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        ResolverError::InvalidXml { .. } => ErrorContext::new(error)
            .with_suggestion("Validate the component document with an XML linter")
            .with_details("Component documents must be well-formed XML with a <definition> root"),

        ResolverError::InvalidStrategy { .. } => ErrorContext::new(error)
            .with_suggestion("Use one of: CONFIG, INIT, STEP, FINAL"),

        ResolverError::ConfigNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Create the file or drop --config / NXSDS_CONFIG to use the defaults"),

        ResolverError::ConfigParseError { .. } => ErrorContext::new(error)
            .with_suggestion("Check the TOML syntax. Verify quotes, brackets, and table names"),

        ResolverError::BackendNotConfigured => ErrorContext::new(error)
            .with_suggestion("Pass --backend-dir or set [backend] directory in the configuration file"),

        _ => ErrorContext::new(error),
    }
}
