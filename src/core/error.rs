//! Error handling for tenfold.
//!
//! Two layers, following the same split used throughout the crate's CLI
//! surface:
//! 1. [`TenfoldError`] - strongly-typed failures for precise handling in code
//! 2. [`ErrorContext`] - a wrapper that adds user-facing suggestions and
//!    details for terminal display
//!
//! Every failure that names a file carries the offending path so a re-run can
//! target just the failed set. There is no retry machinery: the whole
//! pipeline is idempotent and externally re-runnable.
//!
//! Use [`user_friendly_error`] at the top level to convert any error into a
//! displayable [`ErrorContext`] with contextual suggestions.

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for tenfold operations.
///
/// Each variant represents a specific failure mode and includes the context
/// (paths, environment names, reasons) needed to act on it.
#[derive(Error, Debug, Clone)]
pub enum TenfoldError {
    /// The tenant registry file could not be found.
    #[error("tenant registry not found: {path}")]
    RegistryNotFound {
        /// Path that was searched for the registry file
        path: String,
    },

    /// The tenant registry file exists but is not valid TOML.
    #[error("failed to parse tenant registry: {file}")]
    RegistryParseError {
        /// Path of the registry file
        file: String,
        /// Parser error message
        reason: String,
    },

    /// The tenant registry parsed but its contents are invalid.
    #[error("invalid tenant registry: {reason}")]
    RegistryValidationError {
        /// What the validation check found
        reason: String,
    },

    /// An environment directory was discovered on disk but has no registry
    /// entry. Fatal before any file processing for that environment.
    #[error("no registry entry for environment '{environment}'")]
    EnvironmentNotMapped {
        /// Name of the unmapped environment directory
        environment: String,
    },

    /// The master project subtree is missing under an environment directory.
    #[error("master project '{name}' not found under {path}")]
    MasterProjectNotFound {
        /// Configured master project name
        name: String,
        /// Environment directory that was searched
        path: String,
    },

    /// A structured schema document failed to parse. Fatal for the run.
    #[error("failed to parse schema document: {file}")]
    SchemaParseError {
        /// Path of the schema file
        file: String,
        /// Parser error message
        reason: String,
    },

    /// A file system operation failed.
    #[error("{operation} failed: {path}")]
    FileSystemError {
        /// The operation that failed (e.g. "create directory", "write")
        operation: String,
        /// The offending path
        path: String,
    },

    /// Catch-all for errors that don't fit a specific variant.
    #[error("{message}")]
    Other {
        /// Error description
        message: String,
    },
}

/// Wrapper adding user-facing context to a [`TenfoldError`].
///
/// Renders as a colored `error:` line on stderr, optionally followed by
/// `details:` and `suggestion:` lines.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying tenfold error
    pub error: TenfoldError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with no suggestion or details.
    #[must_use]
    pub const fn new(error: TenfoldError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Attach a resolution suggestion.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach additional details.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colors.
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

/// Convert any error into a user-friendly [`ErrorContext`].
///
/// Downcasts known error types ([`TenfoldError`], [`std::io::Error`],
/// [`toml::de::Error`]) and attaches targeted suggestions. Unknown errors are
/// rendered with their full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(tf_error) = error.downcast_ref::<TenfoldError>() {
        let mut ctx = create_error_context(tf_error.clone());
        // Outer context (tenant, category, file) is more specific than any
        // canned details.
        let outermost = error.to_string();
        if outermost != tf_error.to_string() {
            ctx.details = Some(outermost);
        }
        return ctx;
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(TenfoldError::FileSystemError {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check file ownership, or re-run with sufficient permissions")
                .with_details("tenfold does not have permission to read or write a file");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(TenfoldError::FileSystemError {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(TenfoldError::RegistryParseError {
            file: "tenfold.toml".to_string(),
            reason: toml_error.to_string(),
        })
        .with_suggestion(
            "Check the TOML syntax in tenfold.toml. Verify quotes, brackets, and table headers",
        );
    }

    // Generic error - include the full cause chain for diagnostics
    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(TenfoldError::Other { message })
}

fn create_error_context(error: TenfoldError) -> ErrorContext {
    match &error {
        TenfoldError::RegistryNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Run 'tenfold init' to create a starter tenfold.toml")
            .with_details("tenfold needs a registry mapping environment directories to tenants"),
        TenfoldError::EnvironmentNotMapped { environment } => {
            let env = environment.clone();
            ErrorContext::new(error)
                .with_suggestion(format!(
                    "Add an entry for '{env}' under [environments] in tenfold.toml"
                ))
                .with_details(
                    "Every discovered environment directory must have a registry mapping \
                     before any of its files are processed",
                )
        }
        TenfoldError::MasterProjectNotFound { name, .. } => {
            let name = name.clone();
            ErrorContext::new(error).with_suggestion(format!(
                "Check that the environment contains dbt_packages/{name}, or set \
                 master-project in tenfold.toml"
            ))
        }
        TenfoldError::SchemaParseError { .. } => ErrorContext::new(error)
            .with_suggestion("Fix the YAML syntax in the named file and re-run")
            .with_details("Schema documents must be valid YAML mappings"),
        TenfoldError::RegistryParseError { .. } | TenfoldError::RegistryValidationError { .. } => {
            ErrorContext::new(error)
                .with_suggestion("Check tenfold.toml against the format shown by 'tenfold init'")
        }
        _ => ErrorContext::new(error),
    }
}
