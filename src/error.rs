//! Error types for kiln.
//!
//! One error enum carrying the handful of failure kinds the CLI reports:
//! validation, configuration, security, input, and operation/file-access
//! wrappers around lower-level failures. Constructors keep call sites short.

use thiserror::Error;

/// Top-level kiln error type.
#[derive(Error, Debug)]
pub enum Error {
    /// A field failed an input validation rule.
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// A configuration problem, with a remediation suggestion.
    #[error("configuration error: {issue} ({suggestion})")]
    Config { issue: String, suggestion: String },

    /// Access denied, decryption refused, or key misuse. Never carries
    /// underlying cryptographic detail.
    #[error("security error: {issue} ({suggestion})")]
    Security { issue: String, suggestion: String },

    /// Ill-formed user-supplied datum (JSON, recipient spec, template).
    #[error("invalid input '{input}': {issue} ({suggestion})")]
    Input {
        input: String,
        issue: String,
        suggestion: String,
    },

    /// A lower-level library failure, tagged with operation and resource.
    #[error("{operation} {resource}: {source}")]
    Operation {
        operation: String,
        resource: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Filesystem interaction failure.
    #[error("{operation} file '{path}': {source}")]
    FileAccess {
        operation: String,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A requested variable is absent from the decrypted file.
    #[error("variable '{name}' not found in '{file}'")]
    VariableNotFound { name: String, file: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Error for invalid input validation.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Error for configuration problems with a suggested fix.
    pub fn config(issue: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Config {
            issue: issue.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Error for security-related issues.
    pub fn security(issue: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Security {
            issue: issue.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Error for invalid input with specific guidance.
    pub fn input(
        input: impl Into<String>,
        issue: impl Into<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Input {
            input: input.into(),
            issue: issue.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Error for a failed operation on a resource.
    pub fn operation(
        operation: impl Into<String>,
        resource: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Operation {
            operation: operation.into(),
            resource: resource.into(),
            source: Box::new(source),
        }
    }

    /// Error for file access issues.
    pub fn file_access(
        operation: impl Into<String>,
        path: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::FileAccess {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for kiln operations.
pub type Result<T> = std::result::Result<T, Error>;
