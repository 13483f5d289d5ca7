//! Error types for vaultsync
//!
//! This module defines the error taxonomy shared by the backup store, the
//! primary store clients and the reconciler. We use `thiserror` for automatic
//! `Display` and `Error` trait implementations.
//!
//! Callers branch on [`Error::kind`] rather than on message text: a missing
//! backup table or collection is [`ErrorKind::NotFound`], never a substring
//! of some driver message.

use thiserror::Error;

/// Result type alias for vaultsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A table or collection does not exist. Has a defined fallback.
    NotFound,
    /// Network, HTTP or database I/O failure. Safe to retry next tick.
    Transient,
    /// A stored or fetched payload could not be parsed.
    Malformed,
    /// A bulk upsert or bulk add was rejected as a whole.
    PartialWrite,
    /// Invalid configuration.
    Config,
}

impl ErrorKind {
    /// Stable lowercase name, used in log fields
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Transient => "transient",
            ErrorKind::Malformed => "malformed",
            ErrorKind::PartialWrite => "partial_write",
            ErrorKind::Config => "config",
        }
    }
}

/// Error types for vaultsync
#[derive(Debug, Error)]
pub enum Error {
    /// Backup table or primary collection is absent
    #[error("Not found: {resource}")]
    NotFound {
        /// Human-readable resource description (e.g. "backup table 'chroma_data'")
        resource: String,
    },

    /// I/O failure talking to either store
    #[error("Transient error: {message}")]
    Transient {
        /// Underlying failure description
        message: String,
    },

    /// Payload could not be parsed
    #[error("Malformed record '{id}': {reason}")]
    Malformed {
        /// Record id, or a placeholder when the id itself is unknown
        id: String,
        /// Parser error
        reason: String,
    },

    /// Bulk write reported failure
    #[error("Write rejected by {target}: {reason}")]
    WriteRejected {
        /// Which store rejected the batch
        target: String,
        /// Status / driver message
        reason: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong
        message: String,
    },
}

impl Error {
    /// Create a NotFound error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Error::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a Transient error
    pub fn transient(message: impl Into<String>) -> Self {
        Error::Transient {
            message: message.into(),
        }
    }

    /// Create a Malformed error for a given record id
    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Malformed {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a WriteRejected error
    pub fn write_rejected(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::WriteRejected {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Create a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Transient { .. } => ErrorKind::Transient,
            Error::Malformed { .. } => ErrorKind::Malformed,
            Error::WriteRejected { .. } => ErrorKind::PartialWrite,
            Error::Config { .. } => ErrorKind::Config,
        }
    }

    /// True for the missing-resource kind
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::malformed("<payload>", e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::transient(e.to_string())
    }
}
