//! Error types for the docsight library.
//!
//! All fallible operations in the crate return [`DocsightError`]. The analysis
//! cores themselves ([`crate::analyzers::TabularProfiler::profile`] and
//! [`crate::structure::StructureExtractor::extract`]) are total over their inputs;
//! errors originate in ingestion, persistence, embedding and orchestration.

use thiserror::Error;

/// The main error type for the docsight library.
#[derive(Error, Debug)]
pub enum DocsightError {
    /// The caller passed a file type or extension that no parser handles.
    #[error("Unsupported file type: {file_type}")]
    UnsupportedFormat {
        /// MIME type or extension that was rejected
        file_type: String,
        /// Optional guidance for the user (e.g. "save as .docx")
        hint: Option<String>,
    },

    /// Input was present but carried nothing to analyze.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// A parser failed on otherwise supported input.
    #[error("Failed to parse {format}: {message}")]
    Parse {
        /// Format being parsed (e.g. "CSV", "DOCX")
        format: String,
        /// Detailed error message
        message: String,
    },

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Error related to configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The embedding provider failed.
    #[error("Embedding error: {message}")]
    Embedding {
        /// Detailed error message
        message: String,
        /// Whether a later attempt may succeed
        retryable: bool,
    },

    /// The blob store or record repository failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A stored blob or record does not exist.
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// Kind of object ("blob", "data file", "document")
        kind: String,
        /// Identifier that was looked up
        id: String,
    },

    /// The caller does not own the requested record.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, DocsightError>`.
pub type Result<T> = std::result::Result<T, DocsightError>;

impl DocsightError {
    /// Creates an unsupported format error.
    pub fn unsupported(file_type: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            file_type: file_type.into(),
            hint: None,
        }
    }

    /// Creates an unsupported format error carrying a hint for the user.
    pub fn unsupported_with_hint(file_type: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            file_type: file_type.into(),
            hint: Some(hint.into()),
        }
    }

    /// Creates a parse error for the given format.
    pub fn parse(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Creates a non-retryable embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates an embedding error that may succeed on retry.
    pub fn embedding_transient(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates a not-found error.
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Returns true if this error is transient and the operation should be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            DocsightError::Embedding { retryable, .. } => *retryable,
            DocsightError::Io(_) | DocsightError::Storage(_) => true,
            _ => false,
        }
    }

    /// Message suitable for the `errorMessage` field of a failed upload record.
    pub fn user_message(&self) -> String {
        match self {
            DocsightError::UnsupportedFormat {
                hint: Some(hint), ..
            } => hint.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for DocsightError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<csv::Error> for DocsightError {
    fn from(err: csv::Error) -> Self {
        Self::parse("CSV", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DocsightError::unsupported("application/zip");
        assert_eq!(err.to_string(), "Unsupported file type: application/zip");

        let err = DocsightError::not_found("blob", "abc");
        assert_eq!(err.to_string(), "blob 'abc' not found");

        let err = DocsightError::parse("CSV", "bad quote");
        assert_eq!(err.to_string(), "Failed to parse CSV: bad quote");
    }

    #[test]
    fn test_retryable() {
        assert!(DocsightError::embedding_transient("503").is_retryable());
        assert!(!DocsightError::embedding("401").is_retryable());
        assert!(DocsightError::storage("timeout").is_retryable());
        assert!(!DocsightError::unsupported("x").is_retryable());
    }

    #[test]
    fn test_user_message_prefers_hint() {
        let err = DocsightError::unsupported_with_hint("application/msword", "save as .docx");
        assert_eq!(err.user_message(), "save as .docx");

        let err = DocsightError::EmptyInput("no bytes".to_string());
        assert_eq!(err.user_message(), "Empty input: no bytes");
    }

    #[test]
    fn test_from_serde_json() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: DocsightError = parse_err.into();
        assert!(matches!(err, DocsightError::Serialization(_)));
    }
}
