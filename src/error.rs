//! Structured error types for model loading, selection, and sync.

use serde::Serialize;
use std::path::PathBuf;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Lookup errors
    NotFound,
    FieldNotFound,
    AmbiguousSelection,

    // Definition errors
    MalformedDefinition,
    InvalidDeltaPath,

    // Sync errors
    ConsistencyViolation,

    // Request errors
    InvalidArgument,

    // Boundary errors
    ExternalService,
    IoError,
    SerializationError,
}

/// Errors raised by the model library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A requested index or doc-type is not part of the loaded models.
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    /// A dotted property path does not resolve inside a mapping.
    #[error("Property not found in mapping: {path}")]
    FieldNotFound { path: String },

    /// Field selection did not narrow down to exactly one property.
    #[error("{}", ambiguous_message(.field, .candidates))]
    AmbiguousSelection {
        field: String,
        candidates: Vec<String>,
    },

    /// A definition document failed to parse or lacks required keys.
    #[error("Malformed definition {}: {}", .path.display(), .reason)]
    MalformedDefinition { path: PathBuf, reason: String },

    /// Dotted and nested settings keys disagree on whether a path holds a
    /// value or a section.
    #[error("Conflicting settings key '{key}': {reason}")]
    SettingsConflict { key: String, reason: String },

    /// A delta path could not be parsed or applied.
    #[error("Invalid delta path '{path}': {reason}")]
    DeltaPath { path: String, reason: String },

    /// Applying the computed delta to the canonical mapping did not reproduce
    /// the previous mapping.
    #[error("Delta round trip failed for {index}/{doc_type}; refusing to write")]
    ConsistencyViolation { index: String, doc_type: String },

    /// A caller-supplied request is inconsistent (e.g. mismatched index and
    /// alias lists).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The document-index service failed or returned an unexpected response.
    #[error("Index service error: {0}")]
    ExternalService(String),

    #[error("I/O error on {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn ambiguous_message(field: &str, candidates: &[String]) -> String {
    if candidates.is_empty() {
        format!("No property named '{}' matched the selection", field)
    } else {
        format!(
            "Property '{}' matched {} paths: {}",
            field,
            candidates.len(),
            candidates.join(", ")
        )
    }
}

impl Error {
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::NotFound { .. } => ErrorCode::NotFound,
            Error::FieldNotFound { .. } => ErrorCode::FieldNotFound,
            Error::AmbiguousSelection { .. } => ErrorCode::AmbiguousSelection,
            Error::MalformedDefinition { .. } | Error::SettingsConflict { .. } => {
                ErrorCode::MalformedDefinition
            }
            Error::DeltaPath { .. } => ErrorCode::InvalidDeltaPath,
            Error::ConsistencyViolation { .. } => ErrorCode::ConsistencyViolation,
            Error::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Error::ExternalService(_) => ErrorCode::ExternalService,
            Error::Io { .. } => ErrorCode::IoError,
            Error::Yaml(_) | Error::Json(_) => ErrorCode::SerializationError,
        }
    }

    // Convenience constructors

    pub fn index_not_found(index: &str) -> Self {
        Error::NotFound {
            kind: "Index",
            name: index.to_string(),
        }
    }

    pub fn doc_type_not_found(index: &str, doc_type: &str) -> Self {
        Error::NotFound {
            kind: "Doc-type",
            name: format!("{}/{}", index, doc_type),
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::MalformedDefinition {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the failure only concerns a single index or doc-type and the
    /// caller may skip it and continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::NotFound { .. } | Error::MalformedDefinition { .. }
        )
    }
}

/// Result type for library operations.
pub type Result<T> = std::result::Result<T, Error>;
