//! Structured error types with machine-readable codes
//!
//! Every fallible operation in the crate returns [`Result`] with a
//! [`MemoryError`] that carries enough context for a host service to map it
//! onto its own error surface (HTTP status, per-item batch manifest, etc.).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured error payload for host services and batch manifests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,
}

/// Error types for the memory core, categorized by failure class
#[derive(Debug)]
pub enum MemoryError {
    /// Referenced node or embedding record does not exist
    NotFound { kind: &'static str, id: String },

    /// Caller attempted to access a resource owned by a different user
    Authorization { owner_id: String, resource: String },

    /// Input outside its allowed domain (weights, limits, empty fusion input)
    Validation { field: String, reason: String },

    /// Vector lengths differ where exact equality is required
    DimensionMismatch { expected: usize, actual: usize },

    /// Per-owner ceiling exceeded (node count, batch size)
    ResourceLimit {
        resource: String,
        current: usize,
        limit: usize,
    },

    /// Generic wrapper for external errors
    Internal(anyhow::Error),
}

impl MemoryError {
    /// Shorthand for a validation failure
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a missing node
    pub fn node_not_found(id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind: "node",
            id: id.to_string(),
        }
    }

    /// Shorthand for a missing embedding record
    pub fn record_not_found(id: impl fmt::Display) -> Self {
        Self::NotFound {
            kind: "embedding",
            id: id.to_string(),
        }
    }

    /// Get error code for client identification
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Authorization { .. } => "AUTHORIZATION",
            Self::Validation { .. } => "VALIDATION",
            Self::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            Self::ResourceLimit { .. } => "RESOURCE_LIMIT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get detailed error message
    pub fn message(&self) -> String {
        match self {
            Self::NotFound { kind, id } => format!("{kind} not found: {id}"),
            Self::Authorization { owner_id, resource } => {
                format!("owner '{owner_id}' may not access {resource}")
            }
            Self::Validation { field, reason } => {
                format!("invalid input for field '{field}': {reason}")
            }
            Self::DimensionMismatch { expected, actual } => {
                format!("vector dimension mismatch: expected {expected}, got {actual}")
            }
            Self::ResourceLimit {
                resource,
                current,
                limit,
            } => {
                format!("resource limit exceeded for {resource}: current={current}, limit={limit}")
            }
            Self::Internal(err) => format!("internal error: {err}"),
        }
    }

    /// Convert to a serializable detail payload (batch manifests)
    pub fn to_detail(&self) -> ErrorDetail {
        ErrorDetail {
            code: self.code().to_string(),
            message: self.message(),
        }
    }
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for MemoryError {}

impl From<anyhow::Error> for MemoryError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

/// Type alias for Results using MemoryError
pub type Result<T> = std::result::Result<T, MemoryError>;
