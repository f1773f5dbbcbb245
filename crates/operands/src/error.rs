//! Operand engine error types.

use resource_store::StoreError;
use thiserror::Error;

/// Errors that can occur while converging an operand.
#[derive(Debug, Error)]
pub enum OperandError {
    /// Remote store call failed (network, auth, conflict, ...)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The store returned an object of a different kind than the hooks declare
    #[error("Kind mismatch: expected {expected}, store returned {found}")]
    KindMismatch { expected: String, found: String },

    /// Hooks broke their contract (programming error, not transient)
    #[error("Contract violation: {0}")]
    Contract(String),

    /// A prerequisite for building the desired object is missing (e.g. an image reference)
    #[error("Missing prerequisite: {0}")]
    MissingPrerequisite(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The request was cancelled while a store call was pending
    #[error("Operation cancelled")]
    Cancelled,

    /// Uninstall refused because workloads still exist
    #[error("Uninstall blocked: {0}")]
    UninstallBlocked(String),

    /// Invalid operator configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Metrics registration failed
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl OperandError {
    /// True if the underlying store error is "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, OperandError::Store(e) if e.is_not_found())
    }
}
