//! Resource store errors

use thiserror::Error;

/// Errors that can occur when talking to the remote resource store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Kubernetes client error that does not map to a more specific variant
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// Object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Create of an object that already exists
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Optimistic concurrency failure (stale resourceVersion)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The store refused the request (validation, admission, auth)
    #[error("Rejected: {0}")]
    Rejected(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// True for the expected "object is absent" condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// Maps a kube API error onto the store taxonomy.
    pub(crate) fn from_kube(err: kube::Error, what: &str) -> Self {
        match err {
            kube::Error::Api(ref resp) if resp.code == 404 => StoreError::NotFound(what.to_string()),
            kube::Error::Api(ref resp) if resp.code == 409 && resp.reason == "AlreadyExists" => {
                StoreError::AlreadyExists(what.to_string())
            }
            kube::Error::Api(ref resp) if resp.code == 409 => {
                StoreError::Conflict(format!("{what}: {}", resp.message))
            }
            other => StoreError::Kube(other),
        }
    }
}
