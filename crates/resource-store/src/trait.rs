//! ResourceStore trait for mocking
//!
//! This trait abstracts the remote resource store (the Kubernetes API) so the
//! operand engine can be unit tested against an in-memory implementation.

use kube::api::DynamicObject;
use kube::discovery::ApiResource;

use crate::error::StoreError;
use crate::key::ResourceKey;

/// Trait for remote resource store operations
///
/// Objects travel as `DynamicObject`; callers convert to and from typed
/// resources. All async methods must be `Send` to work with Tokio's
/// work-stealing runtime.
#[async_trait::async_trait]
pub trait ResourceStoreTrait: Send + Sync {
    /// Fetch an object. Absence is reported as `StoreError::NotFound`.
    async fn get(&self, key: &ResourceKey) -> Result<DynamicObject, StoreError>;

    /// Create an object; fails with `AlreadyExists` if the name is taken.
    async fn create(&self, resource: &ApiResource, obj: &DynamicObject) -> Result<DynamicObject, StoreError>;

    /// Replace an object. A non-empty, stale `resourceVersion` fails with `Conflict`.
    async fn update(&self, resource: &ApiResource, obj: &DynamicObject) -> Result<DynamicObject, StoreError>;

    /// Apply a JSON merge patch (RFC 7386) to an object.
    async fn patch(&self, key: &ResourceKey, patch: &serde_json::Value) -> Result<DynamicObject, StoreError>;

    /// Delete an object.
    async fn delete(&self, key: &ResourceKey) -> Result<(), StoreError>;

    /// List objects of one kind, optionally restricted to a namespace.
    async fn list(&self, resource: &ApiResource, namespace: Option<&str>) -> Result<Vec<DynamicObject>, StoreError>;
}
