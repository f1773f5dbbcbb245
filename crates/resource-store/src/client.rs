//! Kubernetes-backed resource store

use kube::api::{Api, DeleteParams, DynamicObject, ListParams, Patch, PatchParams, PostParams};
use kube::discovery::ApiResource;
use kube::{Client, ResourceExt};
use tracing::debug;

use crate::error::StoreError;
use crate::key::ResourceKey;
use crate::store_trait::ResourceStoreTrait;

/// Field manager recorded on every write
pub const FIELD_MANAGER: &str = "virtops-operator";

/// Resource store talking to the Kubernetes API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl std::fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore").finish_non_exhaustive()
    }
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, resource: &ApiResource, namespace: Option<&str>) -> Api<DynamicObject> {
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, resource),
            None => Api::all_with(self.client.clone(), resource),
        }
    }
}

#[async_trait::async_trait]
impl ResourceStoreTrait for KubeStore {
    async fn get(&self, key: &ResourceKey) -> Result<DynamicObject, StoreError> {
        debug!("GET {}", key);
        self.api(&key.resource, key.namespace.as_deref())
            .get(&key.name)
            .await
            .map_err(|e| StoreError::from_kube(e, &key.to_string()))
    }

    async fn create(&self, resource: &ApiResource, obj: &DynamicObject) -> Result<DynamicObject, StoreError> {
        let key = ResourceKey::of_dynamic(resource, obj);
        debug!("CREATE {}", key);
        let pp = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        self.api(resource, obj.namespace().as_deref())
            .create(&pp, obj)
            .await
            .map_err(|e| StoreError::from_kube(e, &key.to_string()))
    }

    async fn update(&self, resource: &ApiResource, obj: &DynamicObject) -> Result<DynamicObject, StoreError> {
        let key = ResourceKey::of_dynamic(resource, obj);
        debug!("UPDATE {}", key);
        let pp = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        self.api(resource, obj.namespace().as_deref())
            .replace(&key.name, &pp, obj)
            .await
            .map_err(|e| StoreError::from_kube(e, &key.to_string()))
    }

    async fn patch(&self, key: &ResourceKey, patch: &serde_json::Value) -> Result<DynamicObject, StoreError> {
        debug!("PATCH {}", key);
        let pp = PatchParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        self.api(&key.resource, key.namespace.as_deref())
            .patch(&key.name, &pp, &Patch::Merge(patch))
            .await
            .map_err(|e| StoreError::from_kube(e, &key.to_string()))
    }

    async fn delete(&self, key: &ResourceKey) -> Result<(), StoreError> {
        debug!("DELETE {}", key);
        self.api(&key.resource, key.namespace.as_deref())
            .delete(&key.name, &DeleteParams::background())
            .await
            .map(|_| ())
            .map_err(|e| StoreError::from_kube(e, &key.to_string()))
    }

    async fn list(&self, resource: &ApiResource, namespace: Option<&str>) -> Result<Vec<DynamicObject>, StoreError> {
        debug!("LIST {} in {}", resource.kind, namespace.unwrap_or("all namespaces"));
        self.api(resource, namespace)
            .list(&ListParams::default())
            .await
            .map(|list| list.items)
            .map_err(|e| StoreError::from_kube(e, &resource.kind))
    }
}
