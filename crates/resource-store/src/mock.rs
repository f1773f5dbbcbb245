//! Mock resource store for unit testing
//!
//! This module provides an in-memory implementation of `ResourceStoreTrait`
//! that behaves like a small API server: it assigns uids and resource
//! versions, rejects stale updates, records every call and can be told to
//! fail or stall the next call of a given kind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use kube::api::DynamicObject;
use kube::core::TypeMeta;
use kube::discovery::ApiResource;
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::key::ResourceKey;
use crate::store_trait::ResourceStoreTrait;

type ObjectId = (String, String, String, String);

/// Store operation kinds, used for call accounting and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Get,
    Create,
    Update,
    Patch,
    Delete,
    List,
}

/// One recorded call against the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub op: StoreOp,
    /// `Kind namespace/name`, or just the kind for list calls
    pub target: String,
}

/// Mock resource store for testing
#[derive(Clone, Default)]
pub struct MockResourceStore {
    objects: Arc<Mutex<HashMap<ObjectId, DynamicObject>>>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    failures: Arc<Mutex<HashMap<StoreOp, StoreError>>>,
    stalled: Arc<Mutex<Vec<StoreOp>>>,
    // Counter for generating resource versions
    next_version: Arc<Mutex<u64>>,
}

impl std::fmt::Debug for MockResourceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockResourceStore")
            .field("objects", &self.objects.lock().unwrap().len())
            .finish_non_exhaustive()
    }
}

impl MockResourceStore {
    /// Create an empty mock store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object (for test setup). Keeps a uid already present on the
    /// object, otherwise generates one.
    pub fn insert(&self, resource: &ApiResource, obj: DynamicObject) -> DynamicObject {
        let mut obj = with_types(resource, obj);
        if obj.metadata.uid.is_none() {
            obj.metadata.uid = Some(uuid::Uuid::new_v4().to_string());
        }
        obj.metadata.resource_version = Some(self.next_version());
        obj.metadata.generation = Some(obj.metadata.generation.unwrap_or(1));
        let key = ResourceKey::of_dynamic(resource, &obj);
        self.objects.lock().unwrap().insert(key.id(), obj.clone());
        obj
    }

    /// Fetch an object without recording a call (for assertions)
    pub fn peek(&self, key: &ResourceKey) -> Option<DynamicObject> {
        self.objects.lock().unwrap().get(&key.id()).cloned()
    }

    /// Whether an object exists (for assertions)
    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.objects.lock().unwrap().contains_key(&key.id())
    }

    /// Make the next call of `op` fail with `err`
    pub fn fail_next(&self, op: StoreOp, err: StoreError) {
        self.failures.lock().unwrap().insert(op, err);
    }

    /// Make every call of `op` hang until the caller gives up
    pub fn stall(&self, op: StoreOp) {
        self.stalled.lock().unwrap().push(op);
    }

    /// All calls recorded so far
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls of one kind
    pub fn count(&self, op: StoreOp) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.op == op).count()
    }

    /// Number of recorded mutating calls (create, update, patch, delete)
    pub fn mutations(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| !matches!(c.op, StoreOp::Get | StoreOp::List))
            .count()
    }

    /// Forget recorded calls
    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn next_version(&self) -> String {
        let mut v = self.next_version.lock().unwrap();
        *v += 1;
        v.to_string()
    }

    async fn enter(&self, op: StoreOp, target: String) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(StoreCall { op, target });
        let stalled = self.stalled.lock().unwrap().contains(&op);
        if stalled {
            std::future::pending::<()>().await;
        }
        match self.failures.lock().unwrap().remove(&op) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl ResourceStoreTrait for MockResourceStore {
    async fn get(&self, key: &ResourceKey) -> Result<DynamicObject, StoreError> {
        self.enter(StoreOp::Get, key.to_string()).await?;
        self.peek(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn create(&self, resource: &ApiResource, obj: &DynamicObject) -> Result<DynamicObject, StoreError> {
        let key = ResourceKey::of_dynamic(resource, obj);
        self.enter(StoreOp::Create, key.to_string()).await?;
        if key.name.is_empty() {
            return Err(StoreError::Rejected(format!("{}: name is required", resource.kind)));
        }
        if self.contains(&key) {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        let mut created = with_types(resource, obj.clone());
        created.metadata.uid = Some(uuid::Uuid::new_v4().to_string());
        created.metadata.resource_version = Some(self.next_version());
        created.metadata.generation = Some(1);
        self.objects.lock().unwrap().insert(key.id(), created.clone());
        Ok(created)
    }

    async fn update(&self, resource: &ApiResource, obj: &DynamicObject) -> Result<DynamicObject, StoreError> {
        let key = ResourceKey::of_dynamic(resource, obj);
        self.enter(StoreOp::Update, key.to_string()).await?;
        let existing = self
            .peek(&key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        if let Some(rv) = obj.metadata.resource_version.as_deref().filter(|rv| !rv.is_empty()) {
            if existing.metadata.resource_version.as_deref() != Some(rv) {
                return Err(StoreError::Conflict(format!(
                    "{key}: the object has been modified; please apply your changes to the latest version"
                )));
            }
        }
        if let Some(uid) = obj.metadata.uid.as_deref() {
            if existing.metadata.uid.as_deref() != Some(uid) {
                return Err(StoreError::Conflict(format!("{key}: uid precondition failed")));
            }
        }

        let mut updated = with_types(resource, obj.clone());
        updated.metadata.uid = existing.metadata.uid.clone();
        updated.metadata.resource_version = Some(self.next_version());
        let generation = existing.metadata.generation.unwrap_or(1);
        updated.metadata.generation = Some(if updated.data == existing.data {
            generation
        } else {
            generation + 1
        });
        self.objects.lock().unwrap().insert(key.id(), updated.clone());
        Ok(updated)
    }

    async fn patch(&self, key: &ResourceKey, patch: &Value) -> Result<DynamicObject, StoreError> {
        self.enter(StoreOp::Patch, key.to_string()).await?;
        let existing = self
            .peek(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        let mut doc = serde_json::to_value(&existing)?;
        merge_patch(&mut doc, patch);
        let mut patched: DynamicObject = serde_json::from_value(doc)?;
        patched.metadata.uid = existing.metadata.uid.clone();
        patched.metadata.resource_version = Some(self.next_version());
        self.objects.lock().unwrap().insert(key.id(), patched.clone());
        Ok(patched)
    }

    async fn delete(&self, key: &ResourceKey) -> Result<(), StoreError> {
        self.enter(StoreOp::Delete, key.to_string()).await?;
        self.objects
            .lock()
            .unwrap()
            .remove(&key.id())
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn list(&self, resource: &ApiResource, namespace: Option<&str>) -> Result<Vec<DynamicObject>, StoreError> {
        self.enter(StoreOp::List, resource.kind.clone()).await?;
        let objects = self.objects.lock().unwrap();
        let mut items: Vec<DynamicObject> = objects
            .iter()
            .filter(|((api_version, kind, ns, _), _)| {
                *api_version == resource.api_version
                    && *kind == resource.kind
                    && namespace.is_none_or(|wanted| wanted == ns)
            })
            .map(|(_, obj)| obj.clone())
            .collect();
        items.sort_by(|a, b| a.metadata.name.cmp(&b.metadata.name));
        Ok(items)
    }
}

fn with_types(resource: &ApiResource, mut obj: DynamicObject) -> DynamicObject {
    if obj.types.is_none() {
        obj.types = Some(TypeMeta {
            api_version: resource.api_version.clone(),
            kind: resource.kind.clone(),
        });
    }
    obj
}

/// Applies an RFC 7386 JSON merge patch in place.
fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(target) = target {
        for (k, v) in patch {
            if v.is_null() {
                target.remove(k);
            } else {
                merge_patch(target.entry(k.clone()).or_insert(Value::Null), v);
            }
        }
    }
}
