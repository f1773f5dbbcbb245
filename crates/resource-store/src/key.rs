//! Resource identity

use std::fmt;

use kube::api::DynamicObject;
use kube::discovery::ApiResource;
use kube::{Resource, ResourceExt};

/// (kind, namespace, name) of a managed resource, plus the API coordinates
/// needed to address it.
#[derive(Debug, Clone)]
pub struct ResourceKey {
    pub resource: ApiResource,
    pub namespace: Option<String>,
    pub name: String,
}

impl ResourceKey {
    /// Key for a typed object, using the statically known API resource of `K`.
    pub fn of<K>(obj: &K) -> Self
    where
        K: Resource<DynamicType = ()>,
    {
        Self {
            resource: ApiResource::erase::<K>(&()),
            namespace: obj.meta().namespace.clone(),
            name: obj.meta().name.clone().unwrap_or_default(),
        }
    }

    /// Key for a dynamic object addressed through `resource`.
    pub fn of_dynamic(resource: &ApiResource, obj: &DynamicObject) -> Self {
        Self {
            resource: resource.clone(),
            namespace: obj.namespace(),
            name: obj.name_any(),
        }
    }

    /// Identity tuple used for equality and map keys
    pub fn id(&self) -> (String, String, String, String) {
        (
            self.resource.api_version.clone(),
            self.resource.kind.clone(),
            self.namespace.clone().unwrap_or_default(),
            self.name.clone(),
        )
    }
}

impl PartialEq for ResourceKey {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for ResourceKey {}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{} {}/{}", self.resource.kind, ns, self.name),
            None => write!(f, "{} {}", self.resource.kind, self.name),
        }
    }
}
