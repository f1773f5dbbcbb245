//! Conversions between typed resources and the store's dynamic objects.

use std::fmt::Debug;

use kube::api::DynamicObject;
use kube::core::TypeMeta;
use kube::discovery::ApiResource;
use kube::Resource;
use resource_store::ResourceKey;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::OperandError;

/// A typed resource the engine can manage.
pub trait ManagedObject:
    Resource<DynamicType = ()> + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<K> ManagedObject for K where
    K: Resource<DynamicType = ()> + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

/// API coordinates of `K`
pub fn api_resource<K: ManagedObject>() -> ApiResource {
    ApiResource::erase::<K>(&())
}

/// Store key of a typed object
pub fn key_of<K: ManagedObject>(obj: &K) -> ResourceKey {
    ResourceKey::of(obj)
}

/// Stable string form of a key, used as the desired-cache key
pub fn cache_key<K: ManagedObject>(obj: &K) -> String {
    key_of(obj).to_string()
}

/// Typed object to dynamic object, with `apiVersion`/`kind` set.
pub fn to_dynamic<K: ManagedObject>(obj: &K) -> Result<DynamicObject, OperandError> {
    let mut dynamic: DynamicObject = serde_json::from_value(serde_json::to_value(obj)?)?;
    dynamic.types = Some(TypeMeta {
        api_version: K::api_version(&()).to_string(),
        kind: K::kind(&()).to_string(),
    });
    Ok(dynamic)
}

/// Dynamic object to typed object.
///
/// An object of another kind is a `KindMismatch`; one that does not parse as
/// `K` is a `Contract` violation.
pub fn from_dynamic<K: ManagedObject>(obj: &DynamicObject) -> Result<K, OperandError> {
    let expected = K::kind(&()).to_string();
    if let Some(types) = &obj.types {
        if types.kind != expected {
            return Err(OperandError::KindMismatch {
                expected,
                found: types.kind.clone(),
            });
        }
    }

    let mut typed = obj.clone();
    typed.types = Some(TypeMeta {
        api_version: K::api_version(&()).to_string(),
        kind: expected.clone(),
    });
    let value = serde_json::to_value(&typed)?;
    serde_json::from_value(value)
        .map_err(|e| OperandError::Contract(format!("store returned an unreadable {expected}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::DaemonSet;
    use k8s_openapi::api::core::v1::ConfigMap;
    use kube::api::ObjectMeta;
    use std::collections::BTreeMap;

    fn config_map() -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some("kubevirt-ui-features".into()),
                namespace: Some("virtops".into()),
                ..Default::default()
            },
            data: Some(BTreeMap::from([("a".to_string(), "1".to_string())])),
            ..Default::default()
        }
    }

    #[test]
    fn test_to_dynamic_sets_types() {
        let dynamic = to_dynamic(&config_map()).unwrap();
        let types = dynamic.types.unwrap();
        assert_eq!(types.kind, "ConfigMap");
        assert_eq!(types.api_version, "v1");
        assert_eq!(dynamic.data["data"]["a"], "1");
    }

    #[test]
    fn test_from_dynamic_reads_back() {
        let dynamic = to_dynamic(&config_map()).unwrap();
        let back: ConfigMap = from_dynamic(&dynamic).unwrap();
        assert_eq!(back, config_map());
    }

    #[test]
    fn test_from_dynamic_rejects_other_kind() {
        let dynamic = to_dynamic(&config_map()).unwrap();
        let err = from_dynamic::<DaemonSet>(&dynamic).unwrap_err();
        match err {
            OperandError::KindMismatch { expected, found } => {
                assert_eq!(expected, "DaemonSet");
                assert_eq!(found, "ConfigMap");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cache_key_names_kind_and_namespace() {
        assert_eq!(cache_key(&config_map()), "ConfigMap virtops/kubevirt-ui-features");
    }
}
