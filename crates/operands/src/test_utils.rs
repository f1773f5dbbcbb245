//! Test utilities for operand unit tests
//!
//! Builders for VirtPlatform fixtures, configuration and typed objects
//! seeded into the mock store.

use std::collections::BTreeMap;
use std::sync::Arc;

use crds::{FeatureGates, VirtPlatform, VirtPlatformSpec};
use kube::api::{DynamicObject, ObjectMeta};
use resource_store::{MockResourceStore, ResourceKey, ResourceStoreTrait};

use crate::config::OperatorConfig;
use crate::object::{api_resource, from_dynamic, key_of, to_dynamic, ManagedObject};
use crate::request::OperandRequest;

pub const TEST_NAMESPACE: &str = "virtops";
pub const TEST_VERSION: &str = "1.2.3";

pub fn test_config() -> OperatorConfig {
    OperatorConfig {
        namespace: TEST_NAMESPACE.to_string(),
        version: TEST_VERSION.to_string(),
        ui_plugin_image: Some("quay.io/virtops/kubevirt-console-plugin:v1.2.3".to_string()),
        ui_proxy_image: Some("quay.io/virtops/kubevirt-apiserver-proxy:v1.2.3".to_string()),
        node_labeller_image: Some("quay.io/virtops/node-labeller:v1.2.3".to_string()),
        csv_name: None,
        metrics_addr: "127.0.0.1:0".to_string(),
    }
}

pub fn test_platform() -> VirtPlatform {
    VirtPlatform {
        metadata: ObjectMeta {
            name: Some("virtops".to_string()),
            namespace: Some(TEST_NAMESPACE.to_string()),
            generation: Some(1),
            ..Default::default()
        },
        spec: VirtPlatformSpec::default(),
        status: None,
    }
}

pub fn platform_with_gates(gates: FeatureGates) -> VirtPlatform {
    let mut platform = test_platform();
    platform.spec.feature_gates = gates;
    platform
}

/// A request for a pass provoked by an edit of the VirtPlatform
pub fn operator_request(platform: VirtPlatform) -> OperandRequest {
    OperandRequest::new(platform).operator_triggered(true)
}

/// A request for a pass provoked by a watched resource changing
pub fn external_request(platform: VirtPlatform) -> OperandRequest {
    OperandRequest::new(platform).operator_triggered(false)
}

pub fn new_store() -> (MockResourceStore, Arc<dyn ResourceStoreTrait>) {
    let mock = MockResourceStore::new();
    let store: Arc<dyn ResourceStoreTrait> = Arc::new(mock.clone());
    (mock, store)
}

/// Seed a typed object, returning what the store holds
pub fn seed<K: ManagedObject>(mock: &MockResourceStore, obj: &K) -> DynamicObject {
    let dynamic = to_dynamic(obj).expect("fixture serializes");
    mock.insert(&api_resource::<K>(), dynamic)
}

/// Typed copy of a stored object
pub fn stored<K: ManagedObject>(mock: &MockResourceStore, obj: &K) -> Option<K> {
    mock.peek(&key_of(obj)).map(|d| from_dynamic(&d).expect("stored object parses"))
}

pub fn key<K: ManagedObject>(obj: &K) -> ResourceKey {
    key_of(obj)
}

pub fn labels(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}
