//! ClusterServiceVersion (operators.coreos.com/v1alpha1)
//!
//! Owned by OLM. The operator only ever patches annotations on it.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Annotation listing the console plugins shipped by this operator
pub const CONSOLE_PLUGINS_ANNOTATION: &str = "console.openshift.io/plugins";

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[kube(
    group = "operators.coreos.com",
    version = "v1alpha1",
    kind = "ClusterServiceVersion",
    namespaced
)]
pub struct ClusterServiceVersionSpec {
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}
