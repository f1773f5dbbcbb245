//! Console operator configuration (operator.openshift.io/v1)
//!
//! The singleton `cluster` object lists the UI plugins the console loads.
//! Unknown spec fields are kept in `extra` so full-object updates do not
//! drop settings owned by the console operator.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Name of the singleton Console object
pub const CLUSTER_CONSOLE_NAME: &str = "cluster";

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[kube(group = "operator.openshift.io", version = "v1", kind = "Console")]
#[serde(rename_all = "camelCase")]
pub struct ConsoleSpec {
    /// Enabled console plugins
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}
