//! ConsolePlugin (console.openshift.io/v1)
//!
//! Registers a dynamic UI plugin with the cluster console.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[kube(group = "console.openshift.io", version = "v1", kind = "ConsolePlugin")]
#[serde(rename_all = "camelCase")]
pub struct ConsolePluginSpec {
    /// Name shown in the console
    pub display_name: String,

    /// Where the plugin assets are served from
    pub backend: ConsolePluginBackend,

    /// Proxies the console sets up on behalf of the plugin
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub proxy: Vec<ConsolePluginProxy>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsolePluginBackend {
    /// Backend type, always "Service" for in-cluster plugins
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ConsolePluginService>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConsolePluginService {
    pub name: String,
    pub namespace: String,
    pub port: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsolePluginProxy {
    pub alias: String,

    /// "UserToken" or "None"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<String>,

    pub endpoint: ConsolePluginProxyEndpoint,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsolePluginProxyEndpoint {
    #[serde(rename = "type")]
    pub type_: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ConsolePluginService>,
}
