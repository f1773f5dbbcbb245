//! VirtPlatform CRD
//!
//! The desired configuration of the whole virtualization platform. The
//! operator converges every operand (deployments, daemon sets, config maps,
//! console registration) toward this object.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Affinity, Toleration};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// API group served by the operator
pub const API_GROUP: &str = "virtops.microscaler.io";

/// Name of the operator entry in `status.versions`
pub const OPERATOR_VERSION_NAME: &str = "operator";

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[kube(
    group = "virtops.microscaler.io",
    version = "v1alpha1",
    kind = "VirtPlatform",
    namespaced,
    status = "VirtPlatformStatus",
    shortname = "vp"
)]
#[serde(rename_all = "camelCase")]
pub struct VirtPlatformSpec {
    /// Feature gates for optional operands
    #[serde(default)]
    pub feature_gates: FeatureGates,

    /// Node placement for infrastructure components (UI plugin, proxy)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infra: Option<NodePlacement>,

    /// Node placement for workload-facing components (node labeller)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workloads: Option<NodePlacement>,

    /// What to do when the VirtPlatform is deleted while workloads still exist
    #[serde(default)]
    pub uninstall_strategy: UninstallStrategy,

    /// Run two replicas with pod anti-affinity instead of one
    #[serde(default)]
    pub highly_available: bool,

    /// Extra annotations to publish on the operator's ClusterServiceVersion
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Optional operands toggled by the user
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeatureGates {
    /// Deploy the node labeller daemon set
    #[serde(default)]
    pub deploy_node_labeller: bool,

    /// Deploy the console UI plugin (deployment, service config, ConsolePlugin)
    #[serde(default = "default_true")]
    pub deploy_console_plugin: bool,

    /// Deploy the console API proxy deployment
    #[serde(default = "default_true")]
    pub deploy_console_proxy: bool,
}

impl Default for FeatureGates {
    fn default() -> Self {
        Self {
            deploy_node_labeller: false,
            deploy_console_plugin: true,
            deploy_console_proxy: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Scheduling hints copied onto operand pod templates
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodePlacement {
    /// Node selector labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,

    /// Pod affinity rules (replaces the default anti-affinity when set)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_object")]
    pub affinity: Option<Affinity>,

    /// Tolerations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_array")]
    pub tolerations: Option<Vec<Toleration>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
pub enum UninstallStrategy {
    /// Delete operands even if virtual machines still exist
    RemoveWorkloads,

    /// Refuse to uninstall while virtual machines exist
    #[default]
    BlockUninstallIfWorkloadsExist,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtPlatformStatus {
    /// Conditions reported by the last reconciliation pass
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<PlatformCondition>,

    /// Generation of the spec the last successful pass converged to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Versions of the components that finished rolling out
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<ComponentVersion>,
}

impl VirtPlatformStatus {
    /// Version recorded for the named component, if any
    pub fn version_of(&self, name: &str) -> Option<&str> {
        self.versions
            .iter()
            .find(|v| v.name == name)
            .map(|v| v.version.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlatformCondition {
    /// Condition type (ReconcileComplete, Available, Progressing, Degraded)
    #[serde(rename = "type")]
    pub type_: String,

    /// "True", "False" or "Unknown"
    pub status: String,

    /// Machine-readable reason
    pub reason: String,

    /// Human-readable message
    #[serde(default)]
    pub message: String,

    /// Last time the status of the condition changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentVersion {
    pub name: String,
    pub version: String,
}

pub(crate) fn preserve_unknown_object(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "object",
        "x-kubernetes-preserve-unknown-fields": true
    })
}

pub(crate) fn preserve_unknown_array(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "array",
        "items": {
            "type": "object",
            "x-kubernetes-preserve-unknown-fields": true
        }
    })
}
