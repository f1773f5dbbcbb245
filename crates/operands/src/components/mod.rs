//! Desired-state builders for every managed resource.
//!
//! Builders are plain functions of the VirtPlatform and the operator
//! configuration. They set every field the operator owns explicitly, so the
//! result compares cleanly against what the API server returns.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Affinity, Toleration};
use crds::{NodePlacement, VirtPlatform};
use kube::ResourceExt;

pub mod csv;
pub mod node_labeller;
pub mod priority_class;
pub mod ui;

/// Priority class every operand pod runs with
pub const PRIORITY_CLASS_NAME: &str = "kubevirt-cluster-critical";

pub const TERMINATION_MESSAGE_PATH: &str = "/dev/termination-log";
pub const TERMINATION_MESSAGE_POLICY: &str = "FallbackToLogsOnError";

/// Scheduling fields resolved from an optional placement
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scheduling {
    pub node_selector: Option<BTreeMap<String, String>>,
    pub affinity: Option<Affinity>,
    pub tolerations: Option<Vec<Toleration>>,
}

impl Scheduling {
    /// Placement fields win; `default_affinity` applies when the placement has none.
    pub fn resolve(placement: Option<&NodePlacement>, default_affinity: Option<Affinity>) -> Self {
        match placement {
            Some(p) => Self {
                node_selector: p.node_selector.clone(),
                affinity: p.affinity.clone().or(default_affinity),
                tolerations: p.tolerations.clone(),
            },
            None => Self {
                node_selector: None,
                affinity: default_affinity,
                tolerations: None,
            },
        }
    }
}

/// Name used for the `app` label
pub fn platform_name(platform: &VirtPlatform) -> String {
    platform.name_any()
}
