//! Cluster-wide priority class for operand pods.

use crds::VirtPlatform;
use k8s_openapi::api::scheduling::v1::PriorityClass;
use kube::api::ObjectMeta;

use super::{platform_name, PRIORITY_CLASS_NAME};
use crate::config::OperatorConfig;
use crate::error::OperandError;
use crate::labels::{get_labels, Component};

/// Highest value a user-defined priority class may take
pub const PRIORITY_VALUE: i32 = 1_000_000_000;

pub const PRIORITY_DESCRIPTION: &str = "This priority class should be used for KubeVirt core components only.";

pub fn priority_class(platform: &VirtPlatform, config: &OperatorConfig) -> Result<PriorityClass, OperandError> {
    Ok(PriorityClass {
        metadata: ObjectMeta {
            name: Some(PRIORITY_CLASS_NAME.to_string()),
            labels: Some(get_labels(&platform_name(platform), Component::Compute, config)),
            ..Default::default()
        },
        value: PRIORITY_VALUE,
        global_default: Some(false),
        description: Some(PRIORITY_DESCRIPTION.to_string()),
        ..Default::default()
    })
}
