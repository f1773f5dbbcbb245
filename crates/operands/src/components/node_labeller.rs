//! Node labeller daemon set.

use std::collections::BTreeMap;

use crds::VirtPlatform;
use k8s_openapi::api::apps::v1::{DaemonSet, DaemonSetSpec, DaemonSetUpdateStrategy};
use k8s_openapi::api::core::v1::{
    Container, EmptyDirVolumeSource, EnvVar, EnvVarSource, ObjectFieldSelector, PodSpec, PodTemplateSpec,
    ResourceRequirements, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use kube::api::ObjectMeta;

use super::{platform_name, Scheduling, PRIORITY_CLASS_NAME, TERMINATION_MESSAGE_PATH, TERMINATION_MESSAGE_POLICY};
use crate::config::OperatorConfig;
use crate::error::OperandError;
use crate::labels::{get_labels, selector_labels, Component};

pub const NODE_LABELLER_NAME: &str = "kubevirt-node-labeller";
const FEATURES_VOLUME: &str = "node-labeller-features";
const FEATURES_PATH: &str = "/var/lib/kubevirt-node-labeller";

pub fn node_labeller_daemonset(platform: &VirtPlatform, config: &OperatorConfig) -> Result<DaemonSet, OperandError> {
    let image = OperatorConfig::require_image(&config.node_labeller_image, "NODE_LABELLER_IMAGE")?;
    let labels = get_labels(&platform_name(platform), Component::NodeLabeller, config);
    let selector = selector_labels(NODE_LABELLER_NAME, Component::NodeLabeller);
    let mut pod_labels = labels.clone();
    pod_labels.extend(selector.clone());
    let scheduling = Scheduling::resolve(platform.spec.workloads.as_ref(), None);

    Ok(DaemonSet {
        metadata: ObjectMeta {
            name: Some(NODE_LABELLER_NAME.to_string()),
            namespace: Some(config.namespace.clone()),
            labels: Some(labels),
            ..Default::default()
        },
        spec: Some(DaemonSetSpec {
            selector: LabelSelector {
                match_labels: Some(selector),
                match_expressions: None,
            },
            update_strategy: Some(DaemonSetUpdateStrategy {
                type_: Some("RollingUpdate".to_string()),
                rolling_update: None,
            }),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(pod_labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    service_account_name: Some(NODE_LABELLER_NAME.to_string()),
                    containers: vec![Container {
                        name: NODE_LABELLER_NAME.to_string(),
                        image: Some(image.to_string()),
                        image_pull_policy: Some("IfNotPresent".to_string()),
                        env: Some(vec![EnvVar {
                            name: "NODE_NAME".to_string(),
                            value_from: Some(EnvVarSource {
                                field_ref: Some(ObjectFieldSelector {
                                    api_version: Some("v1".to_string()),
                                    field_path: "spec.nodeName".to_string(),
                                }),
                                ..Default::default()
                            }),
                            ..Default::default()
                        }]),
                        resources: Some(ResourceRequirements {
                            requests: Some(BTreeMap::from([
                                ("cpu".to_string(), Quantity("10m".to_string())),
                                ("memory".to_string(), Quantity("50Mi".to_string())),
                            ])),
                            ..Default::default()
                        }),
                        termination_message_path: Some(TERMINATION_MESSAGE_PATH.to_string()),
                        termination_message_policy: Some(TERMINATION_MESSAGE_POLICY.to_string()),
                        volume_mounts: Some(vec![VolumeMount {
                            name: FEATURES_VOLUME.to_string(),
                            mount_path: FEATURES_PATH.to_string(),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    priority_class_name: Some(PRIORITY_CLASS_NAME.to_string()),
                    node_selector: scheduling.node_selector,
                    affinity: scheduling.affinity,
                    tolerations: scheduling.tolerations,
                    volumes: Some(vec![Volume {
                        name: FEATURES_VOLUME.to_string(),
                        empty_dir: Some(EmptyDirVolumeSource::default()),
                        ..Default::default()
                    }]),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    })
}
