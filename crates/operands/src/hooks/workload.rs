//! Pod template comparison shared by deployments and daemon sets.

use k8s_openapi::api::core::v1::{PodSpec, PodTemplateSpec};
use kube::api::ObjectMeta;

use crate::labels::{labels_match, merge_labels, VERSION_LABEL};

/// Pod template fields the operator owns are equal; template labels and
/// annotations only need to be present.
pub(crate) fn template_matches(found: &PodTemplateSpec, desired: &PodTemplateSpec) -> bool {
    let found_meta = found.metadata.as_ref();
    let desired_meta = desired.metadata.as_ref();
    if !labels_match(
        desired_meta.and_then(|m| m.labels.as_ref()),
        found_meta.and_then(|m| m.labels.as_ref()),
    ) || !labels_match(
        desired_meta.and_then(|m| m.annotations.as_ref()),
        found_meta.and_then(|m| m.annotations.as_ref()),
    ) {
        return false;
    }

    match (found.spec.as_ref(), desired.spec.as_ref()) {
        (Some(f), Some(d)) => pod_spec_matches(f, d),
        (None, None) => true,
        _ => false,
    }
}

fn pod_spec_matches(found: &PodSpec, desired: &PodSpec) -> bool {
    found.containers == desired.containers
        && found.service_account_name == desired.service_account_name
        && found.priority_class_name == desired.priority_class_name
        && found.node_selector == desired.node_selector
        && found.affinity == desired.affinity
        && found.tolerations == desired.tolerations
        && found.volumes == desired.volumes
}

/// Copy owned pod template fields onto `found`; everything else is left alone.
pub(crate) fn converge_template(found: &mut PodTemplateSpec, desired: &PodTemplateSpec) {
    if let Some(desired_meta) = desired.metadata.as_ref() {
        let found_meta = found.metadata.get_or_insert_with(ObjectMeta::default);
        merge_labels(&mut found_meta.labels, desired_meta.labels.as_ref());
        merge_labels(&mut found_meta.annotations, desired_meta.annotations.as_ref());
    }

    let Some(d) = desired.spec.as_ref() else {
        return;
    };
    let f = found.spec.get_or_insert_with(PodSpec::default);
    f.containers = d.containers.clone();
    f.service_account_name = d.service_account_name.clone();
    // deprecated alias the API server keeps in sync
    f.service_account = None;
    f.priority_class_name = d.priority_class_name.clone();
    f.node_selector = d.node_selector.clone();
    f.affinity = d.affinity.clone();
    f.tolerations = d.tolerations.clone();
    f.volumes = d.volumes.clone();
}

pub(crate) fn version_label_matches(meta: &ObjectMeta, version: &str) -> bool {
    meta.labels
        .as_ref()
        .and_then(|l| l.get(VERSION_LABEL))
        .is_some_and(|v| v == version)
}

/// The workload controller has acted on the latest spec. An object without
/// a generation (never stored) counts as observed once any status exists.
pub(crate) fn generation_observed(meta: &ObjectMeta, observed: Option<i64>) -> bool {
    match (meta.generation, observed) {
        (Some(generation), Some(observed)) => observed >= generation,
        (Some(_), None) => false,
        (None, _) => true,
    }
}
