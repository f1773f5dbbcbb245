//! DaemonSet hooks (node labeller).

use std::sync::Arc;

use async_trait::async_trait;
use crds::VirtPlatform;
use k8s_openapi::api::apps::v1::DaemonSet;
use kube::api::ObjectMeta;

use super::workload::{converge_template, generation_observed, template_matches, version_label_matches};
use super::{Builder, OperandHooks};
use crate::config::OperatorConfig;
use crate::error::OperandError;
use crate::labels::{labels_match, merge_labels};

pub struct DaemonSetHooks {
    name: &'static str,
    config: Arc<OperatorConfig>,
    build: Builder<DaemonSet>,
}

impl DaemonSetHooks {
    pub fn new(name: &'static str, config: Arc<OperatorConfig>, build: Builder<DaemonSet>) -> Self {
        Self { name, config, build }
    }
}

#[async_trait]
impl OperandHooks for DaemonSetHooks {
    type Object = DaemonSet;

    fn kind_name(&self) -> &'static str {
        "DaemonSet"
    }

    fn build_desired(&self, platform: &VirtPlatform) -> Result<DaemonSet, OperandError> {
        (self.build)(platform, &self.config)
    }

    fn empty(&self, _platform: &VirtPlatform) -> DaemonSet {
        DaemonSet {
            metadata: ObjectMeta {
                name: Some(self.name.to_string()),
                namespace: Some(self.config.namespace.clone()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn matches_desired(&self, found: &DaemonSet, desired: &DaemonSet) -> bool {
        if !labels_match(desired.metadata.labels.as_ref(), found.metadata.labels.as_ref()) {
            return false;
        }
        match (found.spec.as_ref(), desired.spec.as_ref()) {
            (Some(f), Some(d)) => f.selector == d.selector && template_matches(&f.template, &d.template),
            (None, None) => true,
            _ => false,
        }
    }

    /// The selector of a daemon set is immutable.
    fn requires_recreate(&self, found: &DaemonSet, desired: &DaemonSet) -> bool {
        found.spec.as_ref().map(|s| &s.selector) != desired.spec.as_ref().map(|s| &s.selector)
    }

    fn converge(&self, found: &mut DaemonSet, desired: &DaemonSet) {
        merge_labels(&mut found.metadata.labels, desired.metadata.labels.as_ref());
        let Some(d) = desired.spec.as_ref() else {
            return;
        };
        let f = found.spec.get_or_insert_with(Default::default);
        f.update_strategy = d.update_strategy.clone();
        converge_template(&mut f.template, &d.template);
    }

    fn is_ready(&self, found: &DaemonSet) -> bool {
        found.status.as_ref().is_some_and(|s| {
            generation_observed(&found.metadata, s.observed_generation)
                && s.updated_number_scheduled.unwrap_or(0) == s.desired_number_scheduled
                && s.number_ready == s.desired_number_scheduled
                && s.number_available.unwrap_or(0) == s.desired_number_scheduled
        })
    }

    fn component_version_matches(&self, found: &DaemonSet) -> bool {
        version_label_matches(&found.metadata, &self.config.version)
    }
}
