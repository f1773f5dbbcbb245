//! Deployment hooks (console plugin and API proxy).

use std::sync::Arc;

use async_trait::async_trait;
use crds::VirtPlatform;
use k8s_openapi::api::apps::v1::Deployment;
use kube::api::ObjectMeta;

use super::workload::{converge_template, generation_observed, template_matches, version_label_matches};
use super::{Builder, OperandHooks};
use crate::config::OperatorConfig;
use crate::error::OperandError;
use crate::labels::{labels_match, merge_labels};

pub struct DeploymentHooks {
    name: &'static str,
    config: Arc<OperatorConfig>,
    build: Builder<Deployment>,
}

impl DeploymentHooks {
    pub fn new(name: &'static str, config: Arc<OperatorConfig>, build: Builder<Deployment>) -> Self {
        Self { name, config, build }
    }
}

#[async_trait]
impl OperandHooks for DeploymentHooks {
    type Object = Deployment;

    fn kind_name(&self) -> &'static str {
        "Deployment"
    }

    fn build_desired(&self, platform: &VirtPlatform) -> Result<Deployment, OperandError> {
        (self.build)(platform, &self.config)
    }

    fn empty(&self, _platform: &VirtPlatform) -> Deployment {
        Deployment {
            metadata: ObjectMeta {
                name: Some(self.name.to_string()),
                namespace: Some(self.config.namespace.clone()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn matches_desired(&self, found: &Deployment, desired: &Deployment) -> bool {
        if !labels_match(desired.metadata.labels.as_ref(), found.metadata.labels.as_ref()) {
            return false;
        }
        match (found.spec.as_ref(), desired.spec.as_ref()) {
            (Some(f), Some(d)) => {
                f.selector == d.selector && f.replicas == d.replicas && template_matches(&f.template, &d.template)
            }
            (None, None) => true,
            _ => false,
        }
    }

    fn requires_recreate(&self, found: &Deployment, desired: &Deployment) -> bool {
        found.spec.as_ref().map(|s| &s.selector) != desired.spec.as_ref().map(|s| &s.selector)
    }

    fn converge(&self, found: &mut Deployment, desired: &Deployment) {
        merge_labels(&mut found.metadata.labels, desired.metadata.labels.as_ref());
        let Some(d) = desired.spec.as_ref() else {
            return;
        };
        let f = found.spec.get_or_insert_with(Default::default);
        f.replicas = d.replicas;
        f.strategy = d.strategy.clone();
        converge_template(&mut f.template, &d.template);
    }

    /// The rollout of the current template has finished: the controller saw
    /// this generation and every replica runs the new template and is ready.
    fn is_ready(&self, found: &Deployment) -> bool {
        let Some(status) = found.status.as_ref() else {
            return false;
        };
        let want = found.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1);
        generation_observed(&found.metadata, status.observed_generation)
            && status.replicas.unwrap_or(0) == want
            && status.updated_replicas.unwrap_or(0) == want
            && status.ready_replicas.unwrap_or(0) == want
            && status.available_replicas.unwrap_or(0) == want
    }

    fn component_version_matches(&self, found: &Deployment) -> bool {
        version_label_matches(&found.metadata, &self.config.version)
    }
}
