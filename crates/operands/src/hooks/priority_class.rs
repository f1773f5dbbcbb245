//! PriorityClass hooks.

use std::sync::Arc;

use async_trait::async_trait;
use crds::VirtPlatform;
use k8s_openapi::api::scheduling::v1::PriorityClass;
use kube::api::ObjectMeta;

use super::{Builder, OperandHooks};
use crate::config::OperatorConfig;
use crate::error::OperandError;
use crate::labels::{labels_match, merge_labels};

pub struct PriorityClassHooks {
    name: &'static str,
    config: Arc<OperatorConfig>,
    build: Builder<PriorityClass>,
}

impl PriorityClassHooks {
    pub fn new(name: &'static str, config: Arc<OperatorConfig>, build: Builder<PriorityClass>) -> Self {
        Self { name, config, build }
    }
}

#[async_trait]
impl OperandHooks for PriorityClassHooks {
    type Object = PriorityClass;

    fn kind_name(&self) -> &'static str {
        "PriorityClass"
    }

    fn build_desired(&self, platform: &VirtPlatform) -> Result<PriorityClass, OperandError> {
        (self.build)(platform, &self.config)
    }

    fn empty(&self, _platform: &VirtPlatform) -> PriorityClass {
        PriorityClass {
            metadata: ObjectMeta {
                name: Some(self.name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn matches_desired(&self, found: &PriorityClass, desired: &PriorityClass) -> bool {
        found.value == desired.value
            && found.description == desired.description
            && labels_match(desired.metadata.labels.as_ref(), found.metadata.labels.as_ref())
    }

    /// The value of a priority class cannot change once created.
    fn requires_recreate(&self, found: &PriorityClass, desired: &PriorityClass) -> bool {
        found.value != desired.value || found.description != desired.description
    }

    fn converge(&self, found: &mut PriorityClass, desired: &PriorityClass) {
        merge_labels(&mut found.metadata.labels, desired.metadata.labels.as_ref());
    }
}
