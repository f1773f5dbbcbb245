//! ConfigMap hooks.

use std::sync::Arc;

use async_trait::async_trait;
use crds::VirtPlatform;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::ObjectMeta;

use super::{Builder, OperandHooks};
use crate::config::OperatorConfig;
use crate::error::OperandError;
use crate::labels::{labels_match, merge_labels};

pub struct ConfigMapHooks {
    name: &'static str,
    config: Arc<OperatorConfig>,
    build: Builder<ConfigMap>,
    keep_user_data: bool,
}

impl ConfigMapHooks {
    pub fn new(name: &'static str, config: Arc<OperatorConfig>, build: Builder<ConfigMap>) -> Self {
        Self {
            name,
            config,
            build,
            keep_user_data: false,
        }
    }

    /// Data is written on create only; later edits belong to the user.
    #[must_use]
    pub fn keep_user_data(mut self) -> Self {
        self.keep_user_data = true;
        self
    }
}

#[async_trait]
impl OperandHooks for ConfigMapHooks {
    type Object = ConfigMap;

    fn kind_name(&self) -> &'static str {
        "ConfigMap"
    }

    fn build_desired(&self, platform: &VirtPlatform) -> Result<ConfigMap, OperandError> {
        (self.build)(platform, &self.config)
    }

    fn empty(&self, _platform: &VirtPlatform) -> ConfigMap {
        ConfigMap {
            metadata: ObjectMeta {
                name: Some(self.name.to_string()),
                namespace: Some(self.config.namespace.clone()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn matches_desired(&self, found: &ConfigMap, desired: &ConfigMap) -> bool {
        labels_match(desired.metadata.labels.as_ref(), found.metadata.labels.as_ref())
            && (self.keep_user_data || found.data.clone().unwrap_or_default() == desired.data.clone().unwrap_or_default())
    }

    fn converge(&self, found: &mut ConfigMap, desired: &ConfigMap) {
        merge_labels(&mut found.metadata.labels, desired.metadata.labels.as_ref());
        if !self.keep_user_data {
            found.data = desired.data.clone();
        }
    }
}
