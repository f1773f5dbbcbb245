//! Service hooks.

use std::sync::Arc;

use async_trait::async_trait;
use crds::VirtPlatform;
use k8s_openapi::api::core::v1::Service;
use kube::api::ObjectMeta;

use super::{Builder, OperandHooks};
use crate::config::OperatorConfig;
use crate::error::OperandError;
use crate::labels::{labels_match, merge_labels};

pub struct ServiceHooks {
    name: &'static str,
    config: Arc<OperatorConfig>,
    build: Builder<Service>,
}

impl ServiceHooks {
    pub fn new(name: &'static str, config: Arc<OperatorConfig>, build: Builder<Service>) -> Self {
        Self { name, config, build }
    }
}

#[async_trait]
impl OperandHooks for ServiceHooks {
    type Object = Service;

    fn kind_name(&self) -> &'static str {
        "Service"
    }

    fn build_desired(&self, platform: &VirtPlatform) -> Result<Service, OperandError> {
        (self.build)(platform, &self.config)
    }

    fn empty(&self, _platform: &VirtPlatform) -> Service {
        Service {
            metadata: ObjectMeta {
                name: Some(self.name.to_string()),
                namespace: Some(self.config.namespace.clone()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn matches_desired(&self, found: &Service, desired: &Service) -> bool {
        if !labels_match(desired.metadata.labels.as_ref(), found.metadata.labels.as_ref())
            || !labels_match(desired.metadata.annotations.as_ref(), found.metadata.annotations.as_ref())
        {
            return false;
        }
        match (found.spec.as_ref(), desired.spec.as_ref()) {
            (Some(f), Some(d)) => f.ports == d.ports && f.selector == d.selector && f.type_ == d.type_,
            (None, None) => true,
            _ => false,
        }
    }

    /// Ports, selector and type are replaced; the allocated cluster IP stays.
    fn converge(&self, found: &mut Service, desired: &Service) {
        merge_labels(&mut found.metadata.labels, desired.metadata.labels.as_ref());
        merge_labels(&mut found.metadata.annotations, desired.metadata.annotations.as_ref());
        let Some(d) = desired.spec.as_ref() else {
            return;
        };
        let f = found.spec.get_or_insert_with(Default::default);
        f.ports = d.ports.clone();
        f.selector = d.selector.clone();
        f.type_ = d.type_.clone();
    }
}
