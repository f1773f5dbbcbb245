//! Role and RoleBinding hooks (console access to the UI config maps).

use std::sync::Arc;

use async_trait::async_trait;
use crds::VirtPlatform;
use k8s_openapi::api::rbac::v1::{Role, RoleBinding};
use kube::api::ObjectMeta;

use super::{Builder, OperandHooks};
use crate::config::OperatorConfig;
use crate::error::OperandError;
use crate::labels::{labels_match, merge_labels};

fn namespaced(name: &str, config: &OperatorConfig) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(config.namespace.clone()),
        ..Default::default()
    }
}

pub struct RoleHooks {
    name: &'static str,
    config: Arc<OperatorConfig>,
    build: Builder<Role>,
}

impl RoleHooks {
    pub fn new(name: &'static str, config: Arc<OperatorConfig>, build: Builder<Role>) -> Self {
        Self { name, config, build }
    }
}

#[async_trait]
impl OperandHooks for RoleHooks {
    type Object = Role;

    fn kind_name(&self) -> &'static str {
        "Role"
    }

    fn build_desired(&self, platform: &VirtPlatform) -> Result<Role, OperandError> {
        (self.build)(platform, &self.config)
    }

    fn empty(&self, _platform: &VirtPlatform) -> Role {
        Role {
            metadata: namespaced(self.name, &self.config),
            ..Default::default()
        }
    }

    fn matches_desired(&self, found: &Role, desired: &Role) -> bool {
        labels_match(desired.metadata.labels.as_ref(), found.metadata.labels.as_ref())
            && found.rules.clone().unwrap_or_default() == desired.rules.clone().unwrap_or_default()
    }

    fn converge(&self, found: &mut Role, desired: &Role) {
        merge_labels(&mut found.metadata.labels, desired.metadata.labels.as_ref());
        found.rules = desired.rules.clone();
    }
}

pub struct RoleBindingHooks {
    name: &'static str,
    config: Arc<OperatorConfig>,
    build: Builder<RoleBinding>,
}

impl RoleBindingHooks {
    pub fn new(name: &'static str, config: Arc<OperatorConfig>, build: Builder<RoleBinding>) -> Self {
        Self { name, config, build }
    }
}

#[async_trait]
impl OperandHooks for RoleBindingHooks {
    type Object = RoleBinding;

    fn kind_name(&self) -> &'static str {
        "RoleBinding"
    }

    fn build_desired(&self, platform: &VirtPlatform) -> Result<RoleBinding, OperandError> {
        (self.build)(platform, &self.config)
    }

    fn empty(&self, _platform: &VirtPlatform) -> RoleBinding {
        RoleBinding {
            metadata: namespaced(self.name, &self.config),
            ..Default::default()
        }
    }

    fn matches_desired(&self, found: &RoleBinding, desired: &RoleBinding) -> bool {
        labels_match(desired.metadata.labels.as_ref(), found.metadata.labels.as_ref())
            && found.role_ref == desired.role_ref
            && found.subjects.clone().unwrap_or_default() == desired.subjects.clone().unwrap_or_default()
    }

    /// `roleRef` cannot be changed on a stored binding.
    fn requires_recreate(&self, found: &RoleBinding, desired: &RoleBinding) -> bool {
        found.role_ref != desired.role_ref
    }

    fn converge(&self, found: &mut RoleBinding, desired: &RoleBinding) {
        merge_labels(&mut found.metadata.labels, desired.metadata.labels.as_ref());
        found.subjects = desired.subjects.clone();
    }
}
