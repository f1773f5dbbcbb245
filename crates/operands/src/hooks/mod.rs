//! Per-kind behaviour plugged into the generic operand.
//!
//! One `OperandHooks` implementation exists per managed resource kind. The
//! engine owns the algorithm (fetch, compare, create, update, recreate,
//! delete); hooks only answer questions about their kind.

use async_trait::async_trait;
use crds::VirtPlatform;
use resource_store::ResourceStoreTrait;

use crate::error::OperandError;
use crate::object::ManagedObject;
use crate::request::OperandRequest;

pub mod configmap;
pub mod console;
pub mod console_plugin;
pub mod csv_annotations;
pub mod daemonset;
pub mod deployment;
pub mod priority_class;
pub mod rbac;
pub mod service;
mod workload;

#[cfg(test)]
mod console_test;
#[cfg(test)]
mod csv_annotations_test;

pub use configmap::ConfigMapHooks;
pub use console::ConsoleRegistrationHooks;
pub use console_plugin::ConsolePluginHooks;
pub use csv_annotations::CsvAnnotationHooks;
pub use daemonset::DaemonSetHooks;
pub use deployment::DeploymentHooks;
pub use priority_class::PriorityClassHooks;
pub use rbac::{RoleBindingHooks, RoleHooks};
pub use service::ServiceHooks;

/// How an in-place correction is submitted to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvergeStrategy {
    /// Replace the whole object (converged found copy, uid and resourceVersion kept)
    #[default]
    Update,
    /// Send the JSON merge patch from `patch_for`
    Patch,
}

/// Builder signature shared by the concrete hook types
pub type Builder<K> = fn(&VirtPlatform, &crate::config::OperatorConfig) -> Result<K, OperandError>;

#[async_trait]
pub trait OperandHooks: Send + Sync {
    type Object: ManagedObject;

    /// Short human name used in logs and metrics
    fn kind_name(&self) -> &'static str;

    /// The complete desired object. Fails only when a prerequisite is missing.
    fn build_desired(&self, platform: &VirtPlatform) -> Result<Self::Object, OperandError>;

    /// An object carrying only the identity (name, namespace) of the resource
    fn empty(&self, platform: &VirtPlatform) -> Self::Object;

    /// Compares the fields this operator owns.
    fn matches_desired(&self, found: &Self::Object, desired: &Self::Object) -> bool;

    /// The difference touches a field the store will not change in place.
    fn requires_recreate(&self, _found: &Self::Object, _desired: &Self::Object) -> bool {
        false
    }

    /// Copy owned fields from `desired` onto `found`, keeping server-assigned metadata.
    fn converge(&self, found: &mut Self::Object, desired: &Self::Object);

    fn strategy(&self) -> ConvergeStrategy {
        ConvergeStrategy::Update
    }

    /// Merge patch for `ConvergeStrategy::Patch`
    fn patch_for(&self, _found: &Self::Object, _desired: &Self::Object) -> Result<serde_json::Value, OperandError> {
        Err(OperandError::Contract(format!(
            "{} does not build merge patches",
            self.kind_name()
        )))
    }

    /// Whether the operator creates (and deletes) this resource, or only
    /// adjusts one that someone else owns
    fn create_if_missing(&self) -> bool {
        true
    }

    fn is_ready(&self, _found: &Self::Object) -> bool {
        true
    }

    fn component_version_matches(&self, _found: &Self::Object) -> bool {
        true
    }

    /// Best-effort work after a successful pass; errors are only logged.
    async fn finalize(&self, _req: &OperandRequest, _store: &dyn ResourceStoreTrait) -> Result<(), OperandError> {
        Ok(())
    }
}
