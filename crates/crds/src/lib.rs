//! VirtOps CRD Definitions
//!
//! Kubernetes Custom Resource Definitions served by the VirtOps operator,
//! plus typed shims for the OpenShift/OLM kinds it manages.

pub mod virt_platform;
pub mod openshift;

pub use virt_platform::*;
pub use openshift::*;
