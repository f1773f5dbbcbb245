//! OpenShift and OLM resource shims
//!
//! These kinds are owned by other controllers. Only the fields the operator
//! reads or writes are typed; everything else is carried through untouched.

pub mod console;
pub mod console_plugin;
pub mod cluster_service_version;

pub use console::*;
pub use console_plugin::*;
pub use cluster_service_version::*;
