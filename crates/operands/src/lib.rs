//! VirtOps operand engine
//!
//! Converges the resources that make up the virtualization platform toward
//! the state described by a `VirtPlatform`. Every managed kind goes through
//! the same `ensure` algorithm in [`generic`]; the kind-specific parts live in
//! [`hooks`] and the desired objects are produced by [`components`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use operands::{Metrics, OperandHandler, OperandRequest, OperatorConfig};
//! use resource_store::KubeStore;
//!
//! # async fn example(platform: crds::VirtPlatform) -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(KubeStore::new(kube::Client::try_default().await?));
//! let config = Arc::new(OperatorConfig::from_env()?);
//! let handler = OperandHandler::new(store, config, Arc::new(Metrics::new()?));
//!
//! let mut req = OperandRequest::new(platform).operator_triggered(true);
//! let summary = handler.ensure(&mut req).await?;
//! println!("created {} updated {}", summary.created, summary.updated);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod components;
pub mod conditional;
pub mod config;
pub mod error;
pub mod generic;
pub mod handler;
pub mod hooks;
pub mod labels;
pub mod metrics;
pub mod object;
pub mod request;
pub mod result;

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod conditional_test;
#[cfg(test)]
mod generic_test;

pub use cache::DesiredCache;
pub use conditional::ConditionalOperand;
pub use config::OperatorConfig;
pub use error::OperandError;
pub use generic::{GenericOperand, Operand};
pub use handler::{OperandHandler, PassSummary};
pub use hooks::{ConvergeStrategy, OperandHooks};
pub use metrics::Metrics;
pub use request::{ConditionMessage, OperandRequest};
pub use result::EnsureResult;
