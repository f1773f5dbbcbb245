//! Controller-specific error types.
//!
//! This module defines error types specific to the platform operator binary
//! that are not covered by the operand engine or upstream library errors.

use kube::Error as KubeError;
use operands::OperandError;
use thiserror::Error;

/// Errors that can occur in the platform operator.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// An operand could not be converged or removed
    #[error("Operand error: {0}")]
    Operand(#[from] OperandError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON serialization error (status and finalizer patches)
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Metrics server could not bind or serve
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
