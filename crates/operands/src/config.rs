//! Operator configuration loaded from the environment.

use std::env;

use crate::error::OperandError;

/// Namespace used when `WATCH_NAMESPACE` is not set
pub const DEFAULT_NAMESPACE: &str = "virtops";

/// Version used when `OPERATOR_VERSION` is not set
pub const DEFAULT_VERSION: &str = "0.1.0";

/// Listen address used when `METRICS_ADDR` is not set
pub const DEFAULT_METRICS_ADDR: &str = "0.0.0.0:8080";

/// Operator-wide settings that feed the resource builders.
///
/// Image references are optional at load time: a missing image only fails
/// the operand that needs it, and only when that operand is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorConfig {
    pub namespace: String,
    pub version: String,
    pub ui_plugin_image: Option<String>,
    pub ui_proxy_image: Option<String>,
    pub node_labeller_image: Option<String>,
    /// ClusterServiceVersion to annotate; `None` disables the CSV operand
    pub csv_name: Option<String>,
    pub metrics_addr: String,
}

impl OperatorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, OperandError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, OperandError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let namespace = non_empty("WATCH_NAMESPACE").unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        let version = non_empty("OPERATOR_VERSION").unwrap_or_else(|| DEFAULT_VERSION.to_string());
        if version.contains(char::is_whitespace) {
            return Err(OperandError::InvalidConfig(format!(
                "OPERATOR_VERSION must not contain whitespace: {version:?}"
            )));
        }

        Ok(Self {
            namespace,
            version,
            ui_plugin_image: non_empty("UI_PLUGIN_IMAGE"),
            ui_proxy_image: non_empty("UI_PROXY_IMAGE"),
            node_labeller_image: non_empty("NODE_LABELLER_IMAGE"),
            csv_name: non_empty("CSV_NAME"),
            metrics_addr: non_empty("METRICS_ADDR").unwrap_or_else(|| DEFAULT_METRICS_ADDR.to_string()),
        })
    }

    /// Image reference for `var`, or a `MissingPrerequisite` error naming the variable.
    pub fn require_image<'a>(image: &'a Option<String>, var: &str) -> Result<&'a str, OperandError> {
        image
            .as_deref()
            .ok_or_else(|| OperandError::MissingPrerequisite(format!("{var} environment variable is not set")))
    }
}
