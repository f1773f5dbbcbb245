//! Annotations published on the operator's ClusterServiceVersion.

use std::collections::BTreeMap;

use crds::{ClusterServiceVersion, ClusterServiceVersionSpec, VirtPlatform, CONSOLE_PLUGINS_ANNOTATION};

use super::ui::PLUGIN_NAME;
use crate::config::OperatorConfig;
use crate::error::OperandError;

/// Annotation written by older operator versions while an upgrade ran
pub const LEGACY_UPGRADE_ANNOTATION: &str = "virtops.microscaler.io/upgrade-in-progress";

/// Desired annotations: the plugin list plus the user's extra annotations.
pub fn csv_annotations(platform: &VirtPlatform) -> Result<BTreeMap<String, String>, OperandError> {
    let mut annotations = platform.spec.annotations.clone();
    annotations.insert(
        CONSOLE_PLUGINS_ANNOTATION.to_string(),
        serde_json::to_string(&[PLUGIN_NAME])?,
    );
    Ok(annotations)
}

/// The configured ClusterServiceVersion carrying only the desired annotations
pub fn cluster_service_version(
    platform: &VirtPlatform,
    config: &OperatorConfig,
) -> Result<ClusterServiceVersion, OperandError> {
    let name = config
        .csv_name
        .as_deref()
        .ok_or_else(|| OperandError::MissingPrerequisite("CSV_NAME environment variable is not set".to_string()))?;
    let mut csv = ClusterServiceVersion::new(name, ClusterServiceVersionSpec::default());
    csv.metadata.namespace = Some(config.namespace.clone());
    csv.metadata.annotations = Some(csv_annotations(platform)?);
    Ok(csv)
}
