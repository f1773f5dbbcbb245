//! Annotations on the operator's own ClusterServiceVersion.
//!
//! The CSV is owned by OLM, so only the annotations listed in the desired
//! object are touched, through a JSON merge patch.

use std::sync::Arc;

use async_trait::async_trait;
use crds::{ClusterServiceVersion, VirtPlatform};
use resource_store::ResourceStoreTrait;
use serde_json::{json, Map, Value};
use tracing::info;

use super::{Builder, ConvergeStrategy, OperandHooks};
use crate::components::csv::LEGACY_UPGRADE_ANNOTATION;
use crate::config::OperatorConfig;
use crate::error::OperandError;
use crate::labels::{labels_match, merge_labels};
use crate::object::key_of;
use crate::request::OperandRequest;

pub struct CsvAnnotationHooks {
    config: Arc<OperatorConfig>,
    build: Builder<ClusterServiceVersion>,
}

impl CsvAnnotationHooks {
    pub fn new(config: Arc<OperatorConfig>, build: Builder<ClusterServiceVersion>) -> Self {
        Self { config, build }
    }
}

#[async_trait]
impl OperandHooks for CsvAnnotationHooks {
    type Object = ClusterServiceVersion;

    fn kind_name(&self) -> &'static str {
        "ClusterServiceVersion"
    }

    fn build_desired(&self, platform: &VirtPlatform) -> Result<ClusterServiceVersion, OperandError> {
        (self.build)(platform, &self.config)
    }

    fn empty(&self, _platform: &VirtPlatform) -> ClusterServiceVersion {
        let mut csv = ClusterServiceVersion::new(self.config.csv_name.as_deref().unwrap_or_default(), Default::default());
        csv.metadata.namespace = Some(self.config.namespace.clone());
        csv
    }

    fn matches_desired(&self, found: &ClusterServiceVersion, desired: &ClusterServiceVersion) -> bool {
        labels_match(desired.metadata.annotations.as_ref(), found.metadata.annotations.as_ref())
    }

    fn converge(&self, found: &mut ClusterServiceVersion, desired: &ClusterServiceVersion) {
        merge_labels(&mut found.metadata.annotations, desired.metadata.annotations.as_ref());
    }

    fn strategy(&self) -> ConvergeStrategy {
        ConvergeStrategy::Patch
    }

    /// Only the annotations that differ are sent.
    fn patch_for(&self, found: &ClusterServiceVersion, desired: &ClusterServiceVersion) -> Result<Value, OperandError> {
        let current = found.metadata.annotations.clone().unwrap_or_default();
        let changed: Map<String, Value> = desired
            .metadata
            .annotations
            .iter()
            .flatten()
            .filter(|(k, v)| current.get(*k) != Some(*v))
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Ok(json!({ "metadata": { "annotations": changed } }))
    }

    fn create_if_missing(&self) -> bool {
        false
    }

    /// Drops the annotation older operator versions left behind during upgrades.
    async fn finalize(&self, req: &OperandRequest, store: &dyn ResourceStoreTrait) -> Result<(), OperandError> {
        if !req.upgrade_mode {
            return Ok(());
        }
        let key = key_of(&self.empty(&req.platform));
        let csv = match req.guard(store.get(&key)).await {
            Ok(csv) => csv,
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(e),
        };
        let has_legacy = csv
            .metadata
            .annotations
            .as_ref()
            .is_some_and(|a| a.contains_key(LEGACY_UPGRADE_ANNOTATION));
        if has_legacy {
            info!("Removing {} from {}", LEGACY_UPGRADE_ANNOTATION, key);
            let patch = json!({ "metadata": { "annotations": { LEGACY_UPGRADE_ANNOTATION: null } } });
            req.guard(store.patch(&key, &patch)).await?;
        }
        Ok(())
    }
}
