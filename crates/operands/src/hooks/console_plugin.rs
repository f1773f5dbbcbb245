//! ConsolePlugin hooks.

use std::sync::Arc;

use async_trait::async_trait;
use crds::{ConsolePlugin, VirtPlatform};

use super::{Builder, OperandHooks};
use crate::config::OperatorConfig;
use crate::error::OperandError;
use crate::labels::{labels_match, merge_labels};

pub struct ConsolePluginHooks {
    name: &'static str,
    config: Arc<OperatorConfig>,
    build: Builder<ConsolePlugin>,
}

impl ConsolePluginHooks {
    pub fn new(name: &'static str, config: Arc<OperatorConfig>, build: Builder<ConsolePlugin>) -> Self {
        Self { name, config, build }
    }
}

#[async_trait]
impl OperandHooks for ConsolePluginHooks {
    type Object = ConsolePlugin;

    fn kind_name(&self) -> &'static str {
        "ConsolePlugin"
    }

    fn build_desired(&self, platform: &VirtPlatform) -> Result<ConsolePlugin, OperandError> {
        (self.build)(platform, &self.config)
    }

    fn empty(&self, _platform: &VirtPlatform) -> ConsolePlugin {
        ConsolePlugin::new(self.name, Default::default())
    }

    fn matches_desired(&self, found: &ConsolePlugin, desired: &ConsolePlugin) -> bool {
        found.spec == desired.spec && labels_match(desired.metadata.labels.as_ref(), found.metadata.labels.as_ref())
    }

    fn converge(&self, found: &mut ConsolePlugin, desired: &ConsolePlugin) {
        merge_labels(&mut found.metadata.labels, desired.metadata.labels.as_ref());
        found.spec = desired.spec.clone();
    }
}
