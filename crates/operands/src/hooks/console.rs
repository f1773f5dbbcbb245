//! Registration of the UI plugin with the cluster Console.
//!
//! The Console belongs to the console operator. It is never created or
//! deleted here; the plugin name is appended to its plugin list when missing.

use std::sync::Arc;

use async_trait::async_trait;
use crds::{Console, VirtPlatform, CLUSTER_CONSOLE_NAME};

use super::{Builder, OperandHooks};
use crate::config::OperatorConfig;
use crate::error::OperandError;

pub struct ConsoleRegistrationHooks {
    config: Arc<OperatorConfig>,
    build: Builder<Console>,
}

impl ConsoleRegistrationHooks {
    pub fn new(config: Arc<OperatorConfig>, build: Builder<Console>) -> Self {
        Self { config, build }
    }
}

#[async_trait]
impl OperandHooks for ConsoleRegistrationHooks {
    type Object = Console;

    fn kind_name(&self) -> &'static str {
        "Console"
    }

    fn build_desired(&self, platform: &VirtPlatform) -> Result<Console, OperandError> {
        (self.build)(platform, &self.config)
    }

    fn empty(&self, _platform: &VirtPlatform) -> Console {
        Console::new(CLUSTER_CONSOLE_NAME, Default::default())
    }

    fn matches_desired(&self, found: &Console, desired: &Console) -> bool {
        desired.spec.plugins.iter().all(|p| found.spec.plugins.contains(p))
    }

    fn converge(&self, found: &mut Console, desired: &Console) {
        for plugin in &desired.spec.plugins {
            if !found.spec.plugins.contains(plugin) {
                found.spec.plugins.push(plugin.clone());
            }
        }
    }

    fn create_if_missing(&self) -> bool {
        false
    }
}
