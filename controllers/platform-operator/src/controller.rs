//! Main controller implementation.
//!
//! Builds the operand handler on top of a live API store and hands the
//! reconciler to the watcher.

use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crate::watcher::Watcher;
use crds::VirtPlatform;
use kube::{Api, Client};
use operands::{Metrics, OperandHandler, OperatorConfig};
use resource_store::{KubeStore, ResourceStoreTrait};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Main controller for VirtPlatform resources.
pub struct Controller {
    watcher: Watcher,
    shutdown: CancellationToken,
}

impl Controller {
    /// Creates a new controller instance.
    pub async fn new(
        config: Arc<OperatorConfig>,
        metrics: Arc<Metrics>,
        shutdown: CancellationToken,
    ) -> Result<Self, ControllerError> {
        info!("Initializing VirtPlatform controller");

        let kube_client = Client::try_default().await?;

        let store: Arc<dyn ResourceStoreTrait> = Arc::new(KubeStore::new(kube_client.clone()));
        let handler = OperandHandler::new(store, config.clone(), metrics);
        info!("Managing {} operand(s)", handler.len());

        let platform_api: Api<VirtPlatform> = Api::namespaced(kube_client.clone(), &config.namespace);
        let reconciler = Arc::new(Reconciler::new(
            platform_api,
            handler,
            config.clone(),
            shutdown.clone(),
        ));

        let watcher = Watcher::new(reconciler, kube_client, config.namespace.clone());
        Ok(Self { watcher, shutdown })
    }

    /// Runs the controller until shutdown.
    pub async fn run(&self) -> Result<(), ControllerError> {
        info!("Starting VirtPlatform controller");
        self.watcher.watch_platforms(self.shutdown.clone()).await
    }
}
