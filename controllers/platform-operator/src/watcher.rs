//! Kubernetes resource watchers.
//!
//! Drives reconciliation with `kube_runtime::Controller`. Besides the
//! VirtPlatform itself, the operand kinds that users are likely to edit by
//! hand are watched so that drift is corrected promptly instead of on the
//! next periodic requeue. Operands are mapped back to their VirtPlatform
//! through the `app` label the operator stamps on them.

use crate::error::ControllerError;
use crate::reconciler::{resource_key, Reconciler};
use crds::VirtPlatform;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use k8s_openapi::api::core::v1::{ConfigMap, Service};
use kube::{Api, Client, Resource, ResourceExt};
use kube_runtime::reflector::ObjectRef;
use kube_runtime::{controller::{Action, Config as ControllerConfig}, watcher, Controller};
use operands::labels::{APP_LABEL, MANAGED_BY, MANAGED_BY_LABEL};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Map a managed operand back to the VirtPlatform it belongs to
fn owning_platform<K: Resource>(obj: &K, namespace: &str) -> Option<ObjectRef<VirtPlatform>> {
    obj.labels()
        .get(APP_LABEL)
        .map(|name| ObjectRef::new(name).within(namespace))
}

/// Watcher config limited to objects this operator manages
fn managed_objects() -> watcher::Config {
    watcher::Config::default().labels(&format!("{MANAGED_BY_LABEL}={MANAGED_BY}"))
}

/// Watches VirtPlatform resources and their operands.
pub struct Watcher {
    reconciler: Arc<Reconciler>,
    client: Client,
    namespace: String,
}

impl Watcher {
    pub fn new(reconciler: Arc<Reconciler>, client: Client, namespace: String) -> Self {
        Self {
            reconciler,
            client,
            namespace,
        }
    }

    /// Run until `shutdown` is cancelled.
    pub async fn watch_platforms(&self, shutdown: CancellationToken) -> Result<(), ControllerError> {
        info!("Starting VirtPlatform watcher in namespace {}", self.namespace);

        let ns = self.namespace.as_str();
        let platforms: Api<VirtPlatform> = Api::namespaced(self.client.clone(), ns);
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), ns);
        let daemon_sets: Api<DaemonSet> = Api::namespaced(self.client.clone(), ns);
        let config_maps: Api<ConfigMap> = Api::namespaced(self.client.clone(), ns);
        let services: Api<Service> = Api::namespaced(self.client.clone(), ns);

        // Error policy: requeue with Fibonacci backoff per platform
        let error_policy = |obj: Arc<VirtPlatform>, error: &ControllerError, ctx: Arc<Reconciler>| {
            let (delay, errors) = ctx.next_backoff(&resource_key(&obj));
            error!(
                "Reconciliation error for VirtPlatform {} (attempt {}), retrying in {:?}: {}",
                obj.name_any(),
                errors,
                delay,
                error
            );
            Action::requeue(delay)
        };

        let reconcile = |obj: Arc<VirtPlatform>, ctx: Arc<Reconciler>| async move {
            debug!("Reconciling VirtPlatform {}", obj.name_any());
            ctx.reconcile_platform(&obj).await
        };

        // A single pass converges every operand, so passes are serialized.
        // Debounce batches the burst of operand events a pass itself causes.
        let controller_config = ControllerConfig::default()
            .debounce(Duration::from_secs(2))
            .concurrency(1);

        let d_ns = self.namespace.clone();
        let ds_ns = self.namespace.clone();
        let cm_ns = self.namespace.clone();
        let svc_ns = self.namespace.clone();

        Controller::new(platforms, watcher::Config::default())
            .watches(deployments, managed_objects(), move |obj| owning_platform(&obj, &d_ns))
            .watches(daemon_sets, managed_objects(), move |obj| owning_platform(&obj, &ds_ns))
            .watches(config_maps, managed_objects(), move |obj| owning_platform(&obj, &cm_ns))
            .watches(services, managed_objects(), move |obj| owning_platform(&obj, &svc_ns))
            .with_config(controller_config)
            .graceful_shutdown_on(shutdown.cancelled_owned())
            .run(reconcile, error_policy, self.reconciler.clone())
            .for_each(|res| async move {
                match res {
                    Ok((obj, _)) => debug!("Reconciled {}", obj.name),
                    Err(e) => error!("Controller error for VirtPlatform: {}", e),
                }
            })
            .await;

        info!("VirtPlatform watcher stopped");
        Ok(())
    }
}
