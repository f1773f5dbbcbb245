//! Reconciliation logic for the VirtPlatform CR.
//!
//! One pass builds an [`OperandRequest`] from the CR, hands it to the operand
//! handler and publishes the outcome on the CR status. Deletion runs the
//! handler in reverse behind a finalizer.

use crate::backoff::FibonacciBackoff;
use crate::error::ControllerError;
use crate::reconcile_helpers::{
    blocked_status, build_status, finalizers_with, finalizers_without, has_finalizer,
    is_operator_triggered, is_upgrade, requeue_after, REQUEUE_BLOCKED,
};
use chrono::Utc;
use crds::{VirtPlatform, VirtPlatformStatus};
use kube::api::{Patch, PatchParams};
use kube::{Api, ResourceExt};
use kube_runtime::controller::Action;
use operands::{OperandError, OperandHandler, OperandRequest, OperatorConfig};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Backoff state for a resource
#[derive(Debug, Clone)]
struct BackoffState {
    backoff: FibonacciBackoff,
    error_count: u32,
}

impl BackoffState {
    fn new() -> Self {
        Self {
            backoff: FibonacciBackoff::default(),
            error_count: 0,
        }
    }

    fn reset(&mut self) {
        self.error_count = 0;
        self.backoff.reset();
    }
}

/// Reconciles VirtPlatform resources.
pub struct Reconciler {
    platform_api: Api<VirtPlatform>,
    handler: OperandHandler,
    config: Arc<OperatorConfig>,
    /// Parent of every pass's cancellation token; cancelled on shutdown
    shutdown: CancellationToken,
    /// Error count tracking per resource (namespace/name -> BackoffState)
    backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl Reconciler {
    pub fn new(
        platform_api: Api<VirtPlatform>,
        handler: OperandHandler,
        config: Arc<OperatorConfig>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            platform_api,
            handler,
            config,
            shutdown,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run one reconciliation pass for a VirtPlatform.
    pub async fn reconcile_platform(&self, platform: &VirtPlatform) -> Result<Action, ControllerError> {
        let name = platform.name_any();

        if platform.metadata.deletion_timestamp.is_some() {
            return self.cleanup(platform).await;
        }

        if let Some(finalizers) = finalizers_with(platform) {
            debug!("Adding finalizer to VirtPlatform {}", name);
            self.patch_finalizers(&name, finalizers).await?;
        }

        let operator_triggered = is_operator_triggered(platform);
        let upgrade_mode = is_upgrade(platform, &self.config.version);
        if upgrade_mode {
            info!(
                "VirtPlatform {} records an older operator version, upgrading to {}",
                name, self.config.version
            );
        }

        let mut req = OperandRequest::new(platform.clone())
            .operator_triggered(operator_triggered)
            .upgrade_mode(upgrade_mode)
            .with_cancellation(self.shutdown.child_token());

        let outcome = self.handler.ensure(&mut req).await;

        let status = build_status(
            platform,
            &req.conditions,
            outcome.as_ref().ok(),
            upgrade_mode,
            &self.config.version,
            Utc::now(),
        );
        self.publish_status(platform, &status).await?;

        let summary = outcome?;
        self.reset_error(&resource_key(platform));
        info!(
            "Reconciled VirtPlatform {}: created={} updated={} deleted={} overwritten={}",
            name, summary.created, summary.updated, summary.deleted, summary.overwritten
        );
        Ok(Action::requeue(requeue_after(&summary, upgrade_mode)))
    }

    /// Remove the operands of a VirtPlatform being deleted, then release it.
    async fn cleanup(&self, platform: &VirtPlatform) -> Result<Action, ControllerError> {
        let name = platform.name_any();
        if !has_finalizer(platform) {
            return Ok(Action::await_change());
        }

        info!("VirtPlatform {} is being deleted, removing operands", name);
        let mut req = OperandRequest::new(platform.clone())
            .operator_triggered(true)
            .with_cancellation(self.shutdown.child_token());

        match self.handler.ensure_deleted(&mut req).await {
            Ok(summary) => {
                info!("Removed {} operand(s) of VirtPlatform {}", summary.deleted, name);
                self.patch_finalizers(&name, finalizers_without(platform)).await?;
                self.reset_error(&resource_key(platform));
                Ok(Action::await_change())
            }
            Err(OperandError::UninstallBlocked(message)) => {
                warn!("Uninstall of VirtPlatform {} blocked: {}", name, message);
                let status = blocked_status(platform, &req.conditions, Utc::now());
                self.publish_status(platform, &status).await?;
                Ok(Action::requeue(REQUEUE_BLOCKED))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn patch_finalizers(&self, name: &str, finalizers: Vec<String>) -> Result<(), ControllerError> {
        let patch = json!({ "metadata": { "finalizers": finalizers } });
        self.platform_api
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    /// Patch the status subresource, skipping the write when nothing moved
    async fn publish_status(&self, platform: &VirtPlatform, status: &VirtPlatformStatus) -> Result<(), ControllerError> {
        if platform.status.as_ref() == Some(status) {
            return Ok(());
        }
        let patch = json!({ "status": serde_json::to_value(status)? });
        self.platform_api
            .patch_status(&platform.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    /// Get the next backoff delay for a failing resource and count the failure
    pub fn next_backoff(&self, resource_key: &str) -> (Duration, u32) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                let state = states
                    .entry(resource_key.to_string())
                    .or_insert_with(BackoffState::new);
                state.error_count += 1;
                (state.backoff.next_backoff(), state.error_count)
            }
            Err(e) => {
                warn!("Failed to lock backoff_states: {}, using default backoff", e);
                (Duration::from_secs(60), 0)
            }
        }
    }

    /// Reset error count for a resource (on successful reconciliation)
    pub fn reset_error(&self, resource_key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            if let Some(state) = states.get_mut(resource_key) {
                state.reset();
            }
        }
    }
}

/// Backoff bookkeeping key (namespace/name)
pub fn resource_key(platform: &VirtPlatform) -> String {
    format!(
        "{}/{}",
        platform.namespace().unwrap_or_default(),
        platform.name_any()
    )
}
