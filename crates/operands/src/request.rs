//! Per-pass reconciliation request.

use std::future::Future;

use crds::VirtPlatform;
use kube::ResourceExt;
use resource_store::StoreError;
use tokio_util::sync::CancellationToken;

use crate::cache::DesiredCache;
use crate::error::OperandError;

pub const CONDITION_RECONCILE_COMPLETE: &str = "ReconcileComplete";
pub const CONDITION_AVAILABLE: &str = "Available";
pub const CONDITION_PROGRESSING: &str = "Progressing";
pub const CONDITION_DEGRADED: &str = "Degraded";

/// A user-facing condition produced during a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionMessage {
    pub kind: String,
    pub status: bool,
    pub reason: String,
    pub message: String,
}

impl ConditionMessage {
    pub fn new(kind: &str, status: bool, reason: &str, message: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            status,
            reason: reason.to_string(),
            message: message.into(),
        }
    }
}

/// Everything one reconciliation pass needs: the desired configuration, the
/// provenance flag, accumulated conditions, cancellation and the desired
/// object cache.
///
/// A request serves exactly one pass; build a fresh one for the next pass.
#[derive(Debug)]
pub struct OperandRequest {
    pub platform: VirtPlatform,
    /// The pass was provoked by a change to the VirtPlatform itself
    pub operator_triggered: bool,
    /// The recorded operator version differs from the running one
    pub upgrade_mode: bool,
    pub conditions: Vec<ConditionMessage>,
    pub cancel: CancellationToken,
    pub cache: DesiredCache,
}

impl OperandRequest {
    pub fn new(platform: VirtPlatform) -> Self {
        Self {
            platform,
            operator_triggered: false,
            upgrade_mode: false,
            conditions: Vec::new(),
            cancel: CancellationToken::new(),
            cache: DesiredCache::default(),
        }
    }

    #[must_use]
    pub fn operator_triggered(mut self, triggered: bool) -> Self {
        self.operator_triggered = triggered;
        self
    }

    #[must_use]
    pub fn upgrade_mode(mut self, upgrade: bool) -> Self {
        self.upgrade_mode = upgrade;
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Name of the VirtPlatform being reconciled
    pub fn platform_name(&self) -> String {
        self.platform.name_any()
    }

    pub fn add_condition(&mut self, condition: ConditionMessage) {
        self.conditions.push(condition);
    }

    /// Drop every cached desired object.
    pub fn reset(&mut self) {
        self.cache.reset();
    }

    /// Runs a store call unless the request is cancelled first.
    pub async fn guard<T, F>(&self, call: F) -> Result<T, OperandError>
    where
        F: Future<Output = Result<T, StoreError>> + Send,
    {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(OperandError::Cancelled),
            res = call => res.map_err(OperandError::from),
        }
    }
}
