//! Helper functions for the VirtPlatform reconciliation pass
//!
//! Pure functions: provenance, upgrade detection, status construction,
//! finalizer bookkeeping and requeue selection. The reconciler wires them to
//! the API server.

use std::time::Duration;

use chrono::{DateTime, Utc};
use crds::{ComponentVersion, OPERATOR_VERSION_NAME, PlatformCondition, VirtPlatform, VirtPlatformStatus};
use kube::ResourceExt;
use operands::request::{CONDITION_AVAILABLE, CONDITION_DEGRADED, CONDITION_PROGRESSING};
use operands::{ConditionMessage, PassSummary};

/// Finalizer that keeps the VirtPlatform around until its operands are removed
pub const PLATFORM_FINALIZER: &str = "virtops.microscaler.io/finalizer";

/// Requeue delay after a pass that changed something
pub const REQUEUE_CHANGED: Duration = Duration::from_secs(10);

/// Requeue delay after a quiet pass (periodic drift check)
pub const REQUEUE_STEADY: Duration = Duration::from_secs(300);

/// Requeue delay while uninstall is blocked by remaining workloads
pub const REQUEUE_BLOCKED: Duration = Duration::from_secs(30);

/// The pass was provoked by an edit of the VirtPlatform spec.
///
/// `metadata.generation` only moves on spec edits, so a generation the
/// operator has not yet converged to means the user asked for a change.
/// Anything else (a watched operand changing, a periodic requeue) is treated
/// as external.
pub fn is_operator_triggered(platform: &VirtPlatform) -> bool {
    let observed = platform.status.as_ref().and_then(|s| s.observed_generation);
    match (platform.metadata.generation, observed) {
        (Some(generation), Some(observed)) => generation != observed,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// The recorded operator version differs from the running one.
///
/// A fresh install has no recorded version and is not an upgrade.
pub fn is_upgrade(platform: &VirtPlatform, running_version: &str) -> bool {
    platform
        .status
        .as_ref()
        .and_then(|s| s.version_of(OPERATOR_VERSION_NAME))
        .is_some_and(|recorded| recorded != running_version)
}

pub fn has_finalizer(platform: &VirtPlatform) -> bool {
    platform.finalizers().iter().any(|f| f == PLATFORM_FINALIZER)
}

/// Finalizer list with ours appended, or `None` if already present
pub fn finalizers_with(platform: &VirtPlatform) -> Option<Vec<String>> {
    if has_finalizer(platform) {
        return None;
    }
    let mut finalizers = platform.finalizers().to_vec();
    finalizers.push(PLATFORM_FINALIZER.to_string());
    Some(finalizers)
}

/// Finalizer list with ours removed
pub fn finalizers_without(platform: &VirtPlatform) -> Vec<String> {
    platform
        .finalizers()
        .iter()
        .filter(|f| f.as_str() != PLATFORM_FINALIZER)
        .cloned()
        .collect()
}

fn status_str(status: bool) -> &'static str {
    if status { "True" } else { "False" }
}

/// Insert or replace a condition, keeping `lastTransitionTime` when the
/// status did not flip.
pub fn set_condition(conditions: &mut Vec<PlatformCondition>, message: &ConditionMessage, now: DateTime<Utc>) {
    let status = status_str(message.status);
    match conditions.iter_mut().find(|c| c.type_ == message.kind) {
        Some(existing) => {
            if existing.status != status {
                existing.last_transition_time = Some(now);
            }
            existing.status = status.to_string();
            existing.reason = message.reason.clone();
            existing.message = message.message.clone();
        }
        None => conditions.push(PlatformCondition {
            type_: message.kind.clone(),
            status: status.to_string(),
            reason: message.reason.clone(),
            message: message.message.clone(),
            last_transition_time: Some(now),
        }),
    }
}

/// Conditions derived from the pass outcome on top of the ones the handler
/// recorded.
///
/// `summary` is `None` when the pass failed.
pub fn derived_conditions(summary: Option<&PassSummary>, upgrade_mode: bool) -> Vec<ConditionMessage> {
    match summary {
        None => vec![
            ConditionMessage::new(CONDITION_AVAILABLE, false, "ReconcileFailed", "Operands could not be converged"),
            ConditionMessage::new(CONDITION_PROGRESSING, false, "ReconcileFailed", "Operands could not be converged"),
            ConditionMessage::new(CONDITION_DEGRADED, true, "ReconcileFailed", "Operands could not be converged"),
        ],
        Some(summary) => {
            let rolling = upgrade_mode && !summary.all_upgrade_done;
            let progressing = summary.changed() || rolling;
            let progressing_message = if rolling {
                "Upgrade in progress"
            } else if progressing {
                "Operands are being updated"
            } else {
                "All operands converged"
            };
            vec![
                ConditionMessage::new(
                    CONDITION_AVAILABLE,
                    !rolling,
                    if rolling { "UpgradeInProgress" } else { "AsExpected" },
                    if rolling { "Upgrade in progress" } else { "All operands are available" },
                ),
                ConditionMessage::new(
                    CONDITION_PROGRESSING,
                    progressing,
                    if progressing { "Reconciling" } else { "AsExpected" },
                    progressing_message,
                ),
                ConditionMessage::new(CONDITION_DEGRADED, false, "AsExpected", "No operand is degraded"),
            ]
        }
    }
}

/// Status to publish after a pass.
///
/// On success `observedGeneration` moves to the current generation; on
/// failure it stays, so the next pass is still attributed to the user. The
/// operator version is recorded once every operand reports its rollout done.
pub fn build_status(
    platform: &VirtPlatform,
    messages: &[ConditionMessage],
    summary: Option<&PassSummary>,
    upgrade_mode: bool,
    running_version: &str,
    now: DateTime<Utc>,
) -> VirtPlatformStatus {
    let mut status = platform.status.clone().unwrap_or_default();

    for message in messages
        .iter()
        .chain(derived_conditions(summary, upgrade_mode).iter())
    {
        set_condition(&mut status.conditions, message, now);
    }

    if let Some(summary) = summary {
        status.observed_generation = platform.metadata.generation;
        if summary.all_upgrade_done {
            record_version(&mut status.versions, OPERATOR_VERSION_NAME, running_version);
        }
    }
    status
}

/// Status to publish while uninstall is refused
pub fn blocked_status(platform: &VirtPlatform, messages: &[ConditionMessage], now: DateTime<Utc>) -> VirtPlatformStatus {
    let mut status = platform.status.clone().unwrap_or_default();
    for message in messages {
        set_condition(&mut status.conditions, message, now);
    }
    status
}

fn record_version(versions: &mut Vec<ComponentVersion>, name: &str, version: &str) {
    match versions.iter_mut().find(|v| v.name == name) {
        Some(existing) => existing.version = version.to_string(),
        None => versions.push(ComponentVersion {
            name: name.to_string(),
            version: version.to_string(),
        }),
    }
}

/// Requeue sooner after a pass that changed things, so rollouts are
/// observed and versions recorded promptly.
pub fn requeue_after(summary: &PassSummary, upgrade_mode: bool) -> Duration {
    if summary.changed() || (upgrade_mode && !summary.all_upgrade_done) {
        REQUEUE_CHANGED
    } else {
        REQUEUE_STEADY
    }
}
