//! The ordered set of operands converged on every pass.

use std::sync::Arc;

use kube::discovery::ApiResource;
use resource_store::ResourceStoreTrait;
use tracing::{debug, error, info};

use crds::{UninstallStrategy, VirtPlatform};

use crate::components::{csv, node_labeller, priority_class, ui, PRIORITY_CLASS_NAME};
use crate::conditional::ConditionalOperand;
use crate::config::OperatorConfig;
use crate::error::OperandError;
use crate::generic::{GenericOperand, Operand};
use crate::hooks::{
    ConfigMapHooks, ConsolePluginHooks, ConsoleRegistrationHooks, CsvAnnotationHooks, DaemonSetHooks,
    DeploymentHooks, PriorityClassHooks, RoleBindingHooks, RoleHooks, ServiceHooks,
};
use crate::metrics::Metrics;
use crate::request::{ConditionMessage, OperandRequest, CONDITION_RECONCILE_COMPLETE};
use crate::result::EnsureResult;

pub const REASON_RECONCILE_COMPLETED: &str = "ReconcileCompleted";
pub const REASON_RECONCILE_FAILED: &str = "ReconcileFailed";
pub const REASON_UNINSTALL_BLOCKED: &str = "UninstallBlocked";

/// Workloads that block uninstall under `BlockUninstallIfWorkloadsExist`
pub fn virtual_machine_resource() -> ApiResource {
    ApiResource {
        group: "kubevirt.io".to_string(),
        version: "v1".to_string(),
        api_version: "kubevirt.io/v1".to_string(),
        kind: "VirtualMachine".to_string(),
        plural: "virtualmachines".to_string(),
    }
}

/// Aggregate of the results of one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub overwritten: usize,
    pub all_upgrade_done: bool,
}

impl PassSummary {
    fn new() -> Self {
        Self {
            all_upgrade_done: true,
            ..Default::default()
        }
    }

    fn add(&mut self, result: &EnsureResult) {
        self.created += usize::from(result.created);
        self.updated += usize::from(result.updated);
        self.deleted += usize::from(result.deleted);
        self.overwritten += usize::from(result.overwritten);
        self.all_upgrade_done &= result.upgrade_done;
    }

    /// Anything was created, updated or deleted
    pub fn changed(&self) -> bool {
        self.created + self.updated + self.deleted > 0
    }
}

fn gated<H, F>(store: &Arc<dyn ResourceStoreTrait>, hooks: H, gate: F) -> Box<dyn Operand>
where
    H: crate::hooks::OperandHooks + 'static,
    F: Fn(&VirtPlatform) -> bool + Send + Sync + 'static,
{
    Box::new(ConditionalOperand::new(GenericOperand::new(Arc::clone(store), hooks), gate))
}

fn plugin_enabled(platform: &VirtPlatform) -> bool {
    platform.spec.feature_gates.deploy_console_plugin
}

fn proxy_enabled(platform: &VirtPlatform) -> bool {
    platform.spec.feature_gates.deploy_console_proxy
}

fn node_labeller_enabled(platform: &VirtPlatform) -> bool {
    platform.spec.feature_gates.deploy_node_labeller
}

/// Operands in the order they are converged.
///
/// The priority class comes first since every pod references it; config
/// maps and services come before the deployments that mount or sit behind
/// them.
pub fn standard_operands(store: &Arc<dyn ResourceStoreTrait>, config: &Arc<OperatorConfig>) -> Vec<Box<dyn Operand>> {
    let cfg = || Arc::clone(config);
    let mut operands: Vec<Box<dyn Operand>> = vec![
        Box::new(GenericOperand::new(
            Arc::clone(store),
            PriorityClassHooks::new(PRIORITY_CLASS_NAME, cfg(), priority_class::priority_class),
        )),
        gated(
            store,
            ConfigMapHooks::new(ui::NGINX_CONFIG_MAP_NAME, cfg(), ui::nginx_config_map),
            plugin_enabled,
        ),
        gated(
            store,
            ConfigMapHooks::new(ui::USER_SETTINGS_CONFIG_MAP_NAME, cfg(), ui::user_settings_config_map)
                .keep_user_data(),
            plugin_enabled,
        ),
        gated(
            store,
            ConfigMapHooks::new(ui::FEATURES_CONFIG_MAP_NAME, cfg(), ui::features_config_map),
            plugin_enabled,
        ),
        gated(
            store,
            RoleHooks::new(ui::UI_CONFIG_READER_ROLE_NAME, cfg(), ui::ui_config_reader_role),
            plugin_enabled,
        ),
        gated(
            store,
            RoleBindingHooks::new(
                ui::UI_CONFIG_READER_BINDING_NAME,
                cfg(),
                ui::ui_config_reader_role_binding,
            ),
            plugin_enabled,
        ),
        gated(
            store,
            ServiceHooks::new(ui::PLUGIN_SERVICE_NAME, cfg(), ui::plugin_service),
            plugin_enabled,
        ),
        gated(
            store,
            DeploymentHooks::new(ui::PLUGIN_DEPLOYMENT_NAME, cfg(), ui::plugin_deployment),
            plugin_enabled,
        ),
        gated(
            store,
            ServiceHooks::new(ui::PROXY_SERVICE_NAME, cfg(), ui::proxy_service),
            proxy_enabled,
        ),
        gated(
            store,
            DeploymentHooks::new(ui::PROXY_DEPLOYMENT_NAME, cfg(), ui::proxy_deployment),
            proxy_enabled,
        ),
        gated(
            store,
            DaemonSetHooks::new(
                node_labeller::NODE_LABELLER_NAME,
                cfg(),
                node_labeller::node_labeller_daemonset,
            ),
            node_labeller_enabled,
        ),
        gated(
            store,
            ConsolePluginHooks::new(ui::PLUGIN_NAME, cfg(), ui::console_plugin),
            plugin_enabled,
        ),
        gated(
            store,
            ConsoleRegistrationHooks::new(cfg(), ui::console_registration),
            plugin_enabled,
        ),
    ];

    if config.csv_name.is_some() {
        operands.push(Box::new(GenericOperand::new(
            Arc::clone(store),
            CsvAnnotationHooks::new(cfg(), csv::cluster_service_version),
        )));
    }
    operands
}

pub struct OperandHandler {
    store: Arc<dyn ResourceStoreTrait>,
    metrics: Arc<Metrics>,
    operands: Vec<Box<dyn Operand>>,
}

impl std::fmt::Debug for OperandHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperandHandler")
            .field("operands", &self.operands.iter().map(|o| o.kind_name()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl OperandHandler {
    /// Handler with the standard operand list
    pub fn new(store: Arc<dyn ResourceStoreTrait>, config: Arc<OperatorConfig>, metrics: Arc<Metrics>) -> Self {
        let operands = standard_operands(&store, &config);
        Self::with_operands(store, metrics, operands)
    }

    pub fn with_operands(
        store: Arc<dyn ResourceStoreTrait>,
        metrics: Arc<Metrics>,
        operands: Vec<Box<dyn Operand>>,
    ) -> Self {
        Self {
            store,
            metrics,
            operands,
        }
    }

    pub fn len(&self) -> usize {
        self.operands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operands.is_empty()
    }

    /// Converge every operand in order. Stops at the first failure, which is
    /// also recorded as a `ReconcileComplete=False` condition on the request.
    pub async fn ensure(&self, req: &mut OperandRequest) -> Result<PassSummary, OperandError> {
        req.reset();
        let mut summary = PassSummary::new();

        for operand in &self.operands {
            let result = operand.ensure(req).await;
            self.metrics.record_result(operand.kind_name(), &result);
            if let Some(err) = result.err {
                error!("Failed to ensure {} {}: {}", operand.kind_name(), result.name, err);
                req.add_condition(ConditionMessage::new(
                    CONDITION_RECONCILE_COMPLETE,
                    false,
                    REASON_RECONCILE_FAILED,
                    format!("Failed to ensure {} {}: {}", operand.kind_name(), result.name, err),
                ));
                self.metrics.record_pass("error");
                return Err(err);
            }
            debug!(
                "{} {}: created={} updated={} deleted={} upgrade_done={}",
                operand.kind_name(),
                result.name,
                result.created,
                result.updated,
                result.deleted,
                result.upgrade_done
            );
            summary.add(&result);
        }

        req.add_condition(ConditionMessage::new(
            CONDITION_RECONCILE_COMPLETE,
            true,
            REASON_RECONCILE_COMPLETED,
            "Reconcile completed successfully",
        ));
        self.metrics
            .record_pass(if summary.changed() { "changed" } else { "unchanged" });
        Ok(summary)
    }

    /// Remove every operand, last first.
    ///
    /// Under `BlockUninstallIfWorkloadsExist` nothing is removed while any
    /// virtual machine exists in the cluster.
    pub async fn ensure_deleted(&self, req: &mut OperandRequest) -> Result<PassSummary, OperandError> {
        if req.platform.spec.uninstall_strategy == UninstallStrategy::BlockUninstallIfWorkloadsExist {
            let vms = match req.guard(self.store.list(&virtual_machine_resource(), None)).await {
                Ok(vms) => vms,
                // VirtualMachine CRD not installed
                Err(e) if e.is_not_found() => Vec::new(),
                Err(e) => return Err(e),
            };
            if !vms.is_empty() {
                let message = format!(
                    "{} virtual machine(s) still exist; remove them or set uninstallStrategy to RemoveWorkloads",
                    vms.len()
                );
                req.add_condition(ConditionMessage::new(
                    CONDITION_RECONCILE_COMPLETE,
                    false,
                    REASON_UNINSTALL_BLOCKED,
                    message.clone(),
                ));
                return Err(OperandError::UninstallBlocked(message));
            }
        }

        let mut summary = PassSummary::new();
        for operand in self.operands.iter().rev() {
            let result = operand.ensure_deleted(req).await;
            self.metrics.record_result(operand.kind_name(), &result);
            if let Some(err) = result.err {
                return Err(err);
            }
            summary.add(&result);
        }
        info!("Removed {} operand(s) of {}", summary.deleted, req.platform_name());
        Ok(summary)
    }
}
