//! Prometheus counters for operand convergence.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::error::OperandError;
use crate::result::EnsureResult;

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    overwritten: IntCounterVec,
    operand_changes: IntCounterVec,
    reconcile_passes: IntCounterVec,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    /// Counters registered on a fresh registry
    pub fn new() -> Result<Self, OperandError> {
        Self::register(Registry::new())
    }

    pub fn register(registry: Registry) -> Result<Self, OperandError> {
        let overwritten = IntCounterVec::new(
            Opts::new(
                "virtops_overwritten_modifications_total",
                "Out-of-band modifications reverted by the operator",
            ),
            &["kind"],
        )?;
        let operand_changes = IntCounterVec::new(
            Opts::new("virtops_operand_changes_total", "Managed resources created, updated or deleted"),
            &["kind", "action"],
        )?;
        let reconcile_passes = IntCounterVec::new(
            Opts::new("virtops_reconcile_passes_total", "Reconciliation passes by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(overwritten.clone()))?;
        registry.register(Box::new(operand_changes.clone()))?;
        registry.register(Box::new(reconcile_passes.clone()))?;
        Ok(Self {
            registry,
            overwritten,
            operand_changes,
            reconcile_passes,
        })
    }

    pub fn record_result(&self, kind: &str, result: &EnsureResult) {
        if result.overwritten {
            self.overwritten.with_label_values(&[kind]).inc();
        }
        let action = if result.created {
            "created"
        } else if result.updated {
            "updated"
        } else if result.deleted {
            "deleted"
        } else {
            return;
        };
        self.operand_changes.with_label_values(&[kind, action]).inc();
    }

    pub fn record_pass(&self, outcome: &str) {
        self.reconcile_passes.with_label_values(&[outcome]).inc();
    }

    pub fn overwritten_count(&self, kind: &str) -> u64 {
        self.overwritten.with_label_values(&[kind]).get()
    }

    pub fn pass_count(&self, outcome: &str) -> u64 {
        self.reconcile_passes.with_label_values(&[outcome]).get()
    }

    /// Text exposition of every registered metric
    pub fn encode(&self) -> Result<String, OperandError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| OperandError::Contract(format!("metrics are not UTF-8: {e}")))
    }
}
