//! The generic operand: one `ensure` algorithm for every managed kind.

use std::sync::Arc;

use async_trait::async_trait;
use kube::Resource;
use resource_store::{ResourceKey, ResourceStoreTrait};
use tracing::{debug, info, warn};

use crate::error::OperandError;
use crate::hooks::{ConvergeStrategy, OperandHooks};
use crate::labels::merge_labels;
use crate::object::{from_dynamic, key_of, to_dynamic, ManagedObject};
use crate::request::OperandRequest;
use crate::result::EnsureResult;

/// Anything the handler can converge or remove.
#[async_trait]
pub trait Operand: Send + Sync {
    fn kind_name(&self) -> &'static str;

    /// Drive the managed resource toward its desired state.
    async fn ensure(&self, req: &mut OperandRequest) -> EnsureResult;

    /// Remove the managed resource if present.
    async fn ensure_deleted(&self, req: &OperandRequest) -> EnsureResult;
}

pub struct GenericOperand<H> {
    store: Arc<dyn ResourceStoreTrait>,
    hooks: H,
}

impl<H: OperandHooks> GenericOperand<H> {
    pub fn new(store: Arc<dyn ResourceStoreTrait>, hooks: H) -> Self {
        Self { store, hooks }
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    fn identity(&self, req: &OperandRequest) -> ResourceKey {
        key_of(&self.hooks.empty(&req.platform))
    }

    async fn converge_once(&self, req: &mut OperandRequest, key: &ResourceKey) -> Result<EnsureResult, OperandError> {
        let kind = self.hooks.kind_name();
        let result = EnsureResult::new(&key.name);

        let desired = {
            let platform = &req.platform;
            let hooks = &self.hooks;
            req.cache
                .get_or_build(&key.to_string(), || hooks.build_desired(platform))?
        };

        let found = match req.guard(self.store.get(key)).await {
            Ok(obj) => obj,
            Err(e) if e.is_not_found() => {
                if !self.hooks.create_if_missing() {
                    debug!("{} {} does not exist, nothing to adjust", kind, key);
                    return Ok(result.set_upgrade_done(true));
                }
                info!("Creating {} {}", kind, key);
                let obj = to_dynamic(&desired)?;
                req.guard(self.store.create(&key.resource, &obj)).await?;
                return Ok(result.set_created());
            }
            Err(e) => return Err(e),
        };

        let mut found: H::Object = from_dynamic(&found)?;
        if self.hooks.matches_desired(&found, &desired) {
            debug!("{} {} already matches the desired state", kind, key);
            let done = self.hooks.is_ready(&found) && self.hooks.component_version_matches(&found);
            return Ok(result.set_upgrade_done(done));
        }

        if req.operator_triggered {
            info!("Updating existing {} to new opinionated values", kind);
        } else {
            info!("Reconciling an externally updated {} to its opinionated values", kind);
        }

        if self.hooks.requires_recreate(&found, &desired) {
            info!("{} {} differs in an immutable field, recreating it", kind, key);
            match req.guard(self.store.delete(key)).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
            let obj = to_dynamic(&with_found_labels(&found, desired))?;
            req.guard(self.store.create(&key.resource, &obj)).await?;
        } else {
            match self.hooks.strategy() {
                ConvergeStrategy::Update => {
                    self.hooks.converge(&mut found, &desired);
                    let obj = to_dynamic(&found)?;
                    req.guard(self.store.update(&key.resource, &obj)).await?;
                }
                ConvergeStrategy::Patch => {
                    let patch = self.hooks.patch_for(&found, &desired)?;
                    req.guard(self.store.patch(key, &patch)).await?;
                }
            }
        }

        Ok(result.set_updated().set_overwritten(!req.operator_triggered))
    }
}

/// Desired object carrying the labels others put on the found one; desired wins.
fn with_found_labels<K: ManagedObject>(found: &K, mut desired: K) -> K {
    let mut labels = found.meta().labels.clone();
    merge_labels(&mut labels, desired.meta().labels.as_ref());
    desired.meta_mut().labels = labels;
    desired
}

#[async_trait]
impl<H: OperandHooks> Operand for GenericOperand<H> {
    fn kind_name(&self) -> &'static str {
        self.hooks.kind_name()
    }

    async fn ensure(&self, req: &mut OperandRequest) -> EnsureResult {
        let key = self.identity(req);
        let result = match self.converge_once(req, &key).await {
            Ok(result) => result,
            Err(e) => return EnsureResult::new(&key.name).error(e),
        };

        if let Err(e) = self.hooks.finalize(req, self.store.as_ref()).await {
            warn!("Finalizing {} {} failed: {}", self.hooks.kind_name(), key, e);
        }
        result
    }

    async fn ensure_deleted(&self, req: &OperandRequest) -> EnsureResult {
        let key = self.identity(req);
        let result = EnsureResult::new(&key.name);
        if !self.hooks.create_if_missing() {
            return result.set_upgrade_done(true);
        }

        match req.guard(self.store.get(&key)).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => return result.set_upgrade_done(true),
            Err(e) => return result.error(e),
        }

        info!("Deleting {} {}", self.hooks.kind_name(), key);
        match req.guard(self.store.delete(&key)).await {
            Ok(()) => result.set_deleted().set_upgrade_done(true),
            Err(e) if e.is_not_found() => result.set_upgrade_done(true),
            Err(e) => result.error(e),
        }
    }
}

