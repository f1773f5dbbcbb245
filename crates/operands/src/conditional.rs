//! Operands deployed only when a feature gate allows it.

use async_trait::async_trait;
use crds::VirtPlatform;

use crate::generic::{GenericOperand, Operand};
use crate::hooks::OperandHooks;
use crate::request::OperandRequest;
use crate::result::EnsureResult;

/// Decides from the desired configuration whether the resource should exist
pub type DeployPredicate = Box<dyn Fn(&VirtPlatform) -> bool + Send + Sync>;

/// Wraps a generic operand: ensures it while the predicate holds, deletes it
/// otherwise.
pub struct ConditionalOperand<H> {
    inner: GenericOperand<H>,
    should_deploy: DeployPredicate,
}

impl<H: OperandHooks> ConditionalOperand<H> {
    pub fn new<F>(inner: GenericOperand<H>, should_deploy: F) -> Self
    where
        F: Fn(&VirtPlatform) -> bool + Send + Sync + 'static,
    {
        Self {
            inner,
            should_deploy: Box::new(should_deploy),
        }
    }
}

#[async_trait]
impl<H: OperandHooks> Operand for ConditionalOperand<H> {
    fn kind_name(&self) -> &'static str {
        self.inner.kind_name()
    }

    async fn ensure(&self, req: &mut OperandRequest) -> EnsureResult {
        if (self.should_deploy)(&req.platform) {
            self.inner.ensure(req).await
        } else {
            self.inner.ensure_deleted(req).await
        }
    }

    async fn ensure_deleted(&self, req: &OperandRequest) -> EnsureResult {
        self.inner.ensure_deleted(req).await
    }
}
