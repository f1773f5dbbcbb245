//! Outcome of one `ensure` call.

use crate::error::OperandError;

/// What `ensure` did to one managed resource.
///
/// At most one of `created`, `updated` and `deleted` is set. `overwritten`
/// and `upgrade_done` are auxiliary.
#[derive(Debug, Default)]
pub struct EnsureResult {
    pub name: String,
    pub created: bool,
    pub updated: bool,
    pub deleted: bool,
    /// The update reverted a change not made through the VirtPlatform
    pub overwritten: bool,
    /// The resource is at the running operator version and ready
    pub upgrade_done: bool,
    pub err: Option<OperandError>,
}

impl EnsureResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn set_created(mut self) -> Self {
        self.created = true;
        self
    }

    #[must_use]
    pub fn set_updated(mut self) -> Self {
        self.updated = true;
        self
    }

    #[must_use]
    pub fn set_deleted(mut self) -> Self {
        self.deleted = true;
        self
    }

    #[must_use]
    pub fn set_overwritten(mut self, overwritten: bool) -> Self {
        self.overwritten = overwritten;
        self
    }

    #[must_use]
    pub fn set_upgrade_done(mut self, done: bool) -> Self {
        self.upgrade_done = done;
        self
    }

    #[must_use]
    pub fn error(mut self, err: OperandError) -> Self {
        self.err = Some(err);
        self
    }

    pub fn is_ok(&self) -> bool {
        self.err.is_none()
    }

    /// Whether a mutating call was made
    pub fn changed(&self) -> bool {
        self.created || self.updated || self.deleted
    }
}
