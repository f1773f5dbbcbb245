//! Per-pass cache of built desired objects.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use crate::error::OperandError;

/// Desired objects built during the current pass, keyed by resource identity.
///
/// Owned by the request, so nothing survives into the next pass unless the
/// caller reuses the request; `reset` clears it explicitly.
#[derive(Default)]
pub struct DesiredCache {
    entries: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl fmt::Debug for DesiredCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesiredCache")
            .field("keys", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl DesiredCache {
    /// Returns the cached object for `key`, building and caching it on a miss.
    pub fn get_or_build<K, F>(&mut self, key: &str, build: F) -> Result<K, OperandError>
    where
        K: Clone + Send + Sync + 'static,
        F: FnOnce() -> Result<K, OperandError>,
    {
        if let Some(entry) = self.entries.get(key) {
            return entry.downcast_ref::<K>().cloned().ok_or_else(|| {
                OperandError::Contract(format!(
                    "cached desired object for {key} is not a {}",
                    std::any::type_name::<K>()
                ))
            });
        }
        let built = build()?;
        self.entries.insert(key.to_string(), Box::new(built.clone()));
        Ok(built)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }
}
