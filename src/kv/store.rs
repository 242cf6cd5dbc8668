//! # Key-value storage backends.
//!
//! [`KvStore`] holds JSON values addressed by `(namespace, key)`. The crate
//! ships [`MemoryKvStore`]; a durable backend implements the same trait.
//!
//! ## Contract
//! - `put` inserts or replaces every entry in one step.
//! - A namespace exists while it holds at least one key.
//! - `namespaces` is sorted.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::StoreError;

/// Namespaced JSON key-value storage.
#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    /// Inserts or replaces `entries` in `namespace`.
    async fn put(&self, namespace: &str, entries: Vec<(String, Value)>) -> Result<(), StoreError>;

    /// Value stored under `key`, if any.
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, StoreError>;

    /// Removes `keys`; missing keys are ignored.
    async fn remove(&self, namespace: &str, keys: &[String]) -> Result<(), StoreError>;

    /// Every non-empty namespace.
    async fn namespaces(&self) -> Result<Vec<String>, StoreError>;
}

/// Shared handle to a key-value store.
pub type KvStoreRef = Arc<dyn KvStore>;

/// In-memory [`KvStore`]. Contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryKvStore {
    spaces: Mutex<BTreeMap<String, BTreeMap<String, Value>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for MemoryKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryKvStore")
            .field("namespaces", &self.spaces.lock().len())
            .finish()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn put(&self, namespace: &str, entries: Vec<(String, Value)>) -> Result<(), StoreError> {
        if entries.is_empty() {
            return Ok(());
        }
        self.spaces
            .lock()
            .entry(namespace.to_string())
            .or_default()
            .extend(entries);
        Ok(())
    }

    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .spaces
            .lock()
            .get(namespace)
            .and_then(|space| space.get(key))
            .cloned())
    }

    async fn remove(&self, namespace: &str, keys: &[String]) -> Result<(), StoreError> {
        let mut spaces = self.spaces.lock();
        if let Some(space) = spaces.get_mut(namespace) {
            for key in keys {
                space.remove(key);
            }
            if space.is_empty() {
                spaces.remove(namespace);
            }
        }
        Ok(())
    }

    async fn namespaces(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.spaces.lock().keys().cloned().collect())
    }
}
