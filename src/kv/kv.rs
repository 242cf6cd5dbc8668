//! # Kv: typed accessor to one namespace.
//!
//! Values are converted to JSON with `serde` on write and parsed back on read.
//! [`Kv::save`] / [`Kv::load`] store one value per type, keyed by the short type
//! name (`my_app::Settings` → `"Settings"`).

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::StoreError;
use crate::kv::store::KvStoreRef;

/// Namespaced key-value accessor.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use binp::{Kv, MemoryKvStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), binp::StoreError> {
/// let kv = Kv::new(Arc::new(MemoryKvStore::new()), "default");
/// kv.set([("threshold", 0.3), ("ratio", 1.5)]).await?;
/// assert_eq!(kv.get::<f64>("threshold").await?, Some(0.3));
///
/// let other = kv.select("other");
/// assert_eq!(other.get::<f64>("threshold").await?, None);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Kv {
    store: KvStoreRef,
    namespace: String,
}

impl Kv {
    pub fn new(store: KvStoreRef, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Accessor to another namespace of the same store.
    pub fn select(&self, namespace: impl Into<String>) -> Kv {
        Kv::new(self.store.clone(), namespace)
    }

    /// Inserts or replaces several values.
    pub async fn set<I, K, V>(&self, entries: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Serialize,
    {
        let entries = entries
            .into_iter()
            .map(|(key, value)| Ok((key.into(), serde_json::to_value(value)?)))
            .collect::<Result<Vec<_>, StoreError>>()?;
        self.store.put(&self.namespace, entries).await
    }

    /// Inserts or replaces one value.
    pub async fn insert(&self, key: impl Into<String>, value: &impl Serialize) -> Result<(), StoreError> {
        let value = serde_json::to_value(value)?;
        self.store.put(&self.namespace, vec![(key.into(), value)]).await
    }

    /// Value under `key` parsed as `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.get_value(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Raw JSON value under `key`.
    pub async fn get_value(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.store.get(&self.namespace, key).await
    }

    /// Removes several keys; missing keys are ignored.
    pub async fn remove<I, S>(&self, keys: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        self.store.remove(&self.namespace, &keys).await
    }

    /// Stores `value` under its short type name.
    pub async fn save<T: Serialize>(&self, value: &T) -> Result<(), StoreError> {
        self.insert(type_key::<T>(), value).await
    }

    /// Loads the value stored by [`Kv::save`] for `T`.
    pub async fn load<T: DeserializeOwned>(&self) -> Result<Option<T>, StoreError> {
        self.get(type_key::<T>()).await
    }

    /// Every non-empty namespace of the store.
    pub async fn namespaces(&self) -> Result<Vec<String>, StoreError> {
        self.store.namespaces().await
    }
}

impl std::fmt::Debug for Kv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kv").field("namespace", &self.namespace).finish_non_exhaustive()
    }
}

/// Short type name: path and generic arguments stripped.
fn type_key<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
