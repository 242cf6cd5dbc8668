//! Namespaced key-value storage of JSON values.
//!
//! ## Contents
//! - [`Kv`] typed accessor bound to one namespace
//! - [`KvStore`], [`MemoryKvStore`] storage seam and in-memory backend

#[allow(clippy::module_inception)]
mod kv;
mod store;

pub use kv::Kv;
pub use store::{KvStore, KvStoreRef, MemoryKvStore};
