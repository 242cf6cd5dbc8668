//! # Journal storage backends.
//!
//! [`JournalStore`] is the persistence seam of the journal subsystem. The crate
//! ships [`MemoryJournalStore`]; a durable backend implements the same trait and
//! is passed to `AppBuilder::with_journal_store`.
//!
//! ## Contract
//! - Ids are assigned by `begin` in strictly increasing order.
//! - `history` and `search` return headlines **newest first** (descending id).
//! - `get` returns records **newest first**.
//! - `add_labels` has set semantics: labels are deduplicated and kept sorted.
//! - Writes to an unknown id fail with [`StoreError::NotFound`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::journal::model::{Headline, Journal, JournalId, Record, SearchQuery};

/// Storage of journals, headlines, records and labels.
#[async_trait]
pub trait JournalStore: Send + Sync + 'static {
    /// Creates a pending journal and returns its id.
    async fn begin(&self, operation: &str, description: &str) -> Result<JournalId, StoreError>;

    /// Marks a journal finished.
    async fn end(&self, id: JournalId, duration: Duration, error: Option<String>) -> Result<(), StoreError>;

    /// Appends a record to a journal.
    async fn add_record(&self, id: JournalId, message: &str, params: Map<String, Value>) -> Result<(), StoreError>;

    /// Adds labels to a journal.
    async fn add_labels(&self, id: JournalId, labels: &[String]) -> Result<(), StoreError>;

    /// Full journal with records, or `None` if unknown.
    async fn get(&self, id: JournalId) -> Result<Option<Journal>, StoreError>;

    /// Page of headlines, newest first.
    async fn history(&self, offset: usize, limit: usize) -> Result<Vec<Headline>, StoreError>;

    /// Page of headlines matching `query`, newest first; `limit = None` means no limit.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Headline>, StoreError>;

    /// Deletes every unfinished journal and returns how many were removed.
    async fn remove_dead(&self) -> Result<usize, StoreError>;
}

/// Shared handle to a journal store.
pub type JournalStoreRef = Arc<dyn JournalStore>;

struct Entry {
    operation: String,
    description: String,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    error: Option<String>,
    duration: Option<f64>,
    labels: BTreeSet<String>,
    /// Oldest first; reversed on read.
    records: Vec<Record>,
}

impl Entry {
    fn headline(&self, id: JournalId) -> Headline {
        Headline {
            id,
            operation: self.operation.clone(),
            description: self.description.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at,
            error: self.error.clone(),
            duration: self.duration,
            labels: self.labels.iter().cloned().collect(),
        }
    }
}

#[derive(Default)]
struct JournalTable {
    last_id: JournalId,
    entries: BTreeMap<JournalId, Entry>,
}

impl JournalTable {
    fn entry_mut(&mut self, id: JournalId) -> Result<&mut Entry, StoreError> {
        self.entries.get_mut(&id).ok_or(StoreError::NotFound(id))
    }
}

/// In-memory [`JournalStore`]. Contents are lost when the process exits.
#[derive(Default)]
pub struct MemoryJournalStore {
    inner: Mutex<JournalTable>,
}

impl MemoryJournalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored journals.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for MemoryJournalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryJournalStore").field("journals", &self.len()).finish()
    }
}

#[async_trait]
impl JournalStore for MemoryJournalStore {
    async fn begin(&self, operation: &str, description: &str) -> Result<JournalId, StoreError> {
        let mut inner = self.inner.lock();
        inner.last_id += 1;
        let id = inner.last_id;
        inner.entries.insert(
            id,
            Entry {
                operation: operation.to_string(),
                description: description.to_string(),
                started_at: Utc::now(),
                finished_at: None,
                error: None,
                duration: None,
                labels: BTreeSet::new(),
                records: Vec::new(),
            },
        );
        Ok(id)
    }

    async fn end(&self, id: JournalId, duration: Duration, error: Option<String>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let entry = inner.entry_mut(id)?;
        entry.finished_at = Some(Utc::now());
        entry.duration = Some(duration.as_secs_f64());
        entry.error = error;
        Ok(())
    }

    async fn add_record(&self, id: JournalId, message: &str, params: Map<String, Value>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.entry_mut(id)?.records.push(Record {
            message: message.to_string(),
            created_at: Utc::now(),
            params,
        });
        Ok(())
    }

    async fn add_labels(&self, id: JournalId, labels: &[String]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.entry_mut(id)?.labels.extend(labels.iter().cloned());
        Ok(())
    }

    async fn get(&self, id: JournalId) -> Result<Option<Journal>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner.entries.get(&id).map(|entry| Journal {
            headline: entry.headline(id),
            records: entry.records.iter().rev().cloned().collect(),
        }))
    }

    async fn history(&self, offset: usize, limit: usize) -> Result<Vec<Headline>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .entries
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .map(|(&id, entry)| entry.headline(id))
            .collect())
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Headline>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .entries
            .iter()
            .rev()
            .map(|(&id, entry)| entry.headline(id))
            .filter(|headline| query.matches(headline))
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn remove_dead(&self) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| entry.finished_at.is_some());
        Ok(before - inner.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ids_increase_and_history_is_newest_first() {
        let store = MemoryJournalStore::new();
        let a = store.begin("a", "").await.expect("begin");
        let b = store.begin("b", "").await.expect("begin");
        let c = store.begin("c", "").await.expect("begin");
        assert!(a < b && b < c);

        let ids: Vec<_> = store.history(0, 10).await.expect("history").iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![c, b, a]);

        let page: Vec<_> = store.history(1, 1).await.expect("history").iter().map(|h| h.id).collect();
        assert_eq!(page, vec![b]);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = MemoryJournalStore::new();
        let err = store.end(42, Duration::ZERO, None).await.expect_err("unknown id");
        assert!(matches!(err, StoreError::NotFound(42)));
        assert!(store.get(42).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn remove_dead_keeps_finished() {
        let store = MemoryJournalStore::new();
        let done = store.begin("done", "").await.expect("begin");
        store.end(done, Duration::from_millis(5), None).await.expect("end");
        store.begin("dead", "").await.expect("begin");

        assert_eq!(store.remove_dead().await.expect("remove"), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get(done).await.expect("get").is_some());
    }

    #[tokio::test]
    async fn labels_are_a_sorted_set() {
        let store = MemoryJournalStore::new();
        let id = store.begin("op", "").await.expect("begin");
        store.add_labels(id, &["foo".into(), "bar".into()]).await.expect("labels");
        store.add_labels(id, &["zoo".into(), "foo".into()]).await.expect("labels");

        let journal = store.get(id).await.expect("get").expect("exists");
        assert_eq!(journal.headline.labels, vec!["bar", "foo", "zoo"]);
    }
}
