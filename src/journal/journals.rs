//! # Journals: traced operations.
//!
//! [`Journals::trace`] wraps one invocation of an async operation in a journal:
//! ```text
//! trace(operation, description, f)
//!   ├─► store.begin()              → journal_updated.emit(id)
//!   ├─► f(JournalContext { id })   → ctx.record(..) / ctx.labels(..)
//!   │                                 → record_added.emit(id)
//!   ├─► store.end(elapsed, error?) → journal_updated.emit(id)
//!   └─► returns f's result unchanged (errors and panics pass through)
//! ```
//!
//! The [`JournalContext`] handed to the operation is the correlation handle:
//! anything done through it lands in that operation's journal, whatever task
//! or thread it is used from.
//!
//! A trace whose future is dropped before completion leaves its journal
//! pending; [`Journals::remove_dead`] reclaims such journals at startup.

use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{StoreError, panic_message};
use crate::events::Emitter;
use crate::journal::model::{Headline, Journal, JournalId, SearchQuery};
use crate::journal::store::JournalStoreRef;

/// Journal facade over a [`JournalStore`](crate::JournalStore).
///
/// Cloning is cheap; clones share the store and both update emitters.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use binp::{Journals, MemoryJournalStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> anyhow::Result<()> {
/// let journals = Journals::new(Arc::new(MemoryJournalStore::new()));
///
/// let id = journals
///     .trace("import", "Imports the daily batch", |ctx| async move {
///         ctx.record("fetched", serde_json::json!({ "rows": 42 })).await?;
///         ctx.labels(["daily"]).await?;
///         Ok::<_, anyhow::Error>(ctx.id())
///     })
///     .await?;
///
/// let journal = journals.get(id).await?.expect("journal exists");
/// assert_eq!(journal.headline.operation, "import");
/// assert_eq!(journal.records[0].params["rows"], 42);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Journals {
    store: JournalStoreRef,
    page_size: usize,
    journal_updated: Emitter<JournalId>,
    record_added: Emitter<JournalId>,
}

impl Journals {
    /// Creates a facade with a page size of 20.
    pub fn new(store: JournalStoreRef) -> Self {
        Self {
            store,
            page_size: 20,
            journal_updated: Emitter::new(),
            record_added: Emitter::new(),
        }
    }

    /// Sets the number of headlines per [`Journals::history`] page (min 1).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Underlying store.
    pub fn store(&self) -> &JournalStoreRef {
        &self.store
    }

    /// Emits a journal id when a journal begins or ends.
    pub fn journal_updated(&self) -> &Emitter<JournalId> {
        &self.journal_updated
    }

    /// Emits a journal id when a record or labels are added.
    pub fn record_added(&self) -> &Emitter<JournalId> {
        &self.record_added
    }

    /// Runs `f` inside a new journal and returns its result unchanged.
    ///
    /// The journal is finished with the elapsed monotonic time and, if `f`
    /// failed or panicked, the error text. A panic is resumed after the journal
    /// is finished. Failing to finish the journal is logged, not returned.
    pub async fn trace<F, Fut, T>(&self, operation: &str, description: &str, f: F) -> anyhow::Result<T>
    where
        F: FnOnce(JournalContext) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let started = Instant::now();
        let id = self.store.begin(operation, description).await?;
        debug!(journal_id = id, operation, "journal started");
        self.journal_updated.emit(id);

        let ctx = JournalContext {
            id,
            journals: self.clone(),
        };
        let outcome = AssertUnwindSafe(f(ctx)).catch_unwind().await;

        let error = match &outcome {
            Ok(Ok(_)) => None,
            Ok(Err(err)) => Some(format!("{err:#}")),
            Err(panic) => Some(format!("panicked: {}", panic_message(panic.as_ref()))),
        };
        let failed = error.is_some();
        if let Err(err) = self.store.end(id, started.elapsed(), error).await {
            warn!(journal_id = id, error = %err, label = err.as_label(), "failed to finish journal");
        }
        debug!(journal_id = id, operation, failed, "journal finished");
        self.journal_updated.emit(id);

        match outcome {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    /// Page `page` (0-based) of headlines, newest first.
    pub async fn history(&self, page: usize) -> Result<Vec<Headline>, StoreError> {
        let offset = page.saturating_mul(self.page_size);
        self.store.history(offset, self.page_size).await
    }

    /// Headlines in an explicit window, newest first.
    pub async fn history_range(&self, offset: usize, limit: usize) -> Result<Vec<Headline>, StoreError> {
        self.store.history(offset, limit).await
    }

    /// Full journal with records (newest first).
    pub async fn get(&self, id: JournalId) -> Result<Option<Journal>, StoreError> {
        self.store.get(id).await
    }

    /// Headlines matching `query`, newest first.
    ///
    /// A query without `limit` returns one page of the configured page size.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Headline>, StoreError> {
        let mut query = query.clone();
        query.limit.get_or_insert(self.page_size);
        self.store.search(&query).await
    }

    /// Deletes unfinished journals. Call once at startup, before any trace.
    pub async fn remove_dead(&self) -> Result<usize, StoreError> {
        let removed = self.store.remove_dead().await?;
        if removed > 0 {
            info!(removed, "removed unfinished journals");
        }
        Ok(removed)
    }
}

impl std::fmt::Debug for Journals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journals")
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

/// Handle to the journal of the running operation.
#[derive(Clone, Debug)]
pub struct JournalContext {
    id: JournalId,
    journals: Journals,
}

impl JournalContext {
    /// Id of the journal being written.
    pub fn id(&self) -> JournalId {
        self.id
    }

    /// Appends a record.
    ///
    /// `params` must serialize to a JSON object (its fields become the record
    /// params) or to `null` (no params, e.g. `()`). Any other value is stored
    /// under the key `"value"`.
    pub async fn record(&self, message: &str, params: impl Serialize) -> Result<(), StoreError> {
        let params = match serde_json::to_value(params)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => Map::from_iter([("value".to_string(), other)]),
        };
        self.journals.store.add_record(self.id, message, params).await?;
        info!(journal_id = self.id, "{message}");
        self.journals.record_added.emit(self.id);
        Ok(())
    }

    /// Adds labels to the journal. Labels already present are kept once.
    pub async fn labels<I, S>(&self, labels: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        self.journals.store.add_labels(self.id, &labels).await?;
        self.journals.record_added.emit(self.id);
        Ok(())
    }
}
