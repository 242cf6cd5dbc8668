//! # Journal data model.
//!
//! A journal is the audit record of one traced operation:
//! ```text
//! Journal
//!   ├─ Headline: id, operation, description, started_at,
//!   │            finished_at?, error?, duration?, labels
//!   └─ records:  Record { message, created_at, params } (newest first)
//! ```
//! A journal whose `finished_at` is unset is *pending*: the operation is still
//! running, or the process died before it finished (a *dead* journal).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of a journal, assigned by the store in increasing order.
pub type JournalId = u64;

/// Summary of one journal, without its records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub id: JournalId,
    pub operation: String,
    pub description: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Error text if the operation failed.
    pub error: Option<String>,
    /// Elapsed monotonic time in seconds.
    pub duration: Option<f64>,
    /// Sorted, deduplicated labels.
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Headline {
    /// True while `finished_at` is unset.
    pub fn is_pending(&self) -> bool {
        self.finished_at.is_none()
    }

    /// True if the operation finished with an error.
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// One message attached to a journal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub message: String,
    pub created_at: DateTime<Utc>,
    /// Named JSON values.
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// Full journal: headline plus records, newest record first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    #[serde(flatten)]
    pub headline: Headline,
    pub records: Vec<Record>,
}

/// Filter and page of a journal search.
///
/// Every filter left as `None` (or an empty `labels`) matches everything.
/// A store receiving `limit = None` returns every match.
///
/// ## Example
/// ```rust
/// use binp::SearchQuery;
///
/// let query = SearchQuery::default()
///     .with_operation("sync")
///     .with_failed(true)
///     .with_labels(["nightly"]);
/// assert_eq!(query.limit, None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    /// Exact operation name.
    pub operation: Option<String>,
    /// `Some(true)`: failed only. `Some(false)`: not failed, pending included.
    pub failed: Option<bool>,
    /// `Some(true)`: unfinished only. `Some(false)`: finished only.
    pub pending: Option<bool>,
    /// Journal must carry at least one of these labels.
    pub labels: Vec<String>,
    pub offset: usize,
    /// Page length; `None` takes the page size of the [`Journals`](crate::Journals) facade.
    pub limit: Option<usize>,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            operation: None,
            failed: None,
            pending: None,
            labels: Vec::new(),
            offset: 0,
            limit: None,
        }
    }
}

impl SearchQuery {
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_failed(mut self, failed: bool) -> Self {
        self.failed = Some(failed);
        self
    }

    pub fn with_pending(mut self, pending: bool) -> Self {
        self.pending = Some(pending);
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the page window.
    pub fn with_page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    /// True if `headline` passes every filter (paging is not applied).
    pub fn matches(&self, headline: &Headline) -> bool {
        if self.operation.as_ref().is_some_and(|op| headline.operation != *op) {
            return false;
        }
        if self.failed.is_some_and(|failed| headline.is_failed() != failed) {
            return false;
        }
        if self.pending.is_some_and(|pending| headline.is_pending() != pending) {
            return false;
        }
        self.labels.is_empty() || self.labels.iter().any(|l| headline.labels.contains(l))
    }
}
