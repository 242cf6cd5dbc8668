//! Operation journals.
//!
//! A journal is an append-only audit trail of one operation invocation: when
//! it started and finished, whether it failed, how long it took, the records it
//! wrote and the labels it was tagged with.
//!
//! ## Contents
//! - [`Journals`], [`JournalContext`] tracing facade and per-operation handle
//! - [`JournalStore`], [`MemoryJournalStore`] storage seam and in-memory backend
//! - [`Headline`], [`Journal`], [`Record`], [`SearchQuery`] data model

mod journals;
mod model;
mod store;

pub use journals::{JournalContext, Journals};
pub use model::{Headline, Journal, JournalId, Record, SearchQuery};
pub use store::{JournalStore, JournalStoreRef, MemoryJournalStore};
