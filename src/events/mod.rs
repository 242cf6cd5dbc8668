//! Event fan-out primitives.
//!
//! This module provides the typed [`Emitter`] used for every notification
//! stream in the crate:
//! - `Supervisor::service_changed` publishes [`ServiceInfo`](crate::ServiceInfo) snapshots;
//! - `Journals::journal_updated` / `Journals::record_added` publish journal ids.
//!
//! ## Contents
//! - [`Emitter`] broadcaster with per-subscriber unbounded queues
//! - [`Subscription`] scoped queue created by [`Emitter::subscribe`]
//! - [`Attachment`] scoped registration of a caller-supplied queue

mod emitter;

pub use emitter::{Attachment, Emitter, Subscription};
