//! # binp
//!
//! **binp** is a small in-process toolkit for long-running automation
//! programs: supervised background services, an audit journal of operations,
//! a namespaced key-value store and a registry of on-demand actions.
//!
//! It is the core behind an operator UI. Transport (HTTP, WebSocket) and
//! durable storage are left to the embedding application; the crate exposes
//! serializable snapshots, live [`Emitter`] streams and storage traits for that.
//!
//! ## Architecture
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ ServiceSpec  │   │ ServiceSpec  │   │ ServiceSpec  │
//!     │  "poller"    │   │  "listener"  │   │  "reporter"  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor (name → SupervisedTask, registration order)           │
//! │  - register / start / stop / set_running / services               │
//! │  - runtime CancellationToken (shutdown)                           │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │SupervisedTask│   │SupervisedTask│   │SupervisedTask│
//!     │  (run loop)  │   │  (run loop)  │   │  (run loop)  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │ ServiceInfo snapshot on every status change
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │        Emitter<ServiceInfo>  (Supervisor::service_changed)        │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                        ┌──────────┼──────────┐
//!                        ▼          ▼          ▼
//!                   [queue S1] [queue S2] [queue SN]   (unbounded, FIFO)
//! ```
//!
//! ### Service lifecycle
//! ```text
//! Stopped ─start()─► Starting ─► Running ─┬─(restart)─► Restarting ─(delay)─► Starting
//!    ▲                                    │
//!    └──────(no restart, stop(), shutdown)┘
//! ```
//!
//! ## Features
//! | Area          | Description                                              | Key types                                   |
//! |---------------|----------------------------------------------------------|---------------------------------------------|
//! | **Services**  | Named restartable workloads with observable status.      | [`Supervisor`], [`ServiceSpec`], [`Workload`] |
//! | **Events**    | Typed fan-out with per-subscriber unbounded queues.      | [`Emitter`], [`Subscription`]               |
//! | **Policies**  | Optional growth of the restart delay after failures.     | [`BackoffPolicy`], [`JitterPolicy`]         |
//! | **Journal**   | Audit trail of traced operations with records and labels.| [`Journals`], [`JournalStore`]              |
//! | **Key-value** | Namespaced JSON values.                                  | [`Kv`], [`KvStore`]                         |
//! | **Actions**   | Named on-demand operations.                              | [`Actions`]                                 |
//! | **Errors**    | Typed errors with stable log labels.                     | [`WorkloadError`], [`RuntimeError`]         |
//! | **Config**    | Central defaults.                                        | [`Config`]                                  |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use binp::{App, Config, ServiceSpec, ServiceStatus, WorkloadError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = App::builder(Config::default()).build();
//!     let mut changes = app.services().subscribe();
//!
//!     app.services().register(
//!         ServiceSpec::builder("once")
//!             .with_description("Runs once and stops")
//!             .with_restart(false)
//!             .build(|_ctx: CancellationToken| async move {
//!                 tokio::time::sleep(Duration::from_millis(10)).await;
//!                 Ok::<_, WorkloadError>(())
//!             }),
//!     );
//!
//!     while let Some(info) = changes.recv().await {
//!         println!("{} is {}", info.name, info.status);
//!         if info.status == ServiceStatus::Stopped {
//!             break;
//!         }
//!     }
//!
//!     app.shutdown().await?;
//!     Ok(())
//! }
//! ```
mod actions;
mod app;
mod config;
mod error;
mod events;
mod journal;
mod kv;
mod policies;
mod services;

// ---- Public re-exports ----

pub use actions::{ActionFn, ActionHandler, ActionInfo, Actions};
pub use app::{App, AppBuilder};
pub use config::Config;
pub use error::{ActionError, RuntimeError, StoreError, WorkloadError};
pub use events::{Attachment, Emitter, Subscription};
pub use journal::{
    Headline, Journal, JournalContext, JournalId, JournalStore, JournalStoreRef, Journals, MemoryJournalStore, Record,
    SearchQuery,
};
pub use kv::{Kv, KvStore, KvStoreRef, MemoryKvStore};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use services::{
    BoxWorkloadFuture, DEFAULT_RESTART_DELAY, ServiceHandle, ServiceInfo, ServiceSpec, ServiceSpecBuilder, ServiceStatus,
    Supervisor, Workload, WorkloadFn, WorkloadRef,
};
