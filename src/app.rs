//! # App: wiring of every subsystem.
//!
//! [`App`] bundles the service supervisor, the journal, the default key-value
//! namespace and the action registry behind one handle, built from a [`Config`].
//!
//! ```text
//! AppBuilder::new(cfg)
//!   ├─ with_journal_store(store)   (default: MemoryJournalStore)
//!   ├─ with_kv_store(store)        (default: MemoryKvStore)
//!   └─ build() ─► App { services: Arc<Supervisor>, journal, kv, actions }
//! ```
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use binp::{App, Config, ServiceSpec, WorkloadError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::builder(Config::default()).build();
//!     app.prepare().await?;
//!
//!     let journal = app.journal().clone();
//!     app.services().register(ServiceSpec::builder("poller").build(move |ctx: CancellationToken| {
//!         let journal = journal.clone();
//!         async move {
//!             journal.trace("poll", "Polls the upstream", |_j| async { Ok::<_, anyhow::Error>(()) }).await?;
//!             ctx.cancelled().await;
//!             Ok::<_, WorkloadError>(())
//!         }
//!     }));
//!
//!     app.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use tracing::info;

use crate::actions::Actions;
use crate::config::Config;
use crate::error::{RuntimeError, StoreError};
use crate::journal::{JournalStoreRef, Journals, MemoryJournalStore};
use crate::kv::{Kv, KvStoreRef, MemoryKvStore};
use crate::services::Supervisor;

/// Builder for [`App`].
pub struct AppBuilder {
    cfg: Config,
    journal_store: Option<JournalStoreRef>,
    kv_store: Option<KvStoreRef>,
}

impl AppBuilder {
    /// Creates a builder with in-memory stores.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            journal_store: None,
            kv_store: None,
        }
    }

    /// Uses `store` for journals.
    pub fn with_journal_store(mut self, store: JournalStoreRef) -> Self {
        self.journal_store = Some(store);
        self
    }

    /// Uses `store` for key-value data.
    pub fn with_kv_store(mut self, store: KvStoreRef) -> Self {
        self.kv_store = Some(store);
        self
    }

    /// Builds the app. No service is started.
    pub fn build(self) -> App {
        let journal_store = self
            .journal_store
            .unwrap_or_else(|| Arc::new(MemoryJournalStore::new()));
        let kv_store = self.kv_store.unwrap_or_else(|| Arc::new(MemoryKvStore::new()));

        let journal = Journals::new(journal_store).with_page_size(self.cfg.journal_limit());
        let kv = Kv::new(kv_store, self.cfg.kv_namespace.clone());
        let services = Supervisor::new(&self.cfg);

        App {
            cfg: self.cfg,
            services,
            journal,
            kv,
            actions: Actions::new(),
        }
    }
}

/// Handle to the services, journal, key-value store and actions of one app.
#[derive(Clone, Debug)]
pub struct App {
    cfg: Config,
    services: Arc<Supervisor>,
    journal: Journals,
    kv: Kv,
    actions: Actions,
}

impl App {
    /// Starts a builder.
    pub fn builder(cfg: Config) -> AppBuilder {
        AppBuilder::new(cfg)
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn services(&self) -> &Arc<Supervisor> {
        &self.services
    }

    pub fn journal(&self) -> &Journals {
        &self.journal
    }

    /// Accessor to the configured default namespace.
    pub fn kv(&self) -> &Kv {
        &self.kv
    }

    pub fn actions(&self) -> &Actions {
        &self.actions
    }

    /// Startup housekeeping: drops journals left unfinished by a previous run.
    ///
    /// Call once, before anything is traced.
    pub async fn prepare(&self) -> Result<(), StoreError> {
        let removed = self.journal.remove_dead().await?;
        info!(removed, "app prepared");
        Ok(())
    }

    /// Stops every service, bounded by `Config::grace`.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.services.shutdown().await
    }

    /// Waits for a termination signal, then shuts down.
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        self.services.run_until_signal().await
    }
}
