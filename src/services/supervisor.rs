//! # Supervisor: registry of named services.
//!
//! The [`Supervisor`] maps service names to supervised run loops, exposes the
//! control commands (`start` / `stop` / `set_running`), the snapshot query
//! [`Supervisor::services`] and the live [`Supervisor::service_changed`] stream.
//!
//! ## Architecture
//! ```text
//! register(spec) ──► entries lock ──► retire old task (same name, if any)
//!                                  └─► install new task in the same slot
//!                                  └─► autostart ? task.start(runtime_token)
//!                                                : emit initial Stopped snapshot
//!
//! start/stop(name) ──► entries lock ──► task.start / task.stop  (unknown name: no-op)
//!
//! shutdown() ──► runtime_token.cancel()  → propagates to every execution token
//!            └─► wait for every service to report Stopped, bounded by Config::grace
//!                  ├─ all stopped     → Ok(())
//!                  └─ grace exceeded  → RuntimeError::GraceExceeded { stuck }
//! ```
//!
//! ## Rules
//! - At most one task per name; the last registration wins.
//! - `register`, `start` and `stop` are serialized by one registry lock.
//! - Unknown names are silent no-ops; control is idempotent.
//! - Snapshots are returned in registration order. A replacement keeps the slot
//!   of the service it replaced.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use binp::{Config, ServiceSpec, ServiceStatus, Supervisor, WorkloadError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sup = Supervisor::new(&Config::default());
//!     let mut changes = sup.subscribe();
//!
//!     sup.register(
//!         ServiceSpec::builder("ticker")
//!             .with_autostart(false)
//!             .build(|ctx: CancellationToken| async move {
//!                 ctx.cancelled().await;
//!                 Ok::<_, WorkloadError>(())
//!             }),
//!     );
//!     assert_eq!(changes.recv().await.map(|i| i.status), Some(ServiceStatus::Stopped));
//!
//!     sup.start("ticker");
//!     assert_eq!(changes.recv().await.map(|i| i.status), Some(ServiceStatus::Starting));
//!
//!     sup.shutdown().await?;
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::RuntimeError;
use crate::events::{Emitter, Subscription};
use crate::services::info::{ServiceInfo, ServiceStatus};
use crate::services::shutdown::shutdown_signal;
use crate::services::spec::ServiceSpec;
use crate::services::task::SupervisedTask;

#[derive(Default)]
struct Entries {
    /// Tasks in registration order.
    order: Vec<Arc<SupervisedTask>>,
    /// Name → index into `order`.
    index: HashMap<String, usize>,
}

impl Entries {
    fn find(&self, name: &str) -> Option<&Arc<SupervisedTask>> {
        self.index.get(name).map(|&slot| &self.order[slot])
    }
}

/// Registry and lifecycle owner of named services.
pub struct Supervisor {
    grace: Duration,
    runtime_token: CancellationToken,
    service_changed: Emitter<ServiceInfo>,
    entries: Mutex<Entries>,
}

impl Supervisor {
    /// Creates an empty supervisor.
    pub fn new(cfg: &Config) -> Arc<Self> {
        Arc::new(Self {
            grace: cfg.grace,
            runtime_token: CancellationToken::new(),
            service_changed: Emitter::new(),
            entries: Mutex::new(Entries::default()),
        })
    }

    /// Registers a service, replacing any service with the same name.
    ///
    /// A replaced service is cancelled without waiting for it to finish and
    /// never emits again. With `autostart` the new service is started at once;
    /// otherwise its initial `Stopped` snapshot is emitted.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn register(&self, spec: ServiceSpec) -> ServiceHandle {
        let task = SupervisedTask::new(&spec, self.service_changed.clone());
        let name = spec.name().to_string();

        let mut entries = self.entries.lock();
        match entries.index.get(&name).copied() {
            Some(slot) => {
                let old = std::mem::replace(&mut entries.order[slot], Arc::clone(&task));
                warn!(
                    service = %name,
                    old = %old.label(),
                    new = %task.label(),
                    "service redefined; replacing previous workload"
                );
                old.retire();
            }
            None => {
                let slot = entries.order.len();
                entries.order.push(Arc::clone(&task));
                entries.index.insert(name.clone(), slot);
            }
        }

        if !(spec.autostart() && task.start(&self.runtime_token)) {
            task.announce();
        }
        drop(entries);

        ServiceHandle {
            name,
            task: Arc::downgrade(&task),
            runtime_token: self.runtime_token.clone(),
        }
    }

    /// Starts the named service if it is `Stopped`.
    ///
    /// Returns `true` if an execution was scheduled; unknown names and
    /// non-stopped services are no-ops.
    pub fn start(&self, name: &str) -> bool {
        let entries = self.entries.lock();
        entries
            .find(name)
            .is_some_and(|task| task.start(&self.runtime_token))
    }

    /// Requests the named service to stop.
    ///
    /// Returns `true` if a running execution was asked to cancel; unknown names
    /// and stopped services are no-ops.
    pub fn stop(&self, name: &str) -> bool {
        let entries = self.entries.lock();
        entries.find(name).is_some_and(|task| task.stop())
    }

    /// Sets the desired running state: `true` maps to `start`, `false` to `stop`.
    pub fn set_running(&self, name: &str, running: bool) -> bool {
        if running { self.start(name) } else { self.stop(name) }
    }

    /// Snapshot of one service.
    pub fn get(&self, name: &str) -> Option<ServiceInfo> {
        self.entries.lock().find(name).map(|task| task.info())
    }

    /// Snapshots of every registered service in registration order.
    pub fn services(&self) -> Vec<ServiceInfo> {
        self.entries.lock().order.iter().map(|task| task.info()).collect()
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.entries.lock().order.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stream of status snapshots of every service.
    pub fn service_changed(&self) -> &Emitter<ServiceInfo> {
        &self.service_changed
    }

    /// Shorthand for `service_changed().subscribe()`.
    pub fn subscribe(&self) -> Subscription<ServiceInfo> {
        self.service_changed.subscribe()
    }

    /// True once [`Supervisor::shutdown`] was requested.
    pub fn is_shutting_down(&self) -> bool {
        self.runtime_token.is_cancelled()
    }

    /// Cancels every service and waits up to `grace` for the run loops to exit.
    ///
    /// After shutdown no service can be started again. With `grace = 0`
    /// cancellation is requested and the call returns immediately.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        info!(services = self.len(), "shutting down services");
        let mut changes = self.service_changed.subscribe();
        self.runtime_token.cancel();

        let tasks: Vec<Arc<SupervisedTask>> = self.entries.lock().order.clone();
        if self.grace.is_zero() {
            return Ok(());
        }

        let all_stopped = || tasks.iter().all(|task| task.info().status == ServiceStatus::Stopped);
        let wait = async {
            while !all_stopped() {
                if changes.recv().await.is_none() {
                    break;
                }
            }
        };
        if time::timeout(self.grace, wait).await.is_ok() && all_stopped() {
            info!("all services stopped within grace");
            return Ok(());
        }

        let stuck: Vec<String> = tasks
            .iter()
            .map(|task| task.info())
            .filter(|info| info.status != ServiceStatus::Stopped)
            .map(|info| info.name)
            .collect();
        warn!(grace = ?self.grace, stuck = ?stuck, "services did not stop within grace");
        Err(RuntimeError::GraceExceeded {
            grace: self.grace,
            stuck,
        })
    }

    /// Waits for a termination signal, then runs [`Supervisor::shutdown`].
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        let signal = shutdown_signal().await?;
        info!(signal, "termination signal received");
        self.shutdown().await
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.runtime_token.cancel();
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("services", &self.len())
            .field("grace", &self.grace)
            .field("shutting_down", &self.is_shutting_down())
            .finish()
    }
}

/// Handle to one registration, returned by [`Supervisor::register`].
///
/// Becomes inert once the service is replaced by a newer registration or the
/// supervisor is dropped: `start`/`stop` return `false`, `info` returns `None`.
#[derive(Clone, Debug)]
pub struct ServiceHandle {
    name: String,
    task: Weak<SupervisedTask>,
    runtime_token: CancellationToken,
}

impl ServiceHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Starts this registration if it is `Stopped`.
    pub fn start(&self) -> bool {
        self.live().is_some_and(|task| task.start(&self.runtime_token))
    }

    /// Requests this registration to stop.
    pub fn stop(&self) -> bool {
        self.live().is_some_and(|task| task.stop())
    }

    /// Current snapshot, or `None` once replaced.
    pub fn info(&self) -> Option<ServiceInfo> {
        self.live().map(|task| task.info())
    }

    /// True while this registration is the one installed under its name.
    pub fn is_current(&self) -> bool {
        self.live().is_some()
    }

    fn live(&self) -> Option<Arc<SupervisedTask>> {
        self.task.upgrade().filter(|task| !task.is_retired())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkloadError;

    fn idle(name: &'static str) -> ServiceSpec {
        ServiceSpec::builder(name)
            .with_autostart(false)
            .build(|ctx: CancellationToken| async move {
                ctx.cancelled().await;
                Ok::<_, WorkloadError>(())
            })
    }

    #[tokio::test]
    async fn unknown_names_are_noops() {
        let sup = Supervisor::new(&Config::default());
        assert!(!sup.start("ghost"));
        assert!(!sup.stop("ghost"));
        assert!(!sup.set_running("ghost", true));
        assert!(sup.get("ghost").is_none());
        assert!(sup.is_empty());
    }

    #[tokio::test]
    async fn replacement_keeps_registration_slot() {
        let sup = Supervisor::new(&Config::default());
        sup.register(idle("a"));
        sup.register(idle("b"));
        let old = sup.register(idle("a").with_description("second"));
        sup.register(idle("a").with_description("third"));

        let names: Vec<_> = sup.services().into_iter().map(|i| (i.name, i.description)).collect();
        assert_eq!(
            names,
            vec![("a".to_string(), "third".to_string()), ("b".to_string(), String::new())]
        );
        assert!(!old.is_current());
        assert!(!old.start());
    }

    #[tokio::test]
    async fn handle_controls_its_service() {
        let sup = Supervisor::new(&Config::default());
        let handle = sup.register(idle("worker"));
        assert_eq!(handle.name(), "worker");
        assert!(handle.start());
        assert!(!handle.start());
        assert_eq!(handle.info().map(|i| i.status), Some(ServiceStatus::Starting));
        assert!(handle.stop());
    }

    #[tokio::test]
    async fn no_start_after_shutdown() {
        let sup = Supervisor::new(&Config::default());
        sup.register(idle("late"));
        sup.shutdown().await.expect("nothing running");
        assert!(sup.is_shutting_down());
        assert!(!sup.start("late"));
    }
}
