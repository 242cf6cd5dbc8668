//! # SupervisedTask: run loop of one registered service.
//!
//! A [`SupervisedTask`] owns the [`ServiceInfo`] of one service and drives its
//! status through the state machine documented on [`ServiceStatus`].
//!
//! ## Architecture
//! ```text
//! Supervisor::start(name) ──► SupervisedTask::start(parent)
//!                                 ├─► status = Starting (emit)
//!                                 └─► tokio::spawn(run(child_token))
//!
//! run(token):
//! loop {
//!   ├─► status = Running (emit)
//!   ├─► run_once() ── select! { token.cancelled(), workload.spawn(token) }
//!   │     ├─► Ok          → failures = 0
//!   │     ├─► Canceled    → break
//!   │     └─► Fail/Panic  → failures += 1, warn!
//!   ├─► break if cancelled or restart == false
//!   ├─► status = Restarting (emit)
//!   ├─► sleep(max(restart_delay, backoff(failures))) or break on cancel
//!   └─► status = Starting (emit)
//! }
//! status = Stopped (emit), execution cleared
//! ```
//!
//! ## Rules
//! - Status is written only under the task's state lock, and every change is
//!   emitted while that lock is held: snapshots of one task are totally ordered.
//! - Cancellation always wins over restart.
//! - A *retired* task (replaced by a newer registration) keeps unwinding but
//!   never emits again and cannot be started.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{WorkloadError, panic_message};
use crate::events::Emitter;
use crate::policies::BackoffPolicy;
use crate::services::info::{ServiceInfo, ServiceStatus};
use crate::services::spec::ServiceSpec;
use crate::services::workload::WorkloadRef;

/// Handle of the currently scheduled execution.
struct Execution {
    token: CancellationToken,
}

struct TaskState {
    info: ServiceInfo,
    execution: Option<Execution>,
    retired: bool,
}

/// Supervises the executions of one registered service.
pub(crate) struct SupervisedTask {
    name: String,
    workload: WorkloadRef,
    restart: bool,
    restart_delay: Duration,
    backoff: Option<BackoffPolicy>,
    events: Emitter<ServiceInfo>,
    state: Mutex<TaskState>,
}

impl SupervisedTask {
    /// Creates a stopped task publishing its snapshots to `events`.
    pub(crate) fn new(spec: &ServiceSpec, events: Emitter<ServiceInfo>) -> Arc<Self> {
        let info = ServiceInfo {
            name: spec.name().to_string(),
            description: spec.description().to_string(),
            status: ServiceStatus::Stopped,
            autostart: spec.autostart(),
            restart: spec.restart(),
            restart_delay: spec.restart_delay(),
        };
        Arc::new(Self {
            name: info.name.clone(),
            workload: Arc::clone(spec.workload()),
            restart: spec.restart(),
            restart_delay: spec.restart_delay(),
            backoff: spec.backoff(),
            events,
            state: Mutex::new(TaskState {
                info,
                execution: None,
                retired: false,
            }),
        })
    }

    /// Label of the workload, for logs.
    pub(crate) fn label(&self) -> &str {
        self.workload.label()
    }

    /// Current snapshot.
    pub(crate) fn info(&self) -> ServiceInfo {
        self.state.lock().info.clone()
    }

    pub(crate) fn is_retired(&self) -> bool {
        self.state.lock().retired
    }

    /// Emits the current snapshot without changing it.
    pub(crate) fn announce(&self) {
        let st = self.state.lock();
        if !st.retired {
            self.events.emit(st.info.clone());
        }
    }

    /// Schedules an execution if the task is exactly `Stopped`.
    ///
    /// Returns `false` (no-op) when already scheduled, retired, or when the
    /// parent token is cancelled.
    pub(crate) fn start(self: &Arc<Self>, parent: &CancellationToken) -> bool {
        if parent.is_cancelled() {
            return false;
        }
        let mut st = self.state.lock();
        if st.retired || st.info.status != ServiceStatus::Stopped {
            return false;
        }

        let token = parent.child_token();
        self.set_status(&mut st, ServiceStatus::Starting);
        tokio::spawn(Arc::clone(self).run(token.clone()));
        st.execution = Some(Execution { token });
        true
    }

    /// Requests cancellation of the active execution.
    ///
    /// Returns `false` (no-op) when the task is `Stopped` or has no execution.
    pub(crate) fn stop(&self) -> bool {
        let st = self.state.lock();
        if st.info.status == ServiceStatus::Stopped {
            return false;
        }
        match &st.execution {
            Some(exec) => {
                exec.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Silences the task and cancels its execution without waiting for it.
    pub(crate) fn retire(&self) {
        let mut st = self.state.lock();
        st.retired = true;
        if let Some(exec) = st.execution.take() {
            exec.token.cancel();
        }
    }

    fn set_status(&self, st: &mut TaskState, status: ServiceStatus) {
        st.info.status = status;
        if st.retired {
            return;
        }
        debug!(service = %self.name, status = %status, "service status changed");
        self.events.emit(st.info.clone());
    }

    fn transition(&self, status: ServiceStatus) {
        let mut st = self.state.lock();
        self.set_status(&mut st, status);
    }

    async fn run(self: Arc<Self>, token: CancellationToken) {
        let mut failures: u32 = 0;

        loop {
            if token.is_cancelled() {
                break;
            }
            self.transition(ServiceStatus::Running);

            match self.run_once(&token).await {
                Ok(()) => failures = 0,
                Err(err) if err.is_cancellation() => break,
                Err(err) => {
                    failures = failures.saturating_add(1);
                    warn!(
                        service = %self.name,
                        error = %err,
                        label = err.as_label(),
                        failures,
                        "service workload failed"
                    );
                }
            }

            if token.is_cancelled() || !self.restart {
                break;
            }

            let delay = self
                .backoff
                .map_or(self.restart_delay, |b| b.delay_after(failures, self.restart_delay));
            self.transition(ServiceStatus::Restarting);

            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = time::sleep(delay) => {}
            }
            self.transition(ServiceStatus::Starting);
        }

        self.finish();
    }

    /// Runs the workload once; cancellation drops the workload future.
    async fn run_once(&self, token: &CancellationToken) -> Result<(), WorkloadError> {
        let attempt = AssertUnwindSafe(async { self.workload.spawn(token.clone()).await }).catch_unwind();

        tokio::select! {
            biased;
            _ = token.cancelled() => Err(WorkloadError::Canceled),
            res = attempt => match res {
                Ok(res) => res,
                Err(panic) => Err(WorkloadError::Panicked {
                    info: panic_message(panic.as_ref()),
                }),
            },
        }
    }

    fn finish(&self) {
        let mut st = self.state.lock();
        st.execution = None;
        self.set_status(&mut st, ServiceStatus::Stopped);
    }
}
