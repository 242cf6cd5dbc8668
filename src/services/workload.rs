//! # Workload abstraction and function-backed implementation.
//!
//! A [`Workload`] is the user code a service runs. Each run gets a fresh future
//! from [`Workload::spawn`] and a [`CancellationToken`] that is cancelled when the
//! service is stopped, replaced or shut down.
//!
//! ## Cancellation
//! The run loop races the workload future against the token and **drops** the
//! future on cancellation, so every `.await` inside the workload is an
//! interruption point. A workload that never yields (a busy loop without
//! `.await`) cannot be interrupted this way and holds its worker thread until
//! it returns; long CPU-bound work should check `ctx.is_cancelled()` or run
//! in `spawn_blocking`.

use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::error::WorkloadError;

/// Boxed future produced by a single workload run.
pub type BoxWorkloadFuture = Pin<Box<dyn Future<Output = Result<(), WorkloadError>> + Send + 'static>>;

/// Shared handle to a workload.
pub type WorkloadRef = Arc<dyn Workload>;

/// Restartable asynchronous unit of work.
pub trait Workload: Send + Sync + 'static {
    /// Human-readable label, used in logs when a service is redefined.
    fn label(&self) -> &str;

    /// Creates the future for one run.
    fn spawn(&self, ctx: CancellationToken) -> BoxWorkloadFuture;
}

/// Function-backed workload.
///
/// Wraps a closure that *creates* a new future per run, so no state leaks
/// between restarts unless the closure captures it explicitly (e.g. an `Arc`).
///
/// ## Example
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use binp::{Workload, WorkloadError, WorkloadFn, WorkloadRef};
///
/// let w: WorkloadRef = WorkloadFn::arc("heartbeat", |ctx: CancellationToken| async move {
///     ctx.cancelled().await;
///     Ok::<_, WorkloadError>(())
/// });
/// assert_eq!(w.label(), "heartbeat");
/// ```
pub struct WorkloadFn<F> {
    label: Cow<'static, str>,
    f: F,
}

impl<F> WorkloadFn<F> {
    /// Creates a new function-backed workload.
    pub fn new(label: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            label: label.into(),
            f,
        }
    }

    /// Creates the workload and returns it as a shared handle.
    pub fn arc(label: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(label, f))
    }
}

impl<F> std::fmt::Debug for WorkloadFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkloadFn").field("label", &self.label).finish()
    }
}

impl<F, Fut> Workload for WorkloadFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), WorkloadError>> + Send + 'static,
{
    fn label(&self) -> &str {
        &self.label
    }

    fn spawn(&self, ctx: CancellationToken) -> BoxWorkloadFuture {
        Box::pin((self.f)(ctx))
    }
}
