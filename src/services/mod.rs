//! Supervised background services.
//!
//! A service is a named [`Workload`] run under a restart policy. The
//! [`Supervisor`] keeps at most one service per name, runs each one in its own
//! Tokio task and publishes every status change as a [`ServiceInfo`] snapshot.
//!
//! ## Contents
//! - [`ServiceSpec`], [`ServiceSpecBuilder`] registration parameters
//! - [`Workload`], [`WorkloadFn`], [`WorkloadRef`] the user code of a service
//! - [`ServiceInfo`], [`ServiceStatus`] observable state
//! - [`Supervisor`], [`ServiceHandle`] registry and control API
//!
//! ## Quick wiring
//! ```text
//! ServiceSpec ──► Supervisor::register ──► SupervisedTask (one per name)
//!                                              └─► run loop: Starting → Running → Restarting → …
//!                                              └─► Emitter<ServiceInfo> (service_changed)
//! ```

mod info;
mod shutdown;
mod spec;
mod supervisor;
mod task;
mod workload;

pub use info::{ServiceInfo, ServiceStatus};
pub(crate) use spec::closure_label;
pub use spec::{DEFAULT_RESTART_DELAY, ServiceSpec, ServiceSpecBuilder};
pub use supervisor::{ServiceHandle, Supervisor};
pub use workload::{BoxWorkloadFuture, Workload, WorkloadFn, WorkloadRef};
