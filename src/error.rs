//! Error types used by the binp runtime, workloads and stores.
//!
//! This module defines four error enums:
//!
//! - [`RuntimeError`]: errors raised by the service supervisor itself.
//! - [`WorkloadError`]: errors raised by one run of a service workload.
//! - [`StoreError`]: errors raised by journal and key-value backends.
//! - [`ActionError`]: errors raised by an invoked UI action.
//!
//! Every type provides `as_label` (stable snake_case label for logs).
//! Workload errors never reach the caller of the supervisor control API; they are
//! only visible as status transitions and log lines.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the supervisor runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some services did not reach `Stopped` in time.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of services that were still running.
        stuck: Vec<String>,
    },

    /// Waiting for an OS termination signal failed.
    #[error("failed to listen for shutdown signal: {0}")]
    Signal(#[from] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use binp::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Signal(_) => "runtime_signal",
        }
    }
}

/// # Errors produced by one run of a workload.
///
/// `Canceled` is the cancellation signal: it always ends the run loop and never
/// triggers a restart. Every other variant is a workload failure, logged and then
/// handled like a normal completion by the restart policy.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WorkloadError {
    /// Workload returned an error.
    #[error("workload failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Workload panicked; the panic was caught at the run-loop boundary.
    #[error("workload panicked: {info}")]
    Panicked {
        /// Panic payload, if it was a string.
        info: String,
    },

    /// Workload observed cancellation and exited.
    #[error("context cancelled")]
    Canceled,
}

impl WorkloadError {
    /// Builds a [`WorkloadError::Fail`] from anything printable.
    pub fn fail(error: impl std::fmt::Display) -> Self {
        WorkloadError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use binp::WorkloadError;
    ///
    /// assert_eq!(WorkloadError::fail("boom").as_label(), "workload_failed");
    /// assert_eq!(WorkloadError::Canceled.as_label(), "workload_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkloadError::Fail { .. } => "workload_failed",
            WorkloadError::Panicked { .. } => "workload_panicked",
            WorkloadError::Canceled => "workload_canceled",
        }
    }

    /// True for the cancellation signal.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, WorkloadError::Canceled)
    }
}

impl From<anyhow::Error> for WorkloadError {
    fn from(err: anyhow::Error) -> Self {
        WorkloadError::Fail {
            error: format!("{err:#}"),
        }
    }
}

/// # Errors produced by journal and key-value backends.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StoreError {
    /// A value could not be converted to or from JSON.
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The referenced journal does not exist.
    #[error("journal {0} not found")]
    NotFound(u64),

    /// Backend specific failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            StoreError::Serialize(_) => "store_serialize",
            StoreError::NotFound(_) => "store_not_found",
            StoreError::Backend(_) => "store_backend",
        }
    }
}

/// # Errors produced by invoking an action.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ActionError {
    /// The action handler returned an error.
    #[error("action {name:?} failed: {source}")]
    Failed {
        /// Action name.
        name: String,
        /// Error returned by the handler.
        #[source]
        source: anyhow::Error,
    },
}

impl ActionError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ActionError::Failed { .. } => "action_failed",
        }
    }
}

/// Renders a caught panic payload for logs.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
