//! Restart delay policies.
//!
//! A service with `restart = true` waits `restart_delay` between runs. These
//! knobs optionally stretch that wait after consecutive failed runs.
//!
//! ## Contents
//! - [`BackoffPolicy`] how the delay grows (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization strategy to avoid synchronized restarts
//!
//! ## Quick wiring
//! ```text
//! ServiceSpec { restart_delay: Duration, backoff: Option<BackoffPolicy> }
//!      └─► services::task::SupervisedTask uses:
//!           - restart_delay as the lower bound of every wait
//!           - backoff.delay_after(failures, restart_delay) after failed runs
//! ```
//!
//! ## Defaults
//! - No backoff: every wait is exactly `restart_delay`.
//! - `BackoffPolicy::default()` → first=100ms, factor=2.0, max=30s, jitter=None.

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
