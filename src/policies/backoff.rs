//! # Backoff for restarting services.
//!
//! [`BackoffPolicy`] grows the wait between runs after consecutive failures.
//! The base delay after `n` failures is `first × factor^(n-1)`, clamped to `max`,
//! then jittered. The configured `restart_delay` of a service is always the
//! floor, so a backoff can only lengthen the wait, never shorten it.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use binp::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(10),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//! let floor = Duration::from_millis(150);
//!
//! // A clean run (no failures) waits exactly the floor.
//! assert_eq!(backoff.delay_after(0, floor), floor);
//! // Third consecutive failure: 100ms × 2² = 400ms.
//! assert_eq!(backoff.delay_after(3, floor), Duration::from_millis(400));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Growth of the restart delay after consecutive failed runs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay after the first failure.
    pub first: Duration,
    /// Upper bound of the computed delay.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Jitter applied to the computed delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Computes the backoff part of the delay for `failures` consecutive failures.
    ///
    /// Returns `Duration::ZERO` when `failures == 0`.
    pub fn next(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }
        let exp = (failures - 1).min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };
        self.jitter.apply(base)
    }

    /// Full wait before the next run: never shorter than `floor`.
    pub fn delay_after(&self, failures: u32, floor: Duration) -> Duration {
        self.next(failures).max(floor)
    }
}
