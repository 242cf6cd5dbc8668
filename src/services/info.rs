//! # Service status and observable snapshot.
//!
//! [`ServiceInfo`] is what observers see: identity, policy and the current
//! [`ServiceStatus`]. Snapshots are plain values; mutating one never touches the
//! supervisor's internal state.
//!
//! ## State machine
//! ```text
//!              start()
//!   Stopped ───────────► Starting ──(run loop begins)──► Running
//!      ▲                    ▲                              │
//!      │                    │ restart_delay elapsed        │ workload returned / failed
//!      │                    │                              ▼
//!      │                 Restarting ◄──────(restart)───────┤
//!      │                                                   │
//!      └────────────(no restart, stop(), shutdown)─────────┘
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Service life status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Not running and not scheduled; the run loop has exited.
    Stopped,
    /// Scheduled to run; the run loop is about to call the workload.
    Starting,
    /// Workload is executing.
    Running,
    /// Workload finished; waiting for the restart delay.
    Restarting,
}

impl ServiceStatus {
    /// Short lowercase name, same as the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Stopped => "stopped",
            ServiceStatus::Starting => "starting",
            ServiceStatus::Running => "running",
            ServiceStatus::Restarting => "restarting",
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one registered service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Unique service name (lookup key).
    pub name: String,
    /// Free text description.
    pub description: String,
    /// Status at the moment the snapshot was taken.
    pub status: ServiceStatus,
    /// Whether the service was started on registration.
    pub autostart: bool,
    /// Whether the workload is relaunched after it finishes.
    pub restart: bool,
    /// Delay before relaunch, serialized as fractional seconds.
    #[serde(with = "duration_secs")]
    pub restart_delay: Duration,
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}
