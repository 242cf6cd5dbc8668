#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use binp::{ServiceInfo, ServiceSpecBuilder, ServiceSpec, ServiceStatus, Subscription, WorkloadError};
use tokio_util::sync::CancellationToken;

/// Receives the next `n` snapshots of service `name`, skipping other services.
pub async fn next_statuses(sub: &mut Subscription<ServiceInfo>, name: &str, n: usize) -> Vec<ServiceStatus> {
    let mut seen = Vec::with_capacity(n);
    while seen.len() < n {
        let info = sub.recv().await.expect("emitter alive");
        if info.name == name {
            seen.push(info.status);
        }
    }
    seen
}

/// Waits until service `name` reports `status`; returns the virtual instant.
pub async fn wait_for(sub: &mut Subscription<ServiceInfo>, name: &str, status: ServiceStatus) -> tokio::time::Instant {
    loop {
        let info = sub.recv().await.expect("emitter alive");
        if info.name == name && info.status == status {
            return tokio::time::Instant::now();
        }
    }
}

/// Workload that counts its runs and returns at once.
pub fn counting(builder: ServiceSpecBuilder, runs: Arc<AtomicUsize>) -> ServiceSpec {
    builder.build(move |_ctx: CancellationToken| {
        let runs = Arc::clone(&runs);
        async move {
            runs.fetch_add(1, Ordering::SeqCst);
            Ok::<_, WorkloadError>(())
        }
    })
}

/// Workload that counts its runs and always fails.
pub fn failing(builder: ServiceSpecBuilder, runs: Arc<AtomicUsize>) -> ServiceSpec {
    builder.build(move |_ctx: CancellationToken| {
        let runs = Arc::clone(&runs);
        async move {
            runs.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(WorkloadError::fail("upstream unavailable"))
        }
    })
}

/// Workload that counts its runs and sleeps for a long time.
pub fn sleeping(builder: ServiceSpecBuilder, runs: Arc<AtomicUsize>) -> ServiceSpec {
    builder.build(move |_ctx: CancellationToken| {
        let runs = Arc::clone(&runs);
        async move {
            runs.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok::<_, WorkloadError>(())
        }
    })
}

/// Sets its flag when dropped.
pub struct DropFlag(pub Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}
