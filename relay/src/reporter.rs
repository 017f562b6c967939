use crate::collector::{Collector, Hit};
use crate::metrics_defs::{DELIVERIES, DELIVERIES_INFLIGHT};
use shared::{counter, gauge};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Delivers hits in the background so responses never wait on the collector.
#[derive(Clone)]
pub struct Reporter {
    collector: Arc<dyn Collector>,
    inflight: Arc<watch::Sender<usize>>,
}

impl Reporter {
    pub fn new(collector: Arc<dyn Collector>) -> Self {
        let (inflight, _) = watch::channel(0);
        Reporter {
            collector,
            inflight: Arc::new(inflight),
        }
    }

    /// Spawns the delivery of `hit` and returns immediately. Failures are
    /// logged and dropped.
    pub fn report(&self, hit: Hit) -> JoinHandle<()> {
        let collector = self.collector.clone();
        let guard = InflightGuard::new(self.inflight.clone());

        tokio::spawn(async move {
            deliver(collector.as_ref(), &hit).await;
            drop(guard);
        })
    }

    pub fn inflight(&self) -> usize {
        *self.inflight.borrow()
    }

    /// Waits up to `grace` for running deliveries. Returns false if some were
    /// still running when the grace period ran out.
    pub async fn drain(&self, grace: Duration) -> bool {
        let mut rx = self.inflight.subscribe();
        matches!(timeout(grace, rx.wait_for(|count| *count == 0)).await, Ok(Ok(_)))
    }
}

async fn deliver(collector: &dyn Collector, hit: &Hit) {
    match collector.send(hit).await {
        Ok(status) => {
            counter!(DELIVERIES, "outcome" => "success").increment(1);
            tracing::info!(
                status = %status,
                cid = %hit.cid,
                ip = %hit.remote_addr,
                "Collector accepted hit"
            );
            tracing::info!(payload = %hit.payload, "Reported payload");
        }
        Err(e) => {
            counter!(DELIVERIES, "outcome" => "failure").increment(1);
            tracing::error!(
                error = %e,
                cid = %hit.cid,
                ip = %hit.remote_addr,
                "Collector POST error"
            );
        }
    }
}

// Decrements the in-flight count even if the delivery task panics
struct InflightGuard(Arc<watch::Sender<usize>>);

impl InflightGuard {
    fn new(inflight: Arc<watch::Sender<usize>>) -> Self {
        inflight.send_modify(|count| *count += 1);
        gauge!(DELIVERIES_INFLIGHT).increment(1.0);
        InflightGuard(inflight)
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.0.send_modify(|count| *count -= 1);
        gauge!(DELIVERIES_INFLIGHT).decrement(1.0);
    }
}
