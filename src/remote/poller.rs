use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::PeerConfig;
use crate::error::FetchError;
use crate::remote::client::PeerClient;
use crate::store::ResultStore;

/// Polls one peer and records each outcome in the [`ResultStore`].
///
/// Each configured peer gets its own poller on its own task, so a slow or
/// unreachable peer only delays itself.
pub struct RemotePoller {
    peer: PeerConfig,
    interval: Duration,
    client: PeerClient,
    store: ResultStore,
}

impl RemotePoller {
    pub fn new(
        peer: PeerConfig,
        interval: Duration,
        client: PeerClient,
        store: ResultStore,
    ) -> Self {
        Self {
            peer,
            interval,
            client,
            store,
        }
    }

    pub fn addr(&self) -> &str {
        &self.peer.addr
    }

    /// Fetch now, then once per interval, until `shutdown` fires.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(peer = %self.peer.addr, interval = ?self.interval, "Remote poller started");

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = self.poll_once(&shutdown).await {
                        if shutdown.is_cancelled() {
                            break;
                        }
                        tracing::warn!(
                            peer = %self.peer.addr,
                            error = %e,
                            "Failed to fetch remote results"
                        );
                    }
                }
            }
        }

        tracing::info!(peer = %self.peer.addr, "Remote poller stopped");
    }

    /// Run one fetch cycle and store its outcome.
    ///
    /// On failure the error is recorded for this peer (earlier results are
    /// kept) and also returned to the caller for logging. A fetch abandoned
    /// because of shutdown is not recorded.
    pub async fn poll_once(&self, cancel: &CancellationToken) -> Result<usize, Arc<FetchError>> {
        let t0 = Instant::now();

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(Arc::new(FetchError::Cancelled(self.peer.addr.clone())));
            }
            outcome = self.client.fetch_results(&self.peer) => outcome,
        };

        match outcome {
            Ok(results) => {
                let count = results.len();
                tracing::debug!(
                    peer = %self.peer.addr,
                    count,
                    duration_ms = t0.elapsed().as_millis() as u64,
                    "Fetched remote results"
                );
                self.store.update_peer(&self.peer.addr, Ok(results)).await;
                Ok(count)
            }
            Err(e) => {
                let e = Arc::new(e);
                self.store.update_peer(&self.peer.addr, Err(e.clone())).await;
                Err(e)
            }
        }
    }
}
