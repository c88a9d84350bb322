use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::NodeConfig;
use crate::dashboard::{self, DashboardState};
use crate::error::{NodeError, Result};
use crate::remote::{PeerClient, RemotePoller};
use crate::store::ResultStore;
use crate::worker::{LocalScheduler, ProcessExecutor};

/// How long the HTTP server gets to drain after shutdown is requested.
const SERVER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Main node that orchestrates all components
pub struct Node {
    config: NodeConfig,
    store: ResultStore,
    client: PeerClient,
}

impl Node {
    pub fn new(config: NodeConfig) -> Self {
        let store = ResultStore::new(config.peer_addrs());
        Self {
            config,
            store,
            client: PeerClient::new(),
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Handle to the node's result store, for reading snapshots.
    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Bind the configured listen address and run until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Fails if the listener cannot be bound or the HTTP server dies.
    /// Scheduler and poller failures are logged, never returned.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let addr = self.config.listen_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| NodeError::Bind { addr, source })?;
        self.run_with_listener(listener, shutdown).await
    }

    /// Run every component on its own task:
    /// 1. the local scheduler
    /// 2. one remote poller per configured peer
    /// 3. the HTTP server on `listener`
    ///
    /// Returns once all of them have stopped.
    pub async fn run_with_listener(
        self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<()> {
        let mut tasks: Vec<JoinHandle<()>> = Vec::with_capacity(self.config.peers.len() + 1);

        let scheduler = LocalScheduler::new(
            self.config.script_dir.clone(),
            self.config.check_interval,
            ProcessExecutor::new(),
            self.store.clone(),
        );
        tasks.push(tokio::spawn(scheduler.run(shutdown.clone())));

        for peer in &self.config.peers {
            let poller = RemotePoller::new(
                peer.clone(),
                self.config.fetch_interval,
                self.client.clone(),
                self.store.clone(),
            );
            tasks.push(tokio::spawn(poller.run(shutdown.clone())));
        }

        let state = DashboardState {
            store: self.store.clone(),
        };
        let mut server = tokio::spawn(dashboard::serve(listener, state, shutdown.clone()));

        let result = tokio::select! {
            res = &mut server => res.map_err(NodeError::from).and_then(|r| r),
            _ = shutdown.cancelled() => {
                match tokio::time::timeout(SERVER_DRAIN_TIMEOUT, &mut server).await {
                    Ok(res) => res.map_err(NodeError::from).and_then(|r| r),
                    Err(_) => {
                        tracing::warn!("HTTP server did not shut down gracefully before timeout");
                        server.abort();
                        Ok(())
                    }
                }
            }
        };

        // The server may have failed on its own; stop everything else too.
        shutdown.cancel();
        for task in tasks {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Task exited abnormally");
            }
        }

        result
    }
}
