use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::check::{all_successful, TimestampedResult};
use crate::error::FetchError;
use crate::status::Snapshot;

/// Latest known state of one peer.
///
/// A failed fetch records its error but keeps the results of the last
/// successful fetch, so stale data can still be displayed. A successful
/// fetch replaces the results and clears the error.
#[derive(Debug, Clone, Default)]
pub struct PeerState {
    results: Arc<Vec<TimestampedResult>>,
    error: Option<Arc<FetchError>>,
    fetched_at: Option<DateTime<Utc>>,
}

impl PeerState {
    /// Results from the last successful fetch.
    pub fn results(&self) -> &[TimestampedResult] {
        &self.results
    }

    /// Error from the last fetch, if it failed.
    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_deref()
    }

    /// When the last successful fetch completed.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    /// No fetch has completed yet, successfully or not.
    pub fn is_pending(&self) -> bool {
        self.fetched_at.is_none() && self.error.is_none()
    }

    /// The last fetch succeeded and every reported result is successful.
    pub fn is_ok(&self) -> bool {
        self.error.is_none() && all_successful(&self.results)
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    local: Arc<Vec<TimestampedResult>>,
    peers: BTreeMap<String, PeerState>,
}

/// Shared, lock-guarded home of the most recent local and remote results.
///
/// This is the only mutable state shared between tasks. Writers replace
/// whole entries under the write lock; readers take a [`Snapshot`] under the
/// read lock and then work on it without holding any lock.
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl ResultStore {
    /// Create a store that tracks the given peer addresses.
    ///
    /// Every configured peer appears in snapshots from the start, in the
    /// pending state, so that aggregate status always covers all of them.
    pub fn new<I, S>(peers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let peers = peers
            .into_iter()
            .map(|addr| (addr.into(), PeerState::default()))
            .collect();

        Self {
            inner: Arc::new(RwLock::new(StoreInner {
                local: Arc::new(Vec::new()),
                peers,
            })),
        }
    }

    /// Swap in a complete new set of local results.
    pub async fn replace_local(&self, results: Vec<TimestampedResult>) {
        let results = Arc::new(results);
        self.inner.write().await.local = results;
    }

    /// Record the outcome of one fetch cycle for `addr`.
    pub async fn update_peer(
        &self,
        addr: &str,
        outcome: Result<Vec<TimestampedResult>, Arc<FetchError>>,
    ) {
        let mut inner = self.inner.write().await;
        let state = inner.peers.entry(addr.to_string()).or_default();
        match outcome {
            Ok(results) => {
                state.results = Arc::new(results);
                state.error = None;
                state.fetched_at = Some(Utc::now());
            }
            Err(e) => {
                state.error = Some(e);
            }
        }
    }

    /// Read a consistent copy of everything currently stored.
    pub async fn snapshot(&self) -> Snapshot {
        let inner = self.inner.read().await;
        Snapshot::new(inner.local.clone(), inner.peers.clone())
    }
}
