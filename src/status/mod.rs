//! Point-in-time snapshots of the result store and the health status
//! derived from them.
//!
//! A [`Snapshot`] is a value: once read out of the
//! [`ResultStore`](crate::store::ResultStore) it never changes, so every
//! derived field is a pure function of it. Each of the four derived values
//! is computed lazily, at most once per snapshot:
//!
//! - [`Snapshot::local_ok`]: every local result succeeded
//! - [`Snapshot::peer_ok`]: per peer, last fetch succeeded and every result it
//!   reported succeeded
//! - [`Snapshot::remote_ok`]: every configured peer is ok
//! - [`Snapshot::global_ok`]: local and remote are both ok
//!
//! All of them are vacuously true over empty inputs.

pub mod lazy;

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::check::{all_successful, TimestampedResult};
use crate::store::PeerState;

pub use lazy::Lazy;

/// Memoized derived values for one snapshot.
#[derive(Default)]
struct DerivedStatus {
    local_ok: Lazy<bool>,
    remote_ok: Lazy<bool>,
    global_ok: Lazy<bool>,
    peer_ok: Lazy<Arc<BTreeMap<String, bool>>>,
}

/// A consistent read of all stored results.
pub struct Snapshot {
    local: Arc<Vec<TimestampedResult>>,
    peers: BTreeMap<String, PeerState>,
    derived: DerivedStatus,
}

impl Snapshot {
    pub fn new(local: Arc<Vec<TimestampedResult>>, peers: BTreeMap<String, PeerState>) -> Self {
        Self {
            local,
            peers,
            derived: DerivedStatus::default(),
        }
    }

    /// Local results from the last completed scheduler cycle.
    pub fn local(&self) -> &[TimestampedResult] {
        &self.local
    }

    /// State of every configured peer, keyed by address.
    pub fn peers(&self) -> &BTreeMap<String, PeerState> {
        &self.peers
    }

    pub fn peer(&self, addr: &str) -> Option<&PeerState> {
        self.peers.get(addr)
    }

    pub fn local_ok(&self) -> bool {
        self.derived
            .local_ok
            .get_or_fill(|| all_successful(&self.local))
    }

    /// Health of each configured peer.
    pub fn peer_ok(&self) -> Arc<BTreeMap<String, bool>> {
        self.derived.peer_ok.get_or_fill(|| {
            Arc::new(
                self.peers
                    .iter()
                    .map(|(addr, state)| (addr.clone(), state.is_ok()))
                    .collect(),
            )
        })
    }

    pub fn remote_ok(&self) -> bool {
        self.derived
            .remote_ok
            .get_or_fill(|| self.peer_ok().values().all(|ok| *ok))
    }

    pub fn global_ok(&self) -> bool {
        self.derived
            .global_ok
            .get_or_fill(|| self.local_ok() && self.remote_ok())
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("local", &self.local)
            .field("peers", &self.peers)
            .finish_non_exhaustive()
    }
}
