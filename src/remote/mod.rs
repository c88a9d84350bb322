//! Aggregation of peer results.
//!
//! One [`RemotePoller`] runs per configured peer. Each fetches
//! `GET http://<addr>/api/v1/results` through a shared [`PeerClient`] and
//! writes the results, or the fetch error, into that peer's entry in the
//! [`ResultStore`](crate::store::ResultStore). Pollers never touch each
//! other's entries or the local results.

pub mod client;
pub mod poller;

pub use client::PeerClient;
pub use poller::RemotePoller;
