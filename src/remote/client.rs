//! HTTP client for a peer's `/api/v1/results` endpoint.

use reqwest::header::ACCEPT;
use reqwest::StatusCode;

use crate::check::TimestampedResult;
use crate::config::PeerConfig;
use crate::error::FetchError;

/// Thin wrapper over a shared [`reqwest::Client`].
///
/// Cloning is cheap; all pollers share one connection pool.
#[derive(Debug, Clone, Default)]
pub struct PeerClient {
    client: reqwest::Client,
}

impl PeerClient {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Fetch the peer's current local results.
    ///
    /// Anything other than `200 OK` with a JSON array of results is an error.
    pub async fn fetch_results(
        &self,
        peer: &PeerConfig,
    ) -> Result<Vec<TimestampedResult>, FetchError> {
        let response = self
            .client
            .get(peer.results_url())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| FetchError::Request {
                addr: peer.addr.clone(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                addr: peer.addr.clone(),
                status: status.as_u16(),
            });
        }

        response
            .json::<Vec<TimestampedResult>>()
            .await
            .map_err(|source| FetchError::Decode {
                addr: peer.addr.clone(),
                source,
            })
    }
}
