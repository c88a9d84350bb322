use std::path::PathBuf;

use thiserror::Error;

/// A script could not be invoked. Aborts the current scheduler cycle only.
///
/// A script that runs and exits non-zero is *not* an execution error; it is
/// an ordinary, unhealthy [`CheckResult`](crate::check::CheckResult).
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("reading script directory {path:?}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to stat script {path:?}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("script is not executable: {0:?}")]
    NotExecutable(PathBuf),

    #[error("failed to start script {path:?}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for script {path:?}: {source}")]
    Wait {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("script run cancelled: {0:?}")]
    Cancelled(PathBuf),
}

/// A peer's results could not be fetched. Recorded against that peer only.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {addr} failed: {source}")]
    Request {
        addr: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{addr} returned HTTP {status}")]
    Status { addr: String, status: u16 },

    #[error("decoding results from {addr}: {source}")]
    Decode {
        addr: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("fetch from {0} cancelled")]
    Cancelled(String),
}

/// Fatal errors that stop the node itself.
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server failed: {0}")]
    Serve(#[from] std::io::Error),

    #[error("task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T, E = NodeError> = std::result::Result<T, E>;
