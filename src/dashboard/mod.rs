use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};

use crate::check::TimestampedResult;
use crate::error::NodeError;
use crate::status::Snapshot;
use crate::store::ResultStore;

pub mod render;

#[derive(Clone)]
pub struct DashboardState {
    pub store: ResultStore,
}

#[derive(Serialize)]
struct PeerStatusResponse {
    ok: bool,
    pending: bool,
    error: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds_option")]
    fetched_at: Option<DateTime<Utc>>,
    results: Vec<TimestampedResult>,
}

#[derive(Serialize)]
struct StatusResponse {
    local_ok: bool,
    remote_ok: bool,
    global_ok: bool,
    peers: BTreeMap<String, PeerStatusResponse>,
}

impl StatusResponse {
    fn from_snapshot(snapshot: &Snapshot) -> Self {
        let peer_ok = snapshot.peer_ok();
        let peers = snapshot
            .peers()
            .iter()
            .map(|(addr, state)| {
                let response = PeerStatusResponse {
                    ok: peer_ok.get(addr).copied().unwrap_or(false),
                    pending: state.is_pending(),
                    error: state.error().map(|e| e.to_string()),
                    fetched_at: state.fetched_at(),
                    results: state.results().to_vec(),
                };
                (addr.clone(), response)
            })
            .collect();

        Self {
            local_ok: snapshot.local_ok(),
            remote_ok: snapshot.remote_ok(),
            global_ok: snapshot.global_ok(),
            peers,
        }
    }
}

/// Routes served by every node. Peers poll `/api/v1/results`.
pub fn router(state: DashboardState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/healthz", get(healthz_handler))
        .route("/api/v1/results", get(results_handler))
        .route("/api/v1/status", get(status_handler))
        .layer(cors)
        .with_state(state)
}

/// Serve the router on an already-bound listener until `shutdown` fires.
pub async fn serve(
    listener: tokio::net::TcpListener,
    state: DashboardState,
    shutdown: CancellationToken,
) -> Result<(), NodeError> {
    let addr: Option<SocketAddr> = listener.local_addr().ok();
    tracing::info!(addr = ?addr, "Starting HTTP server");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}

async fn index_handler(State(state): State<DashboardState>) -> Html<String> {
    let snapshot = state.store.snapshot().await;
    Html(render::index(&snapshot))
}

async fn results_handler(State(state): State<DashboardState>) -> Json<Vec<TimestampedResult>> {
    let snapshot = state.store.snapshot().await;
    Json(snapshot.local().to_vec())
}

async fn status_handler(State(state): State<DashboardState>) -> impl IntoResponse {
    let snapshot = state.store.snapshot().await;
    Json(StatusResponse::from_snapshot(&snapshot))
}

async fn healthz_handler(
    State(state): State<DashboardState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let verbose = params.contains_key("verbose");
    let snapshot = state.store.snapshot().await;

    let status = if snapshot.global_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = render::healthz(&snapshot, verbose);

    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
}
