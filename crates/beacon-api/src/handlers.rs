//! REST API handlers.
//!
//! Registration parses the body itself rather than through `Json<T>` so
//! every malformed request, whatever its content type, is answered with
//! `400` and a plain-text reason, and never reaches the store.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ApiState;

/// Registration body.
///
/// Clients may also send `lastSeen` and `isHealthy`; the server assigns
/// both itself, so they are not read.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    nodes: usize,
    healthy: usize,
}

fn bad_request(msg: &str) -> Response {
    (StatusCode::BAD_REQUEST, msg.to_string()).into_response()
}

// ── Registration ───────────────────────────────────────────────

/// POST /register
pub async fn register(State(state): State<ApiState>, body: Bytes) -> Response {
    let req: RegisterRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            debug!(error = %e, "rejected registration: invalid body");
            return bad_request("invalid request body");
        }
    };

    let Some(address) = req.address.filter(|a| !a.trim().is_empty()) else {
        debug!("rejected registration: missing address");
        return bad_request("missing node address");
    };

    match state.store.upsert(&address).await {
        Ok(_) => (StatusCode::OK, Json(StatusResponse { status: "ok" })).into_response(),
        Err(e) => bad_request(&e.to_string()),
    }
}

// ── Discovery ──────────────────────────────────────────────────

/// GET /nodes
pub async fn list_nodes(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.store.snapshot_healthy().await)
}

// ── Self-health ────────────────────────────────────────────────

/// GET /healthz
pub async fn healthz(State(state): State<ApiState>) -> impl IntoResponse {
    let nodes = state.store.len().await;
    let healthy = state.store.snapshot_healthy().await.len();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        nodes,
        healthy,
    })
}
