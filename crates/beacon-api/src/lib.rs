//! beacon-api: HTTP surface of the beacon registry.
//!
//! Translates HTTP calls into [`RegistryStore`] operations and serializes
//! the results as JSON.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/register` | Register or heartbeat a node (`{"address": "host:port"}`) |
//! | GET | `/nodes` | List healthy nodes |
//! | GET | `/healthz` | Registry self-health and record counts |

pub mod handlers;

use axum::Router;
use axum::routing::{get, post};
use beacon_registry::RegistryStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: RegistryStore,
}

/// Build the registry router.
pub fn build_router(store: RegistryStore) -> Router {
    let state = ApiState { store };

    Router::new()
        .route("/register", post(handlers::register))
        .route("/nodes", get(handlers::list_nodes))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
}
