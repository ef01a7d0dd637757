//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled so scanners and viewer frontends on
//! other origins can reach it.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the tracker.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws/beacons` -- `WebSocket` snapshot feed
/// - `POST /api/beacon` -- ingest one report
/// - `GET /api/beacons` -- current snapshot
/// - `GET /api/beacons/:id` -- single beacon
/// - `GET /api/status` -- tracker counters
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket
        .route("/ws/beacons", get(ws::ws_beacons))
        // REST API
        .route("/api/beacon", post(handlers::ingest_beacon))
        .route("/api/beacons", get(handlers::list_beacons))
        .route("/api/beacons/{id}", get(handlers::get_beacon))
        .route("/api/status", get(handlers::status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
