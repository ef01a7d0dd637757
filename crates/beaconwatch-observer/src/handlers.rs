//! REST endpoint handlers for the Observer server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `POST` | `/api/beacon` | Ingest one beacon report |
//! | `GET` | `/api/beacons` | Current snapshot |
//! | `GET` | `/api/beacons/:id` | Single tracked beacon |
//! | `GET` | `/api/status` | Tracker counters |

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse};
use axum::Json;
use beaconwatch_core::stats::StatsSnapshot;
use beaconwatch_types::{BeaconId, BeaconRecord, IngestRequest, ValidationError};
use serde::Serialize;

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// Acknowledgment returned to a reporter. Carries no beacon data.
#[derive(Debug, Serialize)]
pub struct IngestAck {
    /// Always `true`; failures use the error body instead.
    pub success: bool,
    /// Human-readable confirmation.
    pub message: &'static str,
}

/// Body of `GET /api/beacons`.
#[derive(Debug, Serialize)]
pub struct BeaconList {
    /// Number of tracked beacons.
    pub count: usize,
    /// Every tracked beacon, ordered by id.
    pub beacons: Vec<BeaconRecord>,
}

/// Body of `GET /api/status`.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    /// Number of tracked beacons.
    pub beacons: usize,
    /// Number of connected viewers.
    pub viewers: usize,
    /// Process-lifetime counters.
    #[serde(flatten)]
    pub stats: StatsSnapshot,
}

// ---------------------------------------------------------------------------
// POST /api/beacon
// ---------------------------------------------------------------------------

/// Ingest one beacon report and push the new snapshot to viewers.
///
/// Bodies that are not a JSON report, or reports missing `id` or
/// `signalStrength`, are rejected with `400` and change nothing.
pub async fn ingest_beacon(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<Json<IngestAck>, ObserverError> {
    let Json(request) = payload.map_err(|rejection| {
        let error = ValidationError::Malformed(rejection.body_text());
        state.ingestor.reject(&error);
        ObserverError::Validation(error)
    })?;

    state.ingestor.ingest(request).await?;

    Ok(Json(IngestAck {
        success: true,
        message: "beacon received",
    }))
}

// ---------------------------------------------------------------------------
// GET /api/beacons
// ---------------------------------------------------------------------------

/// List every tracked beacon.
pub async fn list_beacons(State(state): State<Arc<AppState>>) -> Json<BeaconList> {
    let beacons = state.store.snapshot().await;
    Json(BeaconList {
        count: beacons.len(),
        beacons,
    })
}

// ---------------------------------------------------------------------------
// GET /api/beacons/:id
// ---------------------------------------------------------------------------

/// Fetch one tracked beacon by hardware id.
pub async fn get_beacon(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<BeaconRecord>, ObserverError> {
    let id = BeaconId::parse(&raw_id)?;
    state
        .store
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| ObserverError::NotFound(format!("beacon {id} is not tracked")))
}

// ---------------------------------------------------------------------------
// GET /api/status
// ---------------------------------------------------------------------------

/// Report tracker counters.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusReport> {
    Json(StatusReport {
        beacons: state.store.len().await,
        viewers: state.broadcaster.viewer_count(),
        stats: state.stats.snapshot(state.clock.now()),
    })
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page listing live beacons.
///
/// The real viewer is an external frontend subscribed to `/ws/beacons`.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let beacons = state.store.snapshot().await;
    let viewers = state.broadcaster.viewer_count();
    let count = beacons.len();

    let rows = beacons.iter().map(render_row).collect::<String>();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Beaconwatch</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 900px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        table {{ border-collapse: collapse; width: 100%; }}
        th, td {{ border-bottom: 1px solid #30363d; padding: 0.4rem; text-align: left; }}
        th {{ color: #8b949e; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        hr {{ border: none; border-top: 1px solid #30363d; margin: 1.5rem 0; }}
    </style>
</head>
<body>
    <h1>Beaconwatch</h1>
    <p class="subtitle">Live beacon proximity tracker</p>

    <div>
        <div class="metric">
            <div class="label">Beacons</div>
            <div class="value">{count}</div>
        </div>
        <div class="metric">
            <div class="label">Viewers</div>
            <div class="value">{viewers}</div>
        </div>
    </div>

    <table>
        <tr><th>Id</th><th>Label</th><th>RSSI</th><th>Signal</th><th>Position</th><th>Updates</th></tr>
        {rows}
    </table>

    <hr>

    <h2>API</h2>
    <ul>
        <li>POST /api/beacon -- Ingest a report</li>
        <li><a href="/api/beacons">GET /api/beacons</a> -- Current snapshot</li>
        <li><a href="/api/status">GET /api/status</a> -- Tracker counters</li>
        <li>GET /ws/beacons -- Live snapshot feed (WebSocket)</li>
    </ul>
</body>
</html>"#
    ))
}

/// One `<tr>` of the status page table.
fn render_row(beacon: &BeaconRecord) -> String {
    let label = beacon.label.as_deref().map_or_else(String::new, escape_html);
    format!(
        "<tr><td>{id}</td><td>{label}</td><td>{rssi}</td><td>{quality}</td>\
         <td>{x:.0}, {y:.0}</td><td>{updates}</td></tr>",
        id = beacon.id,
        rssi = beacon.signal_strength,
        quality = beacon.quality().as_str(),
        x = beacon.position.x,
        y = beacon.position.y,
        updates = beacon.update_count,
    )
}

/// Escape the characters that matter inside HTML text.
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
