//! HTTP API routes.

mod relay_ws;

use axum::{Router, routing::get};

use crate::state::AppState;

/// `GET /` upgrades to the relay WebSocket.
pub fn relay_routes() -> Router<AppState> {
    Router::new().route("/", get(relay_ws::relay_ws))
}
