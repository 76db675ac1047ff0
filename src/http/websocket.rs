//! WebSocket session endpoint.
//!
//! # Data Flow
//! ```text
//! Client ←──── text frames ────→ Bridge ←──── length-prefixed frames ────→ Backend
//! ```
//!
//! Backend target and limits are read from the live config at upgrade
//! time; a reload never touches sessions already running.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::{ws::WebSocketUpgrade, ConnectInfo, State},
    response::Response,
};

use crate::http::server::AppState;
use crate::net::BackendTarget;
use crate::relay::{run_session, SessionContext};

/// `GET /` on the WebSocket port.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Response {
    let config = state.config.load_full();
    let ctx = SessionContext {
        target: BackendTarget::from(&config.backend),
        connect_timeout: Duration::from_secs(config.timeouts.connect_secs),
        max_frame_size: config.limits.max_frame_size(),
        registry: state.registry.clone(),
        shutdown: state.shutdown.subscribe(),
        client_addr: Some(addr),
    };

    ws.on_failed_upgrade(move |e| tracing::warn!(client = %addr, error = %e, "WebSocket upgrade failed"))
        .on_upgrade(move |socket| run_session(socket, ctx))
}
