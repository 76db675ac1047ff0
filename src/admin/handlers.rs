use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;
use crate::net::BackendTarget;
use crate::relay::SessionSnapshot;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub active_sessions: usize,
    pub backend: String,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let backend = BackendTarget::from(&state.config.load().backend).to_string();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        active_sessions: state.registry.len(),
        backend,
    })
}

pub async fn get_sessions(State(state): State<AppState>) -> Json<Vec<SessionSnapshot>> {
    Json(state.registry.snapshot())
}
