//! Admin API: bridge status and the session registry.
//!
//! Routes are always mounted; the auth middleware answers 404 while
//! `admin.enabled` is false so the API can be toggled by a config reload.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::{get_sessions, get_status};
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/sessions", get(get_sessions))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
