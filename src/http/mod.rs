//! Web-facing surfaces.
//!
//! # Data Flow
//! ```text
//! HTTP port (one-shot):
//!     → server.rs (request ID, trace, timeout, body limit, CORS)
//!     → api.rs (parse body, Forwarder::forward)
//!     → response.rs (envelope or error status)
//!
//! WebSocket port (sessions):
//!     → server.rs (trace)
//!     → websocket.rs (upgrade, relay::run_session)
//! ```

pub mod api;
pub mod request;
pub mod response;
pub mod server;
pub mod websocket;

pub use request::{MakeBridgeRequestId, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{AppState, BridgeServer};
