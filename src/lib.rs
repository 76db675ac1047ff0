//! WebSocket/HTTP bridge to a length-prefixed JSON TCP backend.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod protocol;
pub mod relay;

pub use config::schema::BridgeConfig;
pub use http::BridgeServer;
pub use lifecycle::Shutdown;
