//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! One-shot request or new WebSocket session
//!     → backend.rs (resolve target, connect with timeout)
//!     → connection.rs (session id for registry and logs)
//!     → Hand off to relay layer
//! ```
//!
//! # Design Decisions
//! - One backend connection per exchange or session, never shared
//! - Connect failures surface immediately; the bridge never retries

pub mod backend;
pub mod connection;

pub use backend::BackendTarget;
pub use connection::SessionId;
