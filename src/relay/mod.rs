//! Relay subsystem.
//!
//! # Surfaces
//! - [`Forwarder`]: one message, one ephemeral backend connection
//! - [`run_session`]: a WebSocket client paired with a dedicated backend
//!   connection for its whole lifetime
//!
//! Both deliver backend output to clients wrapped in an [`Envelope`].

pub mod envelope;
pub mod error;
pub mod forwarder;
pub mod registry;
pub mod session;
pub mod state;

pub use envelope::Envelope;
pub use error::BridgeError;
pub use forwarder::Forwarder;
pub use registry::{SessionEntry, SessionRegistry, SessionSnapshot};
pub use session::{run_session, SessionContext};
pub use state::{CloseCause, CloseReason, SessionAction, SessionCore, SessionEvent, SessionState};
