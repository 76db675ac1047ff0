//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → listeners stop accepting → sessions close GoingAway → drain → exit
//! ```
//!
//! # Design Decisions
//! - Drain has a deadline: sessions still registered after it are abandoned

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
