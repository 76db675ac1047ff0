//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, apply TCP_HOST / TCP_PORT / BRIDGE_*_PORT)
//!     → validation.rs (semantic checks)
//!     → BridgeConfig (validated, immutable)
//!     → shared via Arc<ArcSwap<BridgeConfig>> with handlers and sessions
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server swaps the Arc
//!     → new requests and sessions observe new config
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults so the bridge runs with no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, load_startup_config, ConfigError};
pub use schema::{
    AdminConfig, BackendConfig, BridgeConfig, HttpConfig, LimitsConfig, ListenerConfig,
    ObservabilityConfig, TimeoutConfig,
};
