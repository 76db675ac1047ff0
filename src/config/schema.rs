//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::protocol::DEFAULT_MAX_FRAME_SIZE;

/// Root configuration for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct BridgeConfig {
    /// Listener configuration (HTTP and WebSocket ports).
    pub listener: ListenerConfig,

    /// Backend game server address.
    pub backend: BackendConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Frame and body size limits.
    pub limits: LimitsConfig,

    /// HTTP surface options.
    pub http: HttpConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address for the one-shot HTTP API (e.g., "0.0.0.0:3001").
    pub http_address: String,

    /// Bind address for the WebSocket session endpoint (e.g., "0.0.0.0:3002").
    pub ws_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            http_address: "0.0.0.0:3001".to_string(),
            ws_address: "0.0.0.0:3002".to_string(),
        }
    }
}

/// Backend game server the bridge forwards to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    /// Hostname or IP address.
    pub host: String,

    /// TCP port.
    pub port: u16,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5050,
        }
    }
}

/// Timeout configuration for backend and HTTP operations.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Backend connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for a one-shot exchange after connecting, in seconds.
    pub response_secs: u64,

    /// Whole HTTP request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            response_secs: 10,
            request_secs: 30,
        }
    }
}

/// Size limits.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest frame payload accepted in either direction.
    pub max_frame_bytes: u64,

    /// Largest HTTP request body.
    pub max_body_bytes: usize,
}

impl LimitsConfig {
    /// Frame limit clamped to the wire format's `u32` length field.
    pub fn max_frame_size(&self) -> u32 {
        u32::try_from(self.max_frame_bytes).unwrap_or(u32::MAX)
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: u64::from(DEFAULT_MAX_FRAME_SIZE),
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// HTTP surface options.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    /// Answer CORS preflights and allow any origin.
    pub cors_permissive: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            cors_permissive: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "game_bridge=debug,tower_http=info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve `/admin/*` on the HTTP listener.
    pub enabled: bool,

    /// Bearer token required by the admin API.
    pub api_key: String,
}
