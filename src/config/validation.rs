//! Configuration validation.
//!
//! Serde handles syntax; this module checks semantics and reports every
//! problem at once rather than stopping at the first.

use std::net::SocketAddr;

use crate::config::schema::BridgeConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a configuration, collecting all errors.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let http = parse_addr(&config.listener.http_address, "listener.http_address", &mut errors);
    let ws = parse_addr(&config.listener.ws_address, "listener.ws_address", &mut errors);
    if let (Some(http), Some(ws)) = (http, ws) {
        if http == ws && http.port() != 0 {
            errors.push(ValidationError::new(
                "listener.ws_address",
                "must differ from listener.http_address",
            ));
        }
    }

    if config.backend.host.trim().is_empty() {
        errors.push(ValidationError::new("backend.host", "must not be empty"));
    }
    if config.backend.port == 0 {
        errors.push(ValidationError::new("backend.port", "must be non-zero"));
    }

    for (field, value) in [
        ("timeouts.connect_secs", config.timeouts.connect_secs),
        ("timeouts.response_secs", config.timeouts.response_secs),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }

    if config.limits.max_frame_bytes == 0 {
        errors.push(ValidationError::new("limits.max_frame_bytes", "must be greater than zero"));
    } else if config.limits.max_frame_bytes > u64::from(u32::MAX) {
        errors.push(ValidationError::new(
            "limits.max_frame_bytes",
            format!("must fit the 32-bit length prefix (max {})", u32::MAX),
        ));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::new("limits.max_body_bytes", "must be greater than zero"));
    }

    if config.observability.metrics_enabled {
        parse_addr(
            &config.observability.metrics_address,
            "observability.metrics_address",
            &mut errors,
        );
    }

    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::new(
            "admin.api_key",
            "required when the admin API is enabled",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn parse_addr(
    value: &str,
    field: &'static str,
    errors: &mut Vec<ValidationError>,
) -> Option<SocketAddr> {
    match value.parse() {
        Ok(addr) => Some(addr),
        Err(e) => {
            errors.push(ValidationError::new(field, format!("invalid socket address {value:?}: {e}")));
            None
        }
    }
}
