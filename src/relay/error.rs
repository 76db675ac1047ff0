//! Relay error definitions.

use thiserror::Error;

use crate::protocol::FrameError;

/// Errors that can occur while forwarding to the backend.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Connection refused, host unreachable or name resolution failed.
    #[error("backend unreachable at {target}: {source}")]
    BackendUnreachable {
        target: String,
        source: std::io::Error,
    },

    /// Connection establishment exceeded the connect timeout.
    #[error("connection to backend {target} timed out after {timeout_secs}s")]
    ConnectTimeout { target: String, timeout_secs: u64 },

    /// Backend accepted the request but did not answer in time.
    #[error("backend did not respond within {0}s")]
    ResponseTimeout(u64),

    /// Backend closed the connection before a complete frame arrived.
    #[error("backend closed without complete response ({buffered} bytes pending)")]
    IncompleteResponse { buffered: usize },

    /// Read or write failure on an established connection.
    #[error("backend I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing or payload failure.
    #[error("invalid frame: {0}")]
    Frame(#[from] FrameError),
}

impl BridgeError {
    /// Short machine-friendly kind, used as a metrics label and in
    /// diagnostics sent to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::BackendUnreachable { .. } => "backend_unreachable",
            BridgeError::ConnectTimeout { .. } => "connect_timeout",
            BridgeError::ResponseTimeout(_) => "response_timeout",
            BridgeError::IncompleteResponse { .. } => "incomplete_response",
            BridgeError::Io(_) => "io",
            BridgeError::Frame(FrameError::TooLarge { .. }) => "frame_too_large",
            BridgeError::Frame(_) => "malformed_payload",
        }
    }

    /// Connect-phase failure (nothing was sent to the backend).
    pub fn is_connect_failure(&self) -> bool {
        matches!(
            self,
            BridgeError::BackendUnreachable { .. } | BridgeError::ConnectTimeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_and_messages() {
        let err = BridgeError::IncompleteResponse { buffered: 3 };
        assert_eq!(err.kind(), "incomplete_response");
        assert!(err.to_string().starts_with("backend closed without complete response"));

        let err = BridgeError::from(FrameError::InvalidUtf8);
        assert_eq!(err.kind(), "malformed_payload");
        assert!(!err.is_connect_failure());

        let err = BridgeError::ConnectTimeout {
            target: "backend:5050".into(),
            timeout_secs: 5,
        };
        assert!(err.is_connect_failure());
        assert_eq!(err.to_string(), "connection to backend backend:5050 timed out after 5s");
    }
}
