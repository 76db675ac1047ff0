//! Backend game server connector.
//!
//! # Responsibilities
//! - Hold the backend target (host, port) taken from configuration
//! - Open one fresh TCP connection per one-shot exchange or session
//! - Bound connection establishment with the configured timeout
//!
//! # Design Decisions
//! - No pooling: every session owns its backend connection exclusively
//! - Nagle disabled, frames are small and latency-sensitive
//! - Timeout and refusal are distinct errors

use std::time::Duration;

use tokio::net::TcpStream;

use crate::config::BackendConfig;
use crate::relay::BridgeError;

/// Address of the backend game server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendTarget {
    pub host: String,
    pub port: u16,
}

impl BackendTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Open a TCP connection, failing after `timeout`.
    pub async fn connect(&self, timeout: Duration) -> Result<TcpStream, BridgeError> {
        let attempt = TcpStream::connect((self.host.as_str(), self.port));
        let stream = match tokio::time::timeout(timeout, attempt).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(BridgeError::BackendUnreachable {
                    target: self.to_string(),
                    source,
                })
            }
            Err(_) => {
                return Err(BridgeError::ConnectTimeout {
                    target: self.to_string(),
                    timeout_secs: timeout.as_secs(),
                })
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(backend = %self, error = %e, "Failed to set TCP_NODELAY");
        }

        tracing::debug!(
            backend = %self,
            local_addr = ?stream.local_addr().ok(),
            "Backend connection established"
        );
        Ok(stream)
    }
}

impl From<&BackendConfig> for BackendTarget {
    fn from(config: &BackendConfig) -> Self {
        Self::new(config.host.clone(), config.port)
    }
}

impl std::fmt::Display for BackendTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn connects_to_listening_backend() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let target = BackendTarget::new("127.0.0.1", port);
        let stream = target.connect(Duration::from_secs(2)).await.unwrap();
        assert_eq!(stream.peer_addr().unwrap().port(), port);
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        // Bind then drop to get a port with nothing listening.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let target = BackendTarget::new("127.0.0.1", port);
        let err = target.connect(Duration::from_secs(2)).await.unwrap_err();
        assert!(matches!(err, BridgeError::BackendUnreachable { .. }), "got {err:?}");
    }

    #[test]
    fn display_and_from_config() {
        let target = BackendTarget::from(&BackendConfig::default());
        assert_eq!(target.to_string(), "localhost:5050");
    }
}
