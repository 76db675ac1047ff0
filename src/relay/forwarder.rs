//! One-shot request/response forwarding.
//!
//! # Exchange
//! ```text
//! connect ──▶ write frame ──▶ shutdown(write) ──▶ read until one frame ──▶ drop
//! ```
//!
//! The backend reads each request to end-of-input, so the write half is
//! closed right after the frame goes out. The first complete frame is the
//! answer; anything after it is discarded with the connection.

use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::config::BridgeConfig;
use crate::net::BackendTarget;
use crate::observability::metrics;
use crate::protocol::{codec, Reassembler, DEFAULT_MAX_FRAME_SIZE};
use crate::relay::BridgeError;

const READ_CHUNK: usize = 8 * 1024;

/// Forwards single messages to the backend over ephemeral connections.
///
/// Cheap to build; holds no connection. Concurrent calls share nothing.
#[derive(Debug, Clone)]
pub struct Forwarder {
    target: BackendTarget,
    connect_timeout: Duration,
    response_timeout: Duration,
    max_frame_size: u32,
}

impl Forwarder {
    pub fn new(target: BackendTarget) -> Self {
        Self {
            target,
            connect_timeout: Duration::from_secs(5),
            response_timeout: Duration::from_secs(10),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(BackendTarget::from(&config.backend))
            .with_timeouts(
                Duration::from_secs(config.timeouts.connect_secs),
                Duration::from_secs(config.timeouts.response_secs),
            )
            .with_max_frame_size(config.limits.max_frame_size())
    }

    pub fn with_timeouts(mut self, connect: Duration, response: Duration) -> Self {
        self.connect_timeout = connect;
        self.response_timeout = response;
        self
    }

    pub fn with_max_frame_size(mut self, max_frame_size: u32) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    pub fn target(&self) -> &BackendTarget {
        &self.target
    }

    /// Send `message` as one frame and return the backend's single reply.
    pub async fn forward(&self, message: &str) -> Result<String, BridgeError> {
        let start = Instant::now();
        let result = self.exchange(message).await;

        match &result {
            Ok(response) => {
                tracing::debug!(backend = %self.target, response_len = response.len(), "One-shot exchange complete");
                metrics::record_forward("ok", start);
            }
            Err(e) => {
                tracing::warn!(backend = %self.target, error = %e, "One-shot exchange failed");
                metrics::record_forward(e.kind(), start);
            }
        }
        result
    }

    async fn exchange(&self, message: &str) -> Result<String, BridgeError> {
        // Oversized messages are refused before any connection is opened.
        let frame = codec::encode_with_limit(message, self.max_frame_size)?;

        let mut stream = self.target.connect(self.connect_timeout).await?;
        let round_trip = read_single_response(&mut stream, &frame, self.max_frame_size);

        match tokio::time::timeout(self.response_timeout, round_trip).await {
            Ok(result) => result,
            Err(_) => Err(BridgeError::ResponseTimeout(self.response_timeout.as_secs())),
        }
    }
}

async fn read_single_response(
    stream: &mut TcpStream,
    frame: &[u8],
    max_frame_size: u32,
) -> Result<String, BridgeError> {
    stream.write_all(frame).await?;
    stream.shutdown().await?;

    let mut reassembler = Reassembler::new(max_frame_size);
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(BridgeError::IncompleteResponse {
                buffered: reassembler.buffered(),
            });
        }

        let drained = reassembler.push(&chunk[..n]);
        if let Some(frame) = drained.frames.into_iter().next() {
            return Ok(frame.into_json_text()?);
        }
        if let Some(e) = drained.error {
            return Err(e.into());
        }
    }
}
