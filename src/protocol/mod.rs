//! Backend wire protocol.
//!
//! # Wire Format
//! ```text
//! ┌──────────────────────────┬──────────────────────────────┐
//! │ length: u32 (big-endian) │ payload: N bytes UTF-8 JSON  │
//! └──────────────────────────┴──────────────────────────────┘
//! ```
//!
//! Frames are pipelined back-to-back on the TCP stream with no gaps.
//!
//! # Data Flow
//! ```text
//! outbound: JSON text → codec::encode → socket write
//! inbound:  socket read → reassembler::Reassembler::push → Drained { frames, error }
//!           → Frame::into_json_text → consumer
//! ```
//!
//! # Design Decisions
//! - Codec is pure; all buffering lives in the reassembler
//! - An oversized length prefix is unrecoverable: the stream cannot be realigned
//! - Payload validation (UTF-8, JSON) is deferred to the consumer of each frame

pub mod codec;
pub mod reassembler;

use bytes::Bytes;
use thiserror::Error;

pub use codec::{decode, encode, encode_with_limit, Decoded, DEFAULT_MAX_FRAME_SIZE, LENGTH_PREFIX_SIZE};
pub use reassembler::{Drained, Reassembler};

/// Errors raised while framing or unframing backend messages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Payload is larger than the protocol (or configured) limit.
    #[error("frame of {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: u64, limit: u32 },

    /// Payload bytes are not valid UTF-8.
    #[error("frame payload is not valid UTF-8")]
    InvalidUtf8,

    /// Payload is UTF-8 but not a JSON document.
    #[error("frame payload is not valid JSON: {0}")]
    InvalidJson(String),
}

/// One complete frame taken off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    payload: Bytes,
}

impl Frame {
    pub fn new(payload: Bytes) -> Self {
        Self { payload }
    }

    /// Raw payload bytes (length prefix stripped).
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Borrow the payload as UTF-8 text.
    pub fn as_text(&self) -> Result<&str, FrameError> {
        std::str::from_utf8(&self.payload).map_err(|_| FrameError::InvalidUtf8)
    }

    /// Take the payload as text, checking that it holds exactly one JSON document.
    ///
    /// The document is only checked for well-formedness, never interpreted.
    pub fn into_json_text(self) -> Result<String, FrameError> {
        let text = self.as_text()?;
        serde_json::from_str::<serde::de::IgnoredAny>(text)
            .map_err(|e| FrameError::InvalidJson(e.to_string()))?;
        Ok(text.to_owned())
    }
}
