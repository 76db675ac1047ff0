//! Length-prefixed frame encoding and decoding.
//!
//! Both directions are pure functions over byte slices. [`decode`] is
//! reentrant: feeding a stream in arbitrary pieces (carrying the remainder
//! forward) yields the same frames as decoding the concatenation at once.

use bytes::{BufMut, Bytes, BytesMut};

use super::{Frame, FrameError};

/// Size of the big-endian length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Default upper bound on a single payload (16 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

/// Encode a JSON document as one frame.
///
/// Only the `u32` protocol limit applies here.
pub fn encode(payload: &str) -> Result<Bytes, FrameError> {
    encode_with_limit(payload, u32::MAX)
}

/// Encode a JSON document as one frame, rejecting payloads above `limit` bytes.
pub fn encode_with_limit(payload: &str, limit: u32) -> Result<Bytes, FrameError> {
    let len = payload.len();
    let len32 = u32::try_from(len)
        .ok()
        .filter(|l| *l <= limit)
        .ok_or(FrameError::TooLarge { size: len as u64, limit })?;

    let mut buf = BytesMut::with_capacity(LENGTH_PREFIX_SIZE + len);
    buf.put_u32(len32);
    buf.put_slice(payload.as_bytes());
    Ok(buf.freeze())
}

/// Result of a [`decode`] pass.
#[derive(Debug, PartialEq, Eq)]
pub struct Decoded<'a> {
    /// Complete frames, in arrival order.
    pub frames: Vec<Frame>,
    /// Unconsumed tail: a partial frame, the offending prefix onward, or empty.
    pub remainder: &'a [u8],
    /// Protocol violation that stopped the scan. Frames before it are still
    /// in `frames`; nothing after it can be realigned.
    pub error: Option<FrameError>,
}

impl Decoded<'_> {
    pub fn is_corrupt(&self) -> bool {
        self.error.is_some()
    }
}

/// Read the length prefix at the start of `buf`.
///
/// Returns the total frame size (prefix included) once the whole frame is
/// present, `None` while more bytes are needed.
pub(crate) fn complete_frame_len(buf: &[u8], max_frame_size: u32) -> Result<Option<usize>, FrameError> {
    let Some(prefix) = buf.get(..LENGTH_PREFIX_SIZE) else {
        return Ok(None);
    };
    let declared = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);
    if declared > max_frame_size {
        return Err(FrameError::TooLarge {
            size: u64::from(declared),
            limit: max_frame_size,
        });
    }

    let total = LENGTH_PREFIX_SIZE + declared as usize;
    Ok((buf.len() >= total).then_some(total))
}

/// Split every complete frame off the front of `buffer`.
///
/// Stops at the first incomplete frame; no partial frame is ever emitted.
/// A length prefix above `max_frame_size` also stops the scan and is
/// reported in [`Decoded::error`] alongside the frames that preceded it.
pub fn decode(buffer: &[u8], max_frame_size: u32) -> Decoded<'_> {
    let mut frames = Vec::new();
    let mut offset = 0;

    let error = loop {
        match complete_frame_len(&buffer[offset..], max_frame_size) {
            Ok(Some(total)) => {
                let payload = &buffer[offset + LENGTH_PREFIX_SIZE..offset + total];
                frames.push(Frame::new(Bytes::copy_from_slice(payload)));
                offset += total;
            }
            Ok(None) => break None,
            Err(e) => break Some(e),
        }
    };

    Decoded {
        frames,
        remainder: &buffer[offset..],
        error,
    }
}
