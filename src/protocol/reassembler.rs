//! Per-connection stream reassembly.
//!
//! TCP delivers bytes, not frames. A [`Reassembler`] is owned by exactly one
//! connection and accumulates whatever each read returns, splitting complete
//! frames off the front of its buffer. Whatever remains is always the
//! unconsumed tail of the stream.

use bytes::BytesMut;

use super::codec::{complete_frame_len, DEFAULT_MAX_FRAME_SIZE, LENGTH_PREFIX_SIZE};
use super::{Frame, FrameError};

const INITIAL_CAPACITY: usize = 8 * 1024;

/// Frames completed by one [`Reassembler::push`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Drained {
    /// Complete frames, in arrival order.
    pub frames: Vec<Frame>,
    /// Set when the stream hit a protocol violation after `frames`.
    pub error: Option<FrameError>,
}

#[derive(Debug)]
pub struct Reassembler {
    buffer: BytesMut,
    max_frame_size: u32,
}

impl Reassembler {
    pub fn new(max_frame_size: u32) -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_CAPACITY),
            max_frame_size,
        }
    }

    /// Append `data` and take every frame it completes.
    ///
    /// No frames while a frame is still partial. Frames that precede a
    /// protocol violation are returned together with the error; after an
    /// error the stream is corrupt and the owning connection must be closed.
    pub fn push(&mut self, data: &[u8]) -> Drained {
        self.buffer.extend_from_slice(data);

        let mut drained = Drained::default();
        loop {
            match complete_frame_len(&self.buffer, self.max_frame_size) {
                Ok(Some(total)) => {
                    let mut frame = self.buffer.split_to(total);
                    let payload = frame.split_off(LENGTH_PREFIX_SIZE).freeze();
                    drained.frames.push(Frame::new(payload));
                }
                Ok(None) => break,
                Err(e) => {
                    drained.error = Some(e);
                    break;
                }
            }
        }
        drained
    }

    /// Bytes held for a frame that has not fully arrived.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}
