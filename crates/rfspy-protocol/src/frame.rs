//! Response frame decoding.
//!
//! Firmware responses are terminated by a single zero byte:
//!
//! ```text
//! +-------------------+------+
//! | payload[0..N]     | 0x00 |
//! +-------------------+------+
//! ```
//!
//! Bytes arrive in arbitrary chunks, so the decoder accumulates them and
//! splits frames off the front of its buffer as delimiters show up.

use bytes::{Buf, Bytes, BytesMut};

use crate::constants::{
    FRAME_DELIMITER, MAX_INTERRUPTED_FRAME_LEN, RFSPY_ERROR_COMMAND_INTERRUPTED,
};

/// Initial receive buffer capacity.
pub const RECEIVE_BUFFER_CAPACITY: usize = 256;

/// Decoder state after a frame has been split off the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// Still looking for a frame to hand to the caller.
    Scanning,
    /// A frame is ready for the caller.
    FrameReady,
}

impl FrameState {
    /// Transition taken for a delimited payload.
    ///
    /// Interrupted-command frames keep the decoder scanning; everything
    /// else, including an empty payload, is ready.
    pub fn on_frame(payload: &[u8]) -> FrameState {
        if is_interrupted_frame(payload) {
            FrameState::Scanning
        } else {
            FrameState::FrameReady
        }
    }
}

/// Whether a payload is the firmware's "command interrupted" notice.
pub fn is_interrupted_frame(payload: &[u8]) -> bool {
    !payload.is_empty()
        && payload.len() <= MAX_INTERRUPTED_FRAME_LEN
        && payload[0] == RFSPY_ERROR_COMMAND_INTERRUPTED
}

/// A frame taken off the receive buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A frame for the caller. May be empty.
    Ready(Bytes),
    /// An interrupted-command frame that was dropped.
    Discarded(Bytes),
}

/// Accumulates received bytes and splits them into zero-delimited frames.
///
/// Consumed bytes (payload and delimiter) are evicted from the front of the
/// buffer and never seen again; bytes after the last delimiter stay
/// buffered until more data completes them.
#[derive(Debug, Default)]
pub struct ResponseFramer {
    /// Bytes received but not yet consumed.
    buffer: BytesMut,
}

impl ResponseFramer {
    /// Create an empty decoder.
    pub fn new() -> Self {
        ResponseFramer {
            buffer: BytesMut::with_capacity(RECEIVE_BUFFER_CAPACITY),
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Split the next delimited frame off the buffer, without filtering.
    ///
    /// Returns `None` if the buffer holds no delimiter yet.
    pub fn split_frame(&mut self) -> Option<Bytes> {
        let eop = self.buffer.iter().position(|&b| b == FRAME_DELIMITER)?;
        let payload = self.buffer.split_to(eop).freeze();
        self.buffer.advance(1);
        Some(payload)
    }

    /// Take the next frame off the buffer and run it through
    /// [`FrameState::on_frame`].
    pub fn decode(&mut self) -> Option<Decoded> {
        let payload = self.split_frame()?;
        match FrameState::on_frame(&payload) {
            FrameState::FrameReady => Some(Decoded::Ready(payload)),
            FrameState::Scanning => Some(Decoded::Discarded(payload)),
        }
    }

    /// Skip interrupted-command frames and return the next frame for the
    /// caller, if one is complete.
    pub fn next_ready(&mut self) -> Option<Bytes> {
        while let Some(decoded) = self.decode() {
            if let Decoded::Ready(payload) = decoded {
                return Some(payload);
            }
        }
        None
    }

    /// The unconsumed bytes.
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
