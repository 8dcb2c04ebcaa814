//! Response definitions (firmware → host).

use std::borrow::Cow;

use bytes::Bytes;

use crate::constants::{DeviceStatus, MIN_VERSION_LEN, STATE_OK};

/// Outcome of waiting for a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A non-empty frame.
    Frame(Bytes),
    /// The firmware sent a bare delimiter.
    Empty,
    /// No frame arrived before the timeout.
    TimedOut,
}

impl Response {
    /// Build from a decoded payload; an empty payload is [`Response::Empty`].
    pub fn from_payload(payload: Bytes) -> Self {
        if payload.is_empty() {
            Response::Empty
        } else {
            Response::Frame(payload)
        }
    }

    /// The payload, empty for [`Response::Empty`] and [`Response::TimedOut`].
    pub fn payload(&self) -> &[u8] {
        match self {
            Response::Frame(payload) => payload,
            Response::Empty | Response::TimedOut => &[],
        }
    }

    /// Flatten into the payload bytes. A timeout and an empty frame both
    /// become empty bytes.
    pub fn into_bytes(self) -> Bytes {
        match self {
            Response::Frame(payload) => payload,
            Response::Empty | Response::TimedOut => Bytes::new(),
        }
    }

    /// Whether the wait ran out.
    pub fn is_timed_out(&self) -> bool {
        matches!(self, Response::TimedOut)
    }

    /// Whether a non-empty frame was received.
    pub fn is_frame(&self) -> bool {
        matches!(self, Response::Frame(_))
    }

    /// Classify a single-byte status payload (`0xAA`, `0xCC`).
    pub fn device_status(&self) -> Option<DeviceStatus> {
        DeviceStatus::from_payload(self.payload())
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Response::Frame(payload) => write!(f, "{}", hex::encode(payload)),
            Response::Empty => write!(f, "(empty frame)"),
            Response::TimedOut => write!(f, "(timed out)"),
        }
    }
}

/// What the handshake learned about the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Response to the state query.
    pub status: Bytes,
    /// Response to the version query.
    pub version: Bytes,
}

impl DeviceIdentity {
    /// Whether the firmware reported `OK`.
    pub fn is_ok(&self) -> bool {
        self.status == STATE_OK
    }

    /// Whether the version string is long enough to be plausible.
    pub fn has_version(&self) -> bool {
        self.version.len() >= MIN_VERSION_LEN
    }

    /// Status as text (lossy).
    pub fn status_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.status)
    }

    /// Version as text (lossy).
    pub fn version_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.version)
    }
}
