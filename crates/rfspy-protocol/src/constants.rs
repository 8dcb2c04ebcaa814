//! Protocol constants
//!
//! Command opcodes, in-band status codes and framing bytes used by the
//! subg_rfspy serial protocol.

// ============================================================================
// Command Codes (host → firmware)
// ============================================================================

/// Query the firmware state. A healthy device answers `OK`.
pub const CMD_GET_STATE: u8 = 1;
/// Query the firmware version string.
pub const CMD_GET_VERSION: u8 = 2;
/// Receive a packet from the radio.
pub const CMD_GET_PACKET: u8 = 3;
/// Transmit a packet over the radio.
pub const CMD_SEND_PACKET: u8 = 4;
/// Transmit a packet, then listen for a reply.
pub const CMD_SEND_AND_LISTEN: u8 = 5;
/// Write a radio register.
pub const CMD_UPDATE_REGISTER: u8 = 6;
/// Reset the radio firmware.
pub const CMD_RESET: u8 = 7;

// ============================================================================
// Status Codes (firmware → host, as response payload)
// ============================================================================

/// The firmware gave up waiting for radio data.
pub const RFSPY_ERROR_TIMEOUT: u8 = 0xAA;
/// The previous command was interrupted by a new one.
///
/// Short frames starting with this code are dropped by the framing layer.
pub const RFSPY_ERROR_COMMAND_INTERRUPTED: u8 = 0xBB;
/// The firmware received zero bytes of radio data.
pub const RFSPY_ERROR_ZERO_DATA: u8 = 0xCC;

// ============================================================================
// Framing
// ============================================================================

/// End-of-frame marker for firmware responses.
pub const FRAME_DELIMITER: u8 = 0x00;

/// Interrupted-command frames are at most this many bytes (excluding the
/// delimiter).
pub const MAX_INTERRUPTED_FRAME_LEN: usize = 2;

/// Expected response to [`CMD_GET_STATE`].
pub const STATE_OK: &[u8] = b"OK";

/// Shortest version string considered plausible.
pub const MIN_VERSION_LEN: usize = 3;

/// Classification of a single-byte firmware status payload.
///
/// The framing layer only acts on [`DeviceStatus::CommandInterrupted`]; the
/// other codes reach the caller as ordinary payload and can be classified
/// with [`DeviceStatus::from_payload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    /// `0xAA`: the firmware timed out.
    Timeout,
    /// `0xBB`: the command was interrupted.
    CommandInterrupted,
    /// `0xCC`: zero-length radio data.
    ZeroData,
}

impl DeviceStatus {
    /// Classify a status code byte.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            RFSPY_ERROR_TIMEOUT => Some(DeviceStatus::Timeout),
            RFSPY_ERROR_COMMAND_INTERRUPTED => Some(DeviceStatus::CommandInterrupted),
            RFSPY_ERROR_ZERO_DATA => Some(DeviceStatus::ZeroData),
            _ => None,
        }
    }

    /// Classify a response payload that consists of a single status byte.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        match payload {
            [code] => Self::from_code(*code),
            _ => None,
        }
    }

    /// The wire value of this status.
    pub fn code(self) -> u8 {
        match self {
            DeviceStatus::Timeout => RFSPY_ERROR_TIMEOUT,
            DeviceStatus::CommandInterrupted => RFSPY_ERROR_COMMAND_INTERRUPTED,
            DeviceStatus::ZeroData => RFSPY_ERROR_ZERO_DATA,
        }
    }
}

impl std::fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceStatus::Timeout => write!(f, "device timeout (0x{:02X})", self.code()),
            DeviceStatus::CommandInterrupted => {
                write!(f, "command interrupted (0x{:02X})", self.code())
            }
            DeviceStatus::ZeroData => write!(f, "zero data (0x{:02X})", self.code()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_payload() {
        assert_eq!(DeviceStatus::from_payload(&[0xAA]), Some(DeviceStatus::Timeout));
        assert_eq!(DeviceStatus::from_payload(&[0xCC]), Some(DeviceStatus::ZeroData));
        assert_eq!(DeviceStatus::from_payload(&[0xAA, 0x01]), None);
        assert_eq!(DeviceStatus::from_payload(&[0x42]), None);
        assert_eq!(DeviceStatus::from_payload(&[]), None);
    }

    #[test]
    fn test_status_code_roundtrip() {
        for status in [
            DeviceStatus::Timeout,
            DeviceStatus::CommandInterrupted,
            DeviceStatus::ZeroData,
        ] {
            assert_eq!(DeviceStatus::from_code(status.code()), Some(status));
        }
    }
}
