//! Command definitions (host → firmware).

use crate::constants::*;

/// A command to send to the firmware: one opcode byte plus opaque
/// parameters.
///
/// Parameters are not validated; the firmware knows how many bytes each
/// opcode expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command opcode.
    pub opcode: u8,
    /// Parameter bytes written after the opcode.
    pub params: Vec<u8>,
}

impl Command {
    /// Create a command with parameters.
    pub fn new(opcode: u8, params: impl Into<Vec<u8>>) -> Self {
        Command {
            opcode,
            params: params.into(),
        }
    }

    /// Create a command without parameters.
    pub fn bare(opcode: u8) -> Self {
        Command {
            opcode,
            params: Vec::new(),
        }
    }

    /// State query used by the handshake.
    pub fn get_state() -> Self {
        Command::bare(CMD_GET_STATE)
    }

    /// Version query used by the handshake.
    pub fn get_version() -> Self {
        Command::bare(CMD_GET_VERSION)
    }

    /// Encode to wire format: opcode followed by the parameters.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + self.params.len());
        buf.push(self.opcode);
        buf.extend_from_slice(&self.params);
        buf
    }

    /// Human-readable opcode name for logging.
    pub fn name(&self) -> &'static str {
        opcode_name(self.opcode)
    }
}

/// Name of a known opcode, or `"UNKNOWN"`.
pub fn opcode_name(opcode: u8) -> &'static str {
    match opcode {
        CMD_GET_STATE => "GET_STATE",
        CMD_GET_VERSION => "GET_VERSION",
        CMD_GET_PACKET => "GET_PACKET",
        CMD_SEND_PACKET => "SEND_PACKET",
        CMD_SEND_AND_LISTEN => "SEND_AND_LISTEN",
        CMD_UPDATE_REGISTER => "UPDATE_REGISTER",
        CMD_RESET => "RESET",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_bare() {
        assert_eq!(Command::get_state().encode(), vec![CMD_GET_STATE]);
        assert_eq!(Command::get_version().encode(), vec![CMD_GET_VERSION]);
    }

    #[test]
    fn test_encode_with_params() {
        let cmd = Command::new(CMD_UPDATE_REGISTER, vec![0x0D, 0x21]);
        assert_eq!(cmd.encode(), vec![CMD_UPDATE_REGISTER, 0x0D, 0x21]);
        assert_eq!(cmd.name(), "UPDATE_REGISTER");
    }

    #[test]
    fn test_opcode_name_unknown() {
        assert_eq!(opcode_name(0x42), "UNKNOWN");
    }
}
