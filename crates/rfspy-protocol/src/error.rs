//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when talking to subg_rfspy firmware.
#[derive(Debug, Error)]
pub enum RfSpyError {
    /// A blocking operation was given a missing, zero or negative timeout.
    ///
    /// This is a coding error: an unbounded wait would stall everything
    /// behind the serial link.
    #[error("timeout cannot be missing, zero, or negative")]
    InvalidTimeout,

    /// The underlying byte stream failed to read or write.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The state/version handshake did not identify the device.
    #[error(
        "could not get subg_rfspy state or version (state: {status:?}, version: {version:?}); \
         have you got the right port/device and radio type?"
    )]
    HandshakeFailure {
        /// Raw response to the state query (empty if none).
        status: Vec<u8>,
        /// Raw response to the version query (empty if none).
        version: Vec<u8>,
    },
}

/// Result type alias for rfspy operations.
pub type RfSpyResult<T> = Result<T, RfSpyError>;
