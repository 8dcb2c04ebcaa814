//! YAML configuration file for the rfspy tool.
//!
//! ```yaml
//! port: /dev/ttyACM0
//! baud_rate: 19200
//! write_timeout_ms: 1000
//! poll_interval_ms: 5
//! handshake_timeout_ms: 1000
//! response_timeout_ms: 1000
//! ```
//!
//! Every field is optional; missing fields take the defaults below and
//! command-line flags override whatever the file says.

use std::path::Path;
use std::time::Duration;

use rfspy_protocol::{validate_timeout, SessionConfig};
use serde::{Deserialize, Serialize};

use crate::error::ToolResult;

/// Baud rate subg_rfspy firmware uses on its UART.
pub const DEFAULT_BAUD_RATE: u32 = 19_200;

/// Configuration for the tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Serial device path.
    pub port: Option<String>,
    /// Serial baud rate.
    pub baud_rate: u32,
    /// Write timeout restored after each command (milliseconds).
    pub write_timeout_ms: u64,
    /// Sleep between polls while waiting for a response (milliseconds).
    pub poll_interval_ms: u64,
    /// Response timeout for each handshake step (milliseconds).
    pub handshake_timeout_ms: u64,
    /// Default timeout for `command` and `listen` (milliseconds).
    pub response_timeout_ms: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        let session = SessionConfig::default();
        ToolConfig {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            write_timeout_ms: session.default_write_timeout.as_millis() as u64,
            poll_interval_ms: session.poll_interval.as_millis() as u64,
            handshake_timeout_ms: session.handshake_timeout.as_millis() as u64,
            response_timeout_ms: 1000,
        }
    }
}

impl ToolConfig {
    /// Parse a config from YAML text.
    pub fn from_yaml(text: &str) -> ToolResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a config file.
    pub fn from_file(path: impl AsRef<Path>) -> ToolResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Build and validate the session configuration.
    pub fn session_config(&self) -> ToolResult<SessionConfig> {
        let config = SessionConfig::default()
            .with_default_write_timeout(Duration::from_millis(self.write_timeout_ms))
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_handshake_timeout(Duration::from_millis(self.handshake_timeout_ms));
        config.validate()?;
        Ok(config)
    }

    /// Default response timeout for `command` and `listen`.
    pub fn response_timeout(&self) -> ToolResult<Duration> {
        Ok(validate_timeout(Duration::from_millis(self.response_timeout_ms))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use rfspy_protocol::RfSpyError;

    #[test]
    fn test_defaults_match_session() {
        let config = ToolConfig::default();
        assert_eq!(config.session_config().unwrap(), SessionConfig::default());
        assert_eq!(config.baud_rate, 19_200);
        assert!(config.port.is_none());
    }

    #[test]
    fn test_partial_yaml() {
        let config = ToolConfig::from_yaml("port: /dev/ttyUSB0\nhandshake_timeout_ms: 2500\n").unwrap();
        assert_eq!(config.port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.baud_rate, DEFAULT_BAUD_RATE);

        let session = config.session_config().unwrap();
        assert_eq!(session.handshake_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ToolConfig::from_yaml("write_timeout_ms: 0").unwrap();
        assert!(matches!(
            config.session_config(),
            Err(ToolError::Protocol(RfSpyError::InvalidTimeout))
        ));

        let config = ToolConfig::from_yaml("response_timeout_ms: 0").unwrap();
        assert!(config.response_timeout().is_err());
    }

    #[test]
    fn test_bad_yaml() {
        assert!(matches!(
            ToolConfig::from_yaml("baud_rate: fast"),
            Err(ToolError::Config(_))
        ));
    }
}
