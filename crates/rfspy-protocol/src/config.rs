//! Session configuration and timeout validation.

use std::time::Duration;

use crate::error::{RfSpyError, RfSpyResult};

/// Write timeout the stream is returned to after every command.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Sleep between polls of the stream while waiting for a response.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// How long each handshake step waits for its response.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(1);

/// Tunables for a [`FramedSession`](crate::FramedSession).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Write timeout restored on the stream after each command.
    pub default_write_timeout: Duration,
    /// Sleep between polls inside `get_response`.
    pub poll_interval: Duration,
    /// Response timeout for each step of `sync`.
    pub handshake_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            default_write_timeout: DEFAULT_WRITE_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }
}

impl SessionConfig {
    /// Set the default write timeout.
    pub fn with_default_write_timeout(mut self, timeout: Duration) -> Self {
        self.default_write_timeout = timeout;
        self
    }

    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the handshake response timeout.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Check that every timeout is usable.
    pub fn validate(&self) -> RfSpyResult<()> {
        validate_timeout(self.default_write_timeout)?;
        validate_timeout(self.handshake_timeout)?;
        Ok(())
    }
}

/// Reject a missing or zero timeout.
///
/// Blocking operations never fall back to an unbounded wait, so a missing
/// timeout is an error rather than "forever".
pub fn validate_timeout(timeout: impl Into<Option<Duration>>) -> RfSpyResult<Duration> {
    match timeout.into() {
        Some(timeout) if !timeout.is_zero() => Ok(timeout),
        _ => Err(RfSpyError::InvalidTimeout),
    }
}

/// Convert a timeout in (fractional) seconds, rejecting zero, negative and
/// non-finite values.
pub fn timeout_from_secs_f64(secs: f64) -> RfSpyResult<Duration> {
    let timeout = Duration::try_from_secs_f64(secs).map_err(|_| RfSpyError::InvalidTimeout)?;
    validate_timeout(timeout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_timeout() {
        assert_eq!(
            validate_timeout(Duration::from_millis(10)).unwrap(),
            Duration::from_millis(10)
        );
        assert!(matches!(
            validate_timeout(Duration::ZERO),
            Err(RfSpyError::InvalidTimeout)
        ));
        assert!(matches!(validate_timeout(None), Err(RfSpyError::InvalidTimeout)));
    }

    #[test]
    fn test_timeout_from_secs() {
        assert_eq!(timeout_from_secs_f64(0.5).unwrap(), Duration::from_millis(500));
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(timeout_from_secs_f64(bad), Err(RfSpyError::InvalidTimeout)),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.default_write_timeout, Duration::from_secs(1));
        assert_eq!(config.poll_interval, Duration::from_millis(5));
        assert!(config.validate().is_ok());

        let broken = config.with_handshake_timeout(Duration::ZERO);
        assert!(broken.validate().is_err());
    }
}
