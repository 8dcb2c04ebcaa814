//! Synchronous request/response session.

use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use log::Level;

use crate::commands::Command;
use crate::config::{validate_timeout, SessionConfig};
use crate::constants::{CMD_GET_STATE, CMD_GET_VERSION, MIN_VERSION_LEN, STATE_OK};
use crate::error::{RfSpyError, RfSpyResult};
use crate::frame::{Decoded, ResponseFramer};
use crate::responses::{DeviceIdentity, Response};
use crate::stream::{ByteStream, WriteTimeoutGuard};
use crate::tracer::{emit, LogTracer, SessionTracer, TraceEvent};

/// A framed command/response session over a [`ByteStream`].
///
/// The session owns the stream and a receive buffer that persists across
/// calls: bytes that arrive after a response (or after a wait gives up)
/// are kept for the next [`FramedSession::get_response`].
///
/// Every blocking call takes an explicit timeout. `None` or zero is
/// rejected with [`RfSpyError::InvalidTimeout`] before any I/O happens.
pub struct FramedSession<S: ByteStream, T: SessionTracer = LogTracer> {
    stream: S,
    framer: ResponseFramer,
    config: SessionConfig,
    tracer: T,
}

impl<S: ByteStream> FramedSession<S, LogTracer> {
    /// Create a session with the default configuration, logging through
    /// the `log` facade.
    pub fn new(stream: S) -> Self {
        Self::with_config(stream, SessionConfig::default())
    }

    /// Create a session with a custom configuration.
    pub fn with_config(stream: S, config: SessionConfig) -> Self {
        Self::with_tracer(stream, config, LogTracer::default())
    }
}

impl<S: ByteStream, T: SessionTracer> FramedSession<S, T> {
    /// Create a session that reports to `tracer`.
    pub fn with_tracer(stream: S, config: SessionConfig, tracer: T) -> Self {
        FramedSession {
            stream,
            framer: ResponseFramer::new(),
            config,
            tracer,
        }
    }

    /// Write a command: the opcode byte, then the parameters if any.
    ///
    /// The stream's write timeout is set to `timeout` for these writes and
    /// put back to [`SessionConfig::default_write_timeout`] afterwards,
    /// whether or not the writes succeed.
    pub fn send_command(
        &mut self,
        opcode: u8,
        params: &[u8],
        timeout: impl Into<Option<Duration>>,
    ) -> RfSpyResult<()> {
        let timeout = validate_timeout(timeout)?;

        let mut stream = WriteTimeoutGuard::set(
            &mut self.stream,
            timeout,
            self.config.default_write_timeout,
        )?;
        emit(&mut self.tracer, Level::Debug, || {
            TraceEvent::command_sent(opcode, params)
        });
        stream.write(&[opcode])?;
        if !params.is_empty() {
            stream.write(params)?;
        }
        stream.restore()?;
        Ok(())
    }

    /// Wait up to `timeout` for the next response frame.
    ///
    /// Interrupted-command frames are dropped without restarting the
    /// clock. Returns [`Response::Empty`] for a bare delimiter and
    /// [`Response::TimedOut`] if no frame completes in time; in the latter
    /// case any partial frame stays buffered.
    pub fn get_response(&mut self, timeout: impl Into<Option<Duration>>) -> RfSpyResult<Response> {
        let timeout = validate_timeout(timeout)?;
        emit(&mut self.tracer, Level::Debug, || TraceEvent::response_wait(timeout));

        let start = Instant::now();
        loop {
            let available = self.stream.bytes_available()?;
            if available > 0 {
                let chunk = self.stream.read(available)?;
                self.framer.push(&chunk);
                let framer = &self.framer;
                emit(&mut self.tracer, Level::Trace, || {
                    TraceEvent::bytes_received(chunk.len(), framer.buffered())
                });
            }

            while let Some(decoded) = self.framer.decode() {
                match decoded {
                    Decoded::Ready(payload) => {
                        emit(&mut self.tracer, Level::Debug, || {
                            TraceEvent::frame_ready(&payload)
                        });
                        return Ok(Response::from_payload(payload));
                    }
                    Decoded::Discarded(payload) => {
                        emit(&mut self.tracer, Level::Debug, || {
                            TraceEvent::frame_discarded(&payload)
                        });
                    }
                }
            }

            let elapsed = start.elapsed();
            if elapsed > timeout {
                let buffered = self.framer.buffered_len();
                emit(&mut self.tracer, Level::Debug, || {
                    TraceEvent::timed_out(elapsed, buffered)
                });
                return Ok(Response::TimedOut);
            }
            thread::sleep(self.config.poll_interval);
        }
    }

    /// Send a command and wait for its response, using `timeout` for both
    /// the write and the wait.
    pub fn do_command(
        &mut self,
        opcode: u8,
        params: &[u8],
        timeout: impl Into<Option<Duration>>,
    ) -> RfSpyResult<Response> {
        let timeout = timeout.into();
        self.send_command(opcode, params, timeout)?;
        self.get_response(timeout)
    }

    /// [`FramedSession::do_command`] for a [`Command`].
    pub fn execute(
        &mut self,
        command: &Command,
        timeout: impl Into<Option<Duration>>,
    ) -> RfSpyResult<Response> {
        self.do_command(command.opcode, &command.params, timeout)
    }

    /// Identify the firmware by asking for its state and version.
    ///
    /// Fails with [`RfSpyError::HandshakeFailure`] if either answer is
    /// missing or empty. An unexpected status or a very short version is
    /// only reported through the tracer.
    pub fn sync(&mut self) -> RfSpyResult<DeviceIdentity> {
        let write_timeout = self.config.default_write_timeout;
        let response_timeout = self.config.handshake_timeout;

        self.send_command(CMD_GET_STATE, &[], write_timeout)?;
        let status = self.get_response(response_timeout)?.into_bytes();
        self.report_status(&status);

        self.send_command(CMD_GET_VERSION, &[], write_timeout)?;
        let version = self.get_response(response_timeout)?.into_bytes();
        self.report_version(&version);

        if status.is_empty() || version.is_empty() {
            return Err(RfSpyError::HandshakeFailure {
                status: status.to_vec(),
                version: version.to_vec(),
            });
        }
        Ok(DeviceIdentity { status, version })
    }

    fn report_status(&mut self, status: &Bytes) {
        if status == STATE_OK {
            emit(&mut self.tracer, Level::Info, || {
                TraceEvent::handshake(Level::Info, "subg_rfspy status: OK")
            });
        } else if !status.is_empty() {
            emit(&mut self.tracer, Level::Warn, || {
                TraceEvent::handshake(Level::Warn, "unexpected subg_rfspy status")
                    .with_detail("status", hex::encode(status))
            });
        }
    }

    fn report_version(&mut self, version: &Bytes) {
        if version.len() >= MIN_VERSION_LEN {
            emit(&mut self.tracer, Level::Info, || {
                TraceEvent::handshake(
                    Level::Info,
                    format!("Version: {}", String::from_utf8_lossy(version)),
                )
            });
        } else if !version.is_empty() {
            emit(&mut self.tracer, Level::Warn, || {
                TraceEvent::handshake(Level::Warn, "implausibly short subg_rfspy version")
                    .with_detail("version", hex::encode(version))
            });
        }
    }

    /// Throw away everything in the receive buffer. Returns the number of
    /// bytes discarded.
    pub fn reset(&mut self) -> usize {
        let discarded = self.framer.buffered_len();
        self.framer.clear();
        emit(&mut self.tracer, Level::Debug, || TraceEvent::buffer_reset(discarded));
        discarded
    }

    /// Number of received bytes not yet consumed.
    pub fn buffered_len(&self) -> usize {
        self.framer.buffered_len()
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The underlying stream.
    pub fn stream(&self) -> &S {
        &self.stream
    }

    /// The underlying stream, mutably.
    ///
    /// Writing to or reading from it directly bypasses the receive buffer.
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// The tracer.
    pub fn tracer(&self) -> &T {
        &self.tracer
    }

    /// The tracer, mutably.
    pub fn tracer_mut(&mut self) -> &mut T {
        &mut self.tracer
    }

    /// Give back the stream, dropping any buffered bytes.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::MockStream;
    use crate::tracer::{RecordingTracer, TraceCategory};

    fn fast_config() -> SessionConfig {
        SessionConfig::default()
            .with_poll_interval(Duration::from_millis(1))
            .with_handshake_timeout(Duration::from_millis(50))
    }

    fn session(chunks: Vec<Vec<u8>>) -> FramedSession<MockStream, RecordingTracer> {
        FramedSession::with_tracer(
            MockStream::with_chunks(chunks),
            fast_config(),
            RecordingTracer::new(),
        )
    }

    #[test]
    fn test_send_command_writes_opcode_then_params() {
        let mut session = session(vec![]);
        session
            .send_command(5, &[0x01, 0x02, 0x03], Duration::from_millis(500))
            .unwrap();

        assert_eq!(session.stream().writes(), &[vec![5], vec![1, 2, 3]]);
        assert_eq!(
            session.stream().write_timeouts(),
            &[Duration::from_millis(500), Duration::from_secs(1)]
        );
    }

    #[test]
    fn test_send_command_without_params_is_one_write() {
        let mut session = session(vec![]);
        session
            .send_command(CMD_GET_STATE, &[], Duration::from_secs(1))
            .unwrap();
        assert_eq!(session.stream().writes(), &[vec![CMD_GET_STATE]]);
    }

    #[test]
    fn test_send_command_restores_timeout_on_failure() {
        let mut session = session(vec![]);
        session
            .stream_mut()
            .fail_next_write(std::io::ErrorKind::TimedOut);

        let err = session
            .send_command(3, &[0x00], Duration::from_secs(3))
            .unwrap_err();
        assert!(matches!(err, RfSpyError::Io(_)));
        assert_eq!(session.stream().write_timeout(), Some(Duration::from_secs(1)));
        assert!(session.stream().written().is_empty());
    }

    #[test]
    fn test_invalid_timeout_performs_no_io() {
        let mut session = session(vec![b"OK\x00".to_vec()]);

        assert!(matches!(
            session.send_command(1, &[], Duration::ZERO),
            Err(RfSpyError::InvalidTimeout)
        ));
        assert!(matches!(
            session.get_response(None),
            Err(RfSpyError::InvalidTimeout)
        ));
        assert!(matches!(
            session.do_command(1, &[], None),
            Err(RfSpyError::InvalidTimeout)
        ));
        assert_eq!(session.stream().io_calls(), 0);
        assert!(session.tracer().events().is_empty());
    }

    #[test]
    fn test_get_response_discards_interrupted_frames() {
        let mut session = session(vec![vec![0xBB, 0x00, 0xBB, 0x10, 0x00, b'O', b'K', 0x00]]);

        let response = session.get_response(Duration::from_millis(50)).unwrap();
        assert_eq!(response, Response::Frame(Bytes::from_static(b"OK")));
        assert_eq!(session.tracer().count(TraceCategory::FrameDiscarded), 2);
        assert_eq!(session.tracer().count(TraceCategory::FrameReady), 1);
    }

    #[test]
    fn test_get_response_explicit_empty_frame() {
        let mut session = session(vec![vec![0x00]]);
        let response = session.get_response(Duration::from_millis(50)).unwrap();
        assert_eq!(response, Response::Empty);
    }

    #[test]
    fn test_get_response_times_out_and_keeps_partial_frame() {
        let mut session = session(vec![b"par".to_vec()]);

        let timeout = Duration::from_millis(20);
        let start = Instant::now();
        let response = session.get_response(timeout).unwrap();
        assert!(start.elapsed() >= timeout);
        assert_eq!(response, Response::TimedOut);
        assert_eq!(session.buffered_len(), 3);
        assert_eq!(session.tracer().count(TraceCategory::TimedOut), 1);

        session.stream_mut().push_chunk(b"tial\x00".to_vec());
        let response = session.get_response(timeout).unwrap();
        assert_eq!(response.payload(), b"partial");
    }

    #[test]
    fn test_get_response_propagates_read_error() {
        let mut session = session(vec![b"OK\x00".to_vec()]);
        session
            .stream_mut()
            .fail_next_read(std::io::ErrorKind::BrokenPipe);
        let err = session.get_response(Duration::from_millis(50)).unwrap_err();
        assert!(matches!(err, RfSpyError::Io(e) if e.kind() == std::io::ErrorKind::BrokenPipe));
    }

    #[test]
    fn test_do_command() {
        let mut session = session(vec![vec![0xAA, 0x00]]);
        let response = session
            .do_command(3, &[0x00, 0x00, 0x00, 0x64], Duration::from_millis(50))
            .unwrap();
        assert_eq!(session.stream().written(), &[3, 0x00, 0x00, 0x00, 0x64]);
        assert_eq!(response.device_status(), Some(crate::DeviceStatus::Timeout));
    }

    #[test]
    fn test_execute_command() {
        let mut session = session(vec![b"OK\x00".to_vec()]);
        let response = session
            .execute(&Command::get_state(), Duration::from_millis(50))
            .unwrap();
        assert_eq!(response.payload(), b"OK");
        assert_eq!(session.stream().written(), Command::get_state().encode());
    }

    #[test]
    fn test_sync_reports_identity() {
        let mut session = session(vec![b"OK\x00".to_vec(), Vec::new(), b"v2.3\x00".to_vec()]);
        let identity = session.sync().unwrap();
        assert!(identity.is_ok());
        assert_eq!(identity.version_str(), "v2.3");
        assert_eq!(session.stream().written(), &[CMD_GET_STATE, CMD_GET_VERSION]);

        let infos: Vec<_> = session
            .tracer()
            .in_category(TraceCategory::Handshake)
            .map(|e| e.level)
            .collect();
        assert_eq!(infos, vec![Level::Info, Level::Info]);
    }

    #[test]
    fn test_sync_fails_without_version() {
        let mut session = session(vec![b"\x00".to_vec()]);
        let err = session.sync().unwrap_err();
        assert!(matches!(
            err,
            RfSpyError::HandshakeFailure { ref status, ref version }
                if status.is_empty() && version.is_empty()
        ));
    }

    #[test]
    fn test_sync_tolerates_odd_status() {
        let mut session = session(vec![b"BUSY\x00".to_vec(), b"v1\x00".to_vec()]);
        let identity = session.sync().unwrap();
        assert!(!identity.is_ok());
        assert!(!identity.has_version());

        let warnings = session
            .tracer()
            .events()
            .iter()
            .filter(|e| e.level == Level::Warn)
            .count();
        assert_eq!(warnings, 2);
    }

    #[test]
    fn test_reset_discards_buffer() {
        let mut session = session(vec![b"stale".to_vec()]);
        let response = session.get_response(Duration::from_millis(5)).unwrap();
        assert!(response.is_timed_out());
        assert_eq!(session.reset(), 5);
        assert_eq!(session.buffered_len(), 0);
        assert_eq!(session.tracer().count(TraceCategory::BufferReset), 1);
    }
}
