//! Session trace logging.
//!
//! A [`FramedSession`](crate::FramedSession) reports what it does on the
//! wire through a [`SessionTracer`] handed to it at construction, rather
//! than through a global logger. [`LogTracer`] forwards to the `log` facade;
//! [`RecordingTracer`] keeps events in memory so tests can assert on them.
//!
//! ```rust,ignore
//! use rfspy_protocol::{FramedSession, MockStream, RecordingTracer, SessionConfig, TraceCategory};
//!
//! let mut session = FramedSession::with_tracer(stream, SessionConfig::default(), RecordingTracer::new());
//! session.get_response(timeout)?;
//! assert_eq!(session.tracer().count(TraceCategory::FrameDiscarded), 1);
//! ```

use std::fmt;
use std::time::Duration;

use log::Level;

// ============================================================================
// Trace Event Types
// ============================================================================

/// Categories of trace events for filtering and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceCategory {
    /// Command bytes written to the stream.
    CommandSent,
    /// Waiting for a response started.
    ResponseWait,
    /// Bytes read from the stream into the receive buffer.
    BytesReceived,
    /// A frame was handed to the caller.
    FrameReady,
    /// An interrupted-command frame was dropped.
    FrameDiscarded,
    /// No frame arrived in time.
    TimedOut,
    /// Handshake progress.
    Handshake,
    /// Receive buffer discarded on request.
    BufferReset,
}

impl fmt::Display for TraceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceCategory::CommandSent => write!(f, "CMD_TX"),
            TraceCategory::ResponseWait => write!(f, "WAIT"),
            TraceCategory::BytesReceived => write!(f, "RX"),
            TraceCategory::FrameReady => write!(f, "FRAME"),
            TraceCategory::FrameDiscarded => write!(f, "DISCARD"),
            TraceCategory::TimedOut => write!(f, "TIMEOUT"),
            TraceCategory::Handshake => write!(f, "SYNC"),
            TraceCategory::BufferReset => write!(f, "RESET"),
        }
    }
}

/// A trace event record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    /// Severity, matching `log` levels.
    pub level: Level,
    /// Category of the trace event.
    pub category: TraceCategory,
    /// Human-readable description of the event.
    pub description: String,
    /// Optional additional details as key-value pairs.
    pub details: Vec<(String, String)>,
}

impl TraceEvent {
    /// Create an event with no details.
    pub fn new(level: Level, category: TraceCategory, description: impl Into<String>) -> Self {
        TraceEvent {
            level,
            category,
            description: description.into(),
            details: Vec::new(),
        }
    }

    /// A command opcode (and optional parameters) was written.
    pub fn command_sent(opcode: u8, params: &[u8]) -> Self {
        let event = TraceEvent::new(
            Level::Debug,
            TraceCategory::CommandSent,
            format!("command {}", opcode),
        );
        if params.is_empty() {
            event
        } else {
            event.with_detail("params", hex::encode(params))
        }
    }

    /// `get_response` started waiting.
    pub fn response_wait(timeout: Duration) -> Self {
        TraceEvent::new(
            Level::Debug,
            TraceCategory::ResponseWait,
            format!("get_response: timeout = {:?}", timeout),
        )
    }

    /// Bytes were appended to the receive buffer.
    pub fn bytes_received(chunk_len: usize, buffered: &[u8]) -> Self {
        TraceEvent::new(Level::Trace, TraceCategory::BytesReceived, "read from stream")
            .with_detail("chunk_len", chunk_len.to_string())
            .with_detail("buf", hex::encode(buffered))
    }

    /// A frame is being returned.
    pub fn frame_ready(payload: &[u8]) -> Self {
        TraceEvent::new(Level::Debug, TraceCategory::FrameReady, "response")
            .with_detail("len", payload.len().to_string())
            .with_detail("payload", hex::encode(payload))
    }

    /// An interrupted-command frame was dropped.
    pub fn frame_discarded(payload: &[u8]) -> Self {
        TraceEvent::new(
            Level::Debug,
            TraceCategory::FrameDiscarded,
            "response = command interrupted, getting the next response",
        )
        .with_detail("payload", hex::encode(payload))
    }

    /// The wait ran out.
    pub fn timed_out(elapsed: Duration, buffered: usize) -> Self {
        TraceEvent::new(
            Level::Debug,
            TraceCategory::TimedOut,
            "gave up waiting for response from subg_rfspy",
        )
        .with_detail("elapsed_ms", elapsed.as_millis().to_string())
        .with_detail("buffered", buffered.to_string())
    }

    /// Handshake progress at the given level.
    pub fn handshake(level: Level, description: impl Into<String>) -> Self {
        TraceEvent::new(level, TraceCategory::Handshake, description)
    }

    /// Buffered bytes were thrown away.
    pub fn buffer_reset(discarded: usize) -> Self {
        TraceEvent::new(Level::Debug, TraceCategory::BufferReset, "receive buffer cleared")
            .with_detail("discarded", discarded.to_string())
    }

    /// Add a detail to this event.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push((key.into(), value.into()));
        self
    }

    /// Look up a detail by key.
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.description)?;
        for (key, value) in &self.details {
            write!(f, " {}={}", key, value)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tracers
// ============================================================================

/// Receives trace events from a session.
pub trait SessionTracer {
    /// Whether events at `level` would be kept. The session skips building
    /// events that would be thrown away.
    fn enabled(&self, level: Level) -> bool {
        let _ = level;
        true
    }

    /// Record an event.
    fn trace(&mut self, event: TraceEvent);
}

/// Build and record an event only if the tracer wants its level.
pub(crate) fn emit<T: SessionTracer + ?Sized>(
    tracer: &mut T,
    level: Level,
    make: impl FnOnce() -> TraceEvent,
) {
    if tracer.enabled(level) {
        tracer.trace(make());
    }
}

/// Forwards events to the `log` facade under a fixed target.
#[derive(Debug, Clone)]
pub struct LogTracer {
    target: String,
}

impl LogTracer {
    /// Log under a custom target.
    pub fn with_target(target: impl Into<String>) -> Self {
        LogTracer {
            target: target.into(),
        }
    }
}

impl Default for LogTracer {
    fn default() -> Self {
        LogTracer::with_target(module_path!())
    }
}

impl SessionTracer for LogTracer {
    fn enabled(&self, level: Level) -> bool {
        log::log_enabled!(target: &self.target, level)
    }

    fn trace(&mut self, event: TraceEvent) {
        log::log!(target: &self.target, event.level, "{}", event);
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default, Clone)]
pub struct RecordingTracer {
    events: Vec<TraceEvent>,
}

impl RecordingTracer {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded events, oldest first.
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Events in one category.
    pub fn in_category(&self, category: TraceCategory) -> impl Iterator<Item = &TraceEvent> {
        self.events.iter().filter(move |e| e.category == category)
    }

    /// Number of events in one category.
    pub fn count(&self, category: TraceCategory) -> usize {
        self.in_category(category).count()
    }

    /// Forget recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl SessionTracer for RecordingTracer {
    fn trace(&mut self, event: TraceEvent) {
        self.events.push(event);
    }
}
