//! Byte stream abstraction.
//!
//! The session only needs four things from the link to the firmware: set a
//! write timeout, write bytes, ask how many bytes are waiting, and read
//! them. [`ByteStream`] captures exactly that so the session runs the same
//! over a real serial port ([`SerialPortStream`]) or a scripted stream in
//! tests ([`MockStream`]).

use std::collections::VecDeque;
use std::io;
use std::ops::{Deref, DerefMut};
use std::time::Duration;

/// A byte-oriented, non-framed link to the firmware.
pub trait ByteStream {
    /// Set the timeout for subsequent writes.
    fn set_write_timeout(&mut self, timeout: Duration) -> io::Result<()>;

    /// Write all of `bytes`.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Number of bytes that can be read without blocking.
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Read exactly `count` bytes. Callers only ask for bytes reported by
    /// [`ByteStream::bytes_available`].
    fn read(&mut self, count: usize) -> io::Result<Vec<u8>>;
}

impl<S: ByteStream + ?Sized> ByteStream for Box<S> {
    fn set_write_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        (**self).set_write_timeout(timeout)
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write(bytes)
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        (**self).bytes_available()
    }

    fn read(&mut self, count: usize) -> io::Result<Vec<u8>> {
        (**self).read(count)
    }
}

// ============================================================================
// Write Timeout Guard
// ============================================================================

/// Temporarily overrides a stream's write timeout.
///
/// The stream is reachable through the guard. [`WriteTimeoutGuard::restore`]
/// puts the previous timeout back and reports failures; if the guard is
/// dropped without it (a write failed and `?` returned early) the timeout is
/// restored in `Drop` and a failure there is only logged.
pub struct WriteTimeoutGuard<'a, S: ByteStream + ?Sized> {
    stream: &'a mut S,
    restore_to: Duration,
    restored: bool,
}

impl<'a, S: ByteStream + ?Sized> WriteTimeoutGuard<'a, S> {
    /// Apply `timeout` now; `restore_to` is applied when the guard ends.
    pub fn set(stream: &'a mut S, timeout: Duration, restore_to: Duration) -> io::Result<Self> {
        stream.set_write_timeout(timeout)?;
        Ok(WriteTimeoutGuard {
            stream,
            restore_to,
            restored: false,
        })
    }

    /// Restore the write timeout, reporting any error.
    pub fn restore(mut self) -> io::Result<()> {
        self.restored = true;
        self.stream.set_write_timeout(self.restore_to)
    }
}

impl<S: ByteStream + ?Sized> Deref for WriteTimeoutGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        &*self.stream
    }
}

impl<S: ByteStream + ?Sized> DerefMut for WriteTimeoutGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut *self.stream
    }
}

impl<S: ByteStream + ?Sized> Drop for WriteTimeoutGuard<'_, S> {
    fn drop(&mut self) {
        if self.restored {
            return;
        }
        if let Err(e) = self.stream.set_write_timeout(self.restore_to) {
            log::warn!(
                "failed to restore write timeout to {:?}: {}",
                self.restore_to,
                e
            );
        }
    }
}

// ============================================================================
// Scripted Stream
// ============================================================================

/// An in-memory [`ByteStream`] fed from a script of chunks.
///
/// Each call to `bytes_available` with nothing pending releases the next
/// scripted chunk, so one chunk arrives per poll. An empty chunk is a poll
/// where nothing arrived. Everything written is recorded.
#[derive(Debug, Default)]
pub struct MockStream {
    /// Chunks not yet released.
    script: VecDeque<Vec<u8>>,
    /// Released bytes not yet read.
    pending: VecDeque<u8>,
    /// Every byte written, in order.
    written: Vec<u8>,
    /// Each individual write call.
    writes: Vec<Vec<u8>>,
    /// Every write timeout set, in order.
    write_timeouts: Vec<Duration>,
    /// Current write timeout.
    write_timeout: Option<Duration>,
    /// Error kind to return from the next write.
    fail_next_write: Option<io::ErrorKind>,
    /// Error kind to return from the next read.
    fail_next_read: Option<io::ErrorKind>,
    /// Number of trait calls made.
    io_calls: usize,
}

impl MockStream {
    /// Create a stream with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stream that releases `chunks` one per poll.
    pub fn with_chunks<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Vec<u8>>,
    {
        let mut stream = Self::new();
        for chunk in chunks {
            stream.push_chunk(chunk);
        }
        stream
    }

    /// Script another chunk.
    pub fn push_chunk(&mut self, chunk: impl Into<Vec<u8>>) {
        self.script.push_back(chunk.into());
    }

    /// Make the next write fail with `kind`.
    pub fn fail_next_write(&mut self, kind: io::ErrorKind) {
        self.fail_next_write = Some(kind);
    }

    /// Make the next read fail with `kind`.
    pub fn fail_next_read(&mut self, kind: io::ErrorKind) {
        self.fail_next_read = Some(kind);
    }

    /// All bytes written so far.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Individual write calls so far.
    pub fn writes(&self) -> &[Vec<u8>] {
        &self.writes
    }

    /// Write timeouts set so far.
    pub fn write_timeouts(&self) -> &[Duration] {
        &self.write_timeouts
    }

    /// The current write timeout.
    pub fn write_timeout(&self) -> Option<Duration> {
        self.write_timeout
    }

    /// Number of [`ByteStream`] calls made.
    pub fn io_calls(&self) -> usize {
        self.io_calls
    }

    /// Chunks not yet released.
    pub fn remaining_chunks(&self) -> usize {
        self.script.len()
    }
}

impl ByteStream for MockStream {
    fn set_write_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.io_calls += 1;
        self.write_timeout = Some(timeout);
        self.write_timeouts.push(timeout);
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.io_calls += 1;
        if let Some(kind) = self.fail_next_write.take() {
            return Err(io::Error::new(kind, "scripted write failure"));
        }
        self.written.extend_from_slice(bytes);
        self.writes.push(bytes.to_vec());
        Ok(())
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        self.io_calls += 1;
        if self.pending.is_empty() {
            if let Some(chunk) = self.script.pop_front() {
                self.pending.extend(chunk);
            }
        }
        Ok(self.pending.len())
    }

    fn read(&mut self, count: usize) -> io::Result<Vec<u8>> {
        self.io_calls += 1;
        if let Some(kind) = self.fail_next_read.take() {
            return Err(io::Error::new(kind, "scripted read failure"));
        }
        if count > self.pending.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("asked for {} bytes, {} pending", count, self.pending.len()),
            ));
        }
        Ok(self.pending.drain(..count).collect())
    }
}

// ============================================================================
// Serial Port
// ============================================================================

/// A [`ByteStream`] over a real serial port.
#[cfg(feature = "serialport")]
pub struct SerialPortStream {
    port: Box<dyn serialport::SerialPort>,
}

#[cfg(feature = "serialport")]
impl SerialPortStream {
    /// Open `path` at `baud_rate`, starting with `write_timeout`.
    pub fn open(path: &str, baud_rate: u32, write_timeout: Duration) -> io::Result<Self> {
        let port = serialport::new(path, baud_rate)
            .timeout(write_timeout)
            .open()?;
        log::debug!("opened serial port {} at {} baud", path, baud_rate);
        Ok(SerialPortStream { port })
    }

    /// Wrap an already opened port.
    pub fn from_port(port: Box<dyn serialport::SerialPort>) -> Self {
        SerialPortStream { port }
    }

    /// Port name, if the platform reports one.
    pub fn name(&self) -> Option<String> {
        self.port.name()
    }
}

#[cfg(feature = "serialport")]
impl ByteStream for SerialPortStream {
    // serialport has a single timeout covering reads and writes. Reads here
    // only ever ask for bytes already waiting, so it effectively governs
    // writes.
    fn set_write_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.port.set_timeout(timeout)?;
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        io::Write::write_all(&mut self.port, bytes)?;
        io::Write::flush(&mut self.port)
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn read(&mut self, count: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0u8; count];
        io::Read::read_exact(&mut self.port, &mut buf)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_releases_one_chunk_per_poll() {
        let mut stream = MockStream::with_chunks([b"ab".to_vec(), Vec::new(), b"c".to_vec()]);

        assert_eq!(stream.bytes_available().unwrap(), 2);
        assert_eq!(stream.read(2).unwrap(), b"ab");
        assert_eq!(stream.bytes_available().unwrap(), 0);
        assert_eq!(stream.bytes_available().unwrap(), 1);
        assert_eq!(stream.read(1).unwrap(), b"c");
        assert_eq!(stream.bytes_available().unwrap(), 0);
        assert_eq!(stream.remaining_chunks(), 0);
    }

    #[test]
    fn test_mock_records_writes() {
        let mut stream = MockStream::new();
        stream.write(&[1]).unwrap();
        stream.write(&[2, 3]).unwrap();
        assert_eq!(stream.written(), &[1, 2, 3]);
        assert_eq!(stream.writes(), &[vec![1], vec![2, 3]]);
    }

    #[test]
    fn test_guard_restores_on_restore() {
        let mut stream = MockStream::new();
        let guard =
            WriteTimeoutGuard::set(&mut stream, Duration::from_secs(5), Duration::from_secs(1))
                .unwrap();
        guard.restore().unwrap();
        assert_eq!(
            stream.write_timeouts(),
            &[Duration::from_secs(5), Duration::from_secs(1)]
        );
    }

    #[test]
    fn test_guard_restores_on_drop() {
        let mut stream = MockStream::new();
        stream.fail_next_write(io::ErrorKind::TimedOut);

        let result = (|| -> io::Result<()> {
            let mut guard = WriteTimeoutGuard::set(
                &mut stream,
                Duration::from_secs(5),
                Duration::from_secs(1),
            )?;
            guard.write(&[0x01])?;
            guard.restore()
        })();

        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::TimedOut);
        assert_eq!(stream.write_timeout(), Some(Duration::from_secs(1)));
        assert_eq!(stream.write_timeouts().len(), 2);
    }
}
