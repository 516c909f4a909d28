use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;

/// A duplex byte stream carrying ping protocol traffic.
///
/// Implementations must never block indefinitely in [`read_bytes`]: a read
/// that sees no data within the transport's own timeout returns an empty
/// buffer. A closed stream reports [`TransportError::Closed`].
///
/// [`read_bytes`]: ByteStream::read_bytes
/// [`TransportError::Closed`]: crate::TransportError::Closed
pub trait ByteStream: Send + 'static {
    /// Read up to `max_bytes`. Returns fewer bytes than requested when less
    /// is available, and an empty buffer on timeout.
    fn read_bytes(&mut self, max_bytes: usize) -> Result<Bytes>;

    /// Write the whole buffer (blocking).
    fn write_bytes(&mut self, data: &[u8]) -> Result<()>;

    /// Close the stream. A read blocked on another handle of the same stream
    /// returns once the stream is closed.
    fn close(&mut self) -> Result<()>;

    /// Open a second handle onto the same stream, so reading and writing can
    /// happen on different threads.
    fn try_clone(&self) -> Result<Self>
    where
        Self: Sized;

    /// Bound how long a read waits before returning empty. Streams without
    /// a configurable timeout keep their own behavior.
    fn set_read_timeout(&self, _timeout: Option<Duration>) -> Result<()> {
        Ok(())
    }
}
