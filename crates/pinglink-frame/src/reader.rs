use bytes::BytesMut;
use pinglink_transport::ByteStream;

use crate::codec::{Frame, FrameConfig};
use crate::error::{transport_to_frame_error, FrameError, Result};
use crate::sync::FrameSync;

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Reads verified frames from any [`ByteStream`].
///
/// Handles partial reads and marker resynchronization internally. Callers
/// get whole frames, or a per-frame error after which reading can continue.
pub struct FrameReader<S> {
    inner: S,
    sync: FrameSync,
    pending: BytesMut,
    config: FrameConfig,
}

impl<S: ByteStream> FrameReader<S> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: S) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: S, config: FrameConfig) -> Self {
        Self {
            inner,
            sync: FrameSync::new(config.resync, config.max_payload_size),
            pending: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Run the synchronizer until the stream produces an outcome or goes quiet.
    ///
    /// - `Ok(Some(frame))`: a checksum-verified frame.
    /// - `Ok(None)`: the stream timed out with no frame in progress.
    /// - `Err(e)` with `!e.is_fatal()`: one frame was dropped (bad checksum,
    ///   oversized length, or a timeout mid-frame); call again to continue.
    /// - `Err(e)` with `e.is_fatal()`: the stream is gone.
    pub fn poll_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some(outcome) = self.sync.advance(&mut self.pending) {
                return outcome.map(Some);
            }

            let chunk = self
                .inner
                .read_bytes(self.config.read_chunk_size)
                .map_err(transport_to_frame_error)?;

            if chunk.is_empty() {
                if self.sync.in_frame() {
                    let state = self.sync.state();
                    self.sync.reset();
                    return Err(FrameError::IoTimeout { state });
                }
                return Ok(None);
            }

            self.pending.extend_from_slice(&chunk);
        }
    }

    /// Read the next complete frame, waiting through idle timeouts.
    ///
    /// Per-frame errors are returned to the caller like fatal ones; use
    /// [`FrameError::is_fatal`] to tell them apart.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = self.poll_frame()? {
                return Ok(frame);
            }
        }
    }

    /// Bytes discarded so far while hunting for the marker.
    pub fn discarded_bytes(&self) -> u64 {
        self.sync.discarded_bytes()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
