use bytes::BytesMut;
use pinglink_transport::ByteStream;

use crate::codec::{encode_frame, Frame};
use crate::error::{transport_to_frame_error, Result};

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Writes complete packets to any [`ByteStream`].
pub struct FrameWriter<S> {
    inner: S,
    buf: BytesMut,
}

impl<S: ByteStream> FrameWriter<S> {
    /// Create a new frame writer.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Write a complete frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.write_packet(&frame.to_bytes())
    }

    /// Frame a payload for a message id and send it.
    pub fn send(&mut self, message_id: u16, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_frame(message_id, payload, &mut self.buf)?;
        tracing::trace!(message_id, bytes = self.buf.len(), "sending frame");
        self.inner
            .write_bytes(&self.buf)
            .map_err(transport_to_frame_error)
    }

    /// Send an already encoded packet as-is.
    pub fn write_packet(&mut self, packet: &[u8]) -> Result<()> {
        self.inner
            .write_bytes(packet)
            .map_err(transport_to_frame_error)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> S {
        self.inner
    }
}
