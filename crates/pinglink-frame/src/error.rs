use crate::sync::SyncState;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The preamble does not start with the "BR" marker.
    #[error("invalid frame marker (expected 0x42 0x52 \"BR\")")]
    InvalidMarker,

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The received checksum does not match the one computed over
    /// preamble and payload.
    #[error("checksum mismatch on message {message_id} (computed {expected:#06x}, received {received:#06x})")]
    ChecksumMismatch {
        message_id: u16,
        expected: u16,
        received: u16,
    },

    /// The stream went quiet in the middle of a frame.
    #[error("stream timed out while {state}")]
    IoTimeout { state: SyncState },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed.
    #[error("connection closed")]
    ConnectionClosed,
}

impl FrameError {
    /// Whether the stream is unusable after this error.
    ///
    /// Everything else only costs the frame in flight; the synchronizer is
    /// already back to seeking the next marker.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FrameError::Io(_) | FrameError::ConnectionClosed)
    }
}

pub(crate) fn transport_to_frame_error(err: pinglink_transport::TransportError) -> FrameError {
    match err {
        pinglink_transport::TransportError::Closed => FrameError::ConnectionClosed,
        pinglink_transport::TransportError::Io(io) => FrameError::Io(io),
        pinglink_transport::TransportError::ConnectTcp { source, .. }
        | pinglink_transport::TransportError::ConnectUnix { source, .. } => FrameError::Io(source),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
