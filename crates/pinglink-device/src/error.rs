use pinglink_schema::{DecodeError, EncodeError};

/// Errors that can occur while running a device link.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] pinglink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] pinglink_frame::FrameError),

    /// Message definitions failed to load or compile.
    #[error("schema error: {0}")]
    Schema(#[from] pinglink_schema::SchemaError),

    /// A command could not be built.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// The receive worker thread could not be started.
    #[error("failed to spawn link worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// The receive worker thread panicked.
    #[error("link worker panicked")]
    WorkerPanicked,

    /// The link has been stopped.
    #[error("link stopped")]
    Stopped,
}

/// Errors raised while building a command packet.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// No layout is registered for the message id.
    #[error("unknown message id {0}")]
    UnknownMessageId(u16),

    /// Field values do not fit the layout.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The encoded payload cannot be framed.
    #[error("cannot frame message: {0}")]
    Frame(#[from] pinglink_frame::FrameError),
}

/// Errors raised while dispatching a verified frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// No layout is registered for the frame's message id.
    #[error("unknown message id {0}")]
    UnknownMessageId(u16),

    /// The payload does not decode against its layout.
    #[error("message {message_id}: {source}")]
    Decode {
        message_id: u16,
        #[source]
        source: DecodeError,
    },

    /// A profile frame decoded but does not carry the expected fields.
    #[error("malformed profile report: {0}")]
    MalformedProfile(String),
}

impl DispatchError {
    /// Message id of the dropped frame, when known.
    pub fn message_id(&self) -> Option<u16> {
        match self {
            DispatchError::UnknownMessageId(id) => Some(*id),
            DispatchError::Decode { message_id, .. } => Some(*message_id),
            DispatchError::MalformedProfile(_) => Some(pinglink_frame::ids::PROFILE),
        }
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;
