//! Ping protocol framing over an unreliable byte stream.
//!
//! Every frame on the wire is:
//! - A 2-byte marker ("BR") for stream synchronization
//! - A 2-byte little-endian payload length
//! - A 2-byte little-endian message id
//! - Source and destination device ids (1 byte each)
//! - The payload, then a 2-byte little-endian checksum
//!
//! [`FrameSync`] recovers frames from arbitrary bytes, [`FrameReader`] drives
//! it from a [`ByteStream`](pinglink_transport::ByteStream), and
//! [`FrameWriter`] sends packets back out.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod error;
pub mod ids;
pub mod reader;
pub mod sync;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::PingCodec;
pub use codec::{
    checksum, encode_frame, encode_frame_routed, Frame, FrameConfig, Preamble, CHECKSUM_SIZE,
    MARKER, MAX_PAYLOAD, PREAMBLE_SIZE,
};
pub use error::{FrameError, Result};
pub use ids::message_name;
pub use reader::FrameReader;
pub use sync::{FrameSync, ResyncPolicy, SyncState};
pub use writer::FrameWriter;
