use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::sync::ResyncPolicy;

/// Marker bytes: "BR" (0x42 0x52).
pub const MARKER: [u8; 2] = *b"BR";

/// Preamble: marker (2) + length (2) + message id (2) + src (1) + dst (1) = 8 bytes.
pub const PREAMBLE_SIZE: usize = 8;

/// Trailing checksum: 2 bytes, little-endian.
pub const CHECKSUM_SIZE: usize = 2;

/// Largest payload the length field can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// Fixed frame header preceding every payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preamble {
    /// Payload length in bytes.
    pub payload_length: u16,
    /// Message id selecting the payload layout.
    pub message_id: u16,
    /// Sending device id.
    pub src_device_id: u8,
    /// Receiving device id.
    pub dst_device_id: u8,
}

impl Preamble {
    /// Preamble for a locally originated packet (both routing fields zero).
    pub fn new(message_id: u16, payload_length: u16) -> Self {
        Self {
            payload_length,
            message_id,
            src_device_id: 0,
            dst_device_id: 0,
        }
    }

    /// Parse a preamble from its 8 wire bytes.
    pub fn parse(bytes: &[u8; PREAMBLE_SIZE]) -> Result<Self> {
        if bytes[0..2] != MARKER {
            return Err(FrameError::InvalidMarker);
        }

        Ok(Self {
            payload_length: u16::from_le_bytes([bytes[2], bytes[3]]),
            message_id: u16::from_le_bytes([bytes[4], bytes[5]]),
            src_device_id: bytes[6],
            dst_device_id: bytes[7],
        })
    }

    /// Append the wire form of this preamble.
    pub fn write_to(&self, dst: &mut BytesMut) {
        dst.put_slice(&MARKER);
        dst.put_u16_le(self.payload_length);
        dst.put_u16_le(self.message_id);
        dst.put_u8(self.src_device_id);
        dst.put_u8(self.dst_device_id);
    }

    /// The 8 wire bytes of this preamble.
    pub fn to_bytes(&self) -> [u8; PREAMBLE_SIZE] {
        let length = self.payload_length.to_le_bytes();
        let id = self.message_id.to_le_bytes();
        [
            MARKER[0],
            MARKER[1],
            length[0],
            length[1],
            id[0],
            id[1],
            self.src_device_id,
            self.dst_device_id,
        ]
    }
}

/// A complete, checksum-verified frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The frame header.
    pub preamble: Preamble,
    /// Raw payload, `preamble.payload_length` bytes.
    pub payload: Bytes,
    /// Checksum as received.
    pub checksum: u16,
}

impl Frame {
    /// Build a locally originated frame, computing its checksum.
    pub fn new(message_id: u16, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        let payload_length = payload_length(payload.len())?;
        let preamble = Preamble::new(message_id, payload_length);
        let checksum = frame_checksum(&preamble, &payload);
        Ok(Self {
            preamble,
            payload,
            checksum,
        })
    }

    /// The message id from the preamble.
    pub fn message_id(&self) -> u16 {
        self.preamble.message_id
    }

    /// The declared payload length from the preamble.
    pub fn payload_length(&self) -> usize {
        usize::from(self.preamble.payload_length)
    }

    /// The total wire size of this frame (preamble + payload + checksum).
    pub fn wire_size(&self) -> usize {
        PREAMBLE_SIZE + self.payload.len() + CHECKSUM_SIZE
    }

    /// Serialize to wire bytes.
    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(self.wire_size());
        self.preamble.write_to(&mut dst);
        dst.put_slice(&self.payload);
        dst.put_u16_le(self.checksum);
        dst.freeze()
    }
}

/// Sum of every byte, modulo 2^16.
pub fn checksum(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |acc, byte| acc.wrapping_add(u16::from(*byte)))
}

pub(crate) fn frame_checksum(preamble: &Preamble, payload: &[u8]) -> u16 {
    checksum(&preamble.to_bytes()).wrapping_add(checksum(payload))
}

fn payload_length(len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| FrameError::PayloadTooLarge {
        size: len,
        max: MAX_PAYLOAD,
    })
}

/// Encode a locally originated packet into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────────┬──────────┬──────────┬─────┬─────┬──────────────┬──────────┐
/// │ Marker    │ Length   │ Msg id   │ Src │ Dst │ Payload      │ Checksum │
/// │ "BR"      │ (2B LE)  │ (2B LE)  │ 1B  │ 1B  │ (Length B)   │ (2B LE)  │
/// └───────────┴──────────┴──────────┴─────┴─────┴──────────────┴──────────┘
/// ```
pub fn encode_frame(message_id: u16, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    encode_frame_routed(message_id, 0, 0, payload, dst)
}

/// Encode a packet with explicit routing fields.
pub fn encode_frame_routed(
    message_id: u16,
    src_device_id: u8,
    dst_device_id: u8,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    let preamble = Preamble {
        payload_length: payload_length(payload.len())?,
        message_id,
        src_device_id,
        dst_device_id,
    };

    dst.reserve(PREAMBLE_SIZE + payload.len() + CHECKSUM_SIZE);
    preamble.write_to(dst);
    dst.put_slice(payload);
    dst.put_u16_le(frame_checksum(&preamble, payload));
    Ok(())
}

/// Configuration for frame synchronization and reading.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Largest declared payload accepted before the frame is dropped.
    /// Default: the full u16 range.
    pub max_payload_size: usize,
    /// Upper bound on a single transport read.
    pub read_chunk_size: usize,
    /// How the synchronizer recovers after a non-marker byte pair.
    pub resync: ResyncPolicy,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_PAYLOAD,
            read_chunk_size: 256,
            resync: ResyncPolicy::default(),
        }
    }
}
