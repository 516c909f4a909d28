use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{Frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::sync::FrameSync;

/// `tokio_util` codec for ping frames.
///
/// Decoding runs the same synchronizer as [`FrameReader`](crate::FrameReader).
/// Dropped frames (bad checksum, oversized length) are logged and skipped so
/// one corrupt frame does not end a `FramedRead` stream.
#[derive(Debug)]
pub struct PingCodec {
    sync: FrameSync,
    dropped: u64,
}

impl PingCodec {
    /// Create a codec with default configuration.
    pub fn new() -> Self {
        Self::with_config(&FrameConfig::default())
    }

    /// Create a codec with explicit configuration.
    pub fn with_config(config: &FrameConfig) -> Self {
        Self {
            sync: FrameSync::new(config.resync, config.max_payload_size),
            dropped: 0,
        }
    }

    /// Frames dropped so far.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped
    }
}

impl Default for PingCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for PingCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        loop {
            match self.sync.advance(src) {
                Some(Ok(frame)) => return Ok(Some(frame)),
                Some(Err(err)) => {
                    self.dropped = self.dropped.saturating_add(1);
                    tracing::warn!(error = %err, "dropping frame");
                }
                None => return Ok(None),
            }
        }
    }
}

impl Encoder<Frame> for PingCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<()> {
        dst.extend_from_slice(&item.to_bytes());
        Ok(())
    }
}

impl Encoder<Bytes> for PingCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<()> {
        dst.extend_from_slice(&item);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;
    use crate::codec::encode_frame;

    fn wire(message_id: u16, payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        encode_frame(message_id, payload, &mut buf).unwrap();
        buf.to_vec()
    }

    #[test]
    fn decode_skips_corrupt_frame() {
        let mut bytes = wire(1211, &[1, 2, 3, 4, 5]);
        bytes[9] ^= 0x80;
        bytes.extend(wire(1211, &[5, 4, 3, 2, 1]));

        let mut codec = PingCodec::new();
        let mut src = BytesMut::from(bytes.as_slice());
        let frame = codec.decode(&mut src).unwrap().unwrap();

        assert_eq!(frame.payload.as_ref(), &[5, 4, 3, 2, 1]);
        assert_eq!(codec.dropped_frames(), 1);
        assert!(codec.decode(&mut src).unwrap().is_none());
    }

    #[tokio::test]
    async fn framed_read_yields_frames() {
        let mut bytes = vec![0x01, 0x02];
        bytes.extend(wire(5, &[1, 2, 0, 0]));
        bytes.extend(wire(1300, &[0; 26]));

        let mut framed = FramedRead::new(bytes.as_slice(), PingCodec::new());
        let first = framed.next().await.unwrap().unwrap();
        let second = framed.next().await.unwrap().unwrap();

        assert_eq!(first.message_id(), 5);
        assert_eq!(second.message_id(), 1300);
        assert!(framed.next().await.is_none());
    }

    #[tokio::test]
    async fn framed_write_emits_wire_bytes() {
        let frame = Frame::new(1400, vec![0x14, 0x05]).unwrap();
        let mut framed = FramedWrite::new(Vec::new(), PingCodec::new());

        framed.send(frame.clone()).await.unwrap();
        assert_eq!(framed.get_ref().as_slice(), frame.to_bytes().as_ref());
    }
}
