use std::fmt;

use bytes::{Buf, BytesMut};

use crate::codec::{frame_checksum, Frame, Preamble, CHECKSUM_SIZE, MARKER, PREAMBLE_SIZE};
use crate::error::{FrameError, Result};

/// What the synchronizer does when two buffered bytes are not the marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResyncPolicy {
    /// Drop both buffered bytes. A marker starting on the second of them is
    /// missed.
    #[default]
    Coarse,
    /// Drop only the oldest byte and keep looking.
    Sliding,
}

/// Synchronizer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Looking for the "BR" marker.
    Seeking,
    /// Marker found, collecting the rest of the preamble.
    PreambleWait,
    /// Collecting `payload_length` payload bytes.
    PayloadWait,
    /// Collecting the 2-byte checksum.
    ChecksumWait,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SyncState::Seeking => "seeking marker",
            SyncState::PreambleWait => "reading preamble",
            SyncState::PayloadWait => "reading payload",
            SyncState::ChecksumWait => "reading checksum",
        };
        f.write_str(label)
    }
}

/// Byte-driven frame synchronizer.
///
/// Bytes are pushed in with [`advance`](Self::advance); the synchronizer
/// consumes them until it has an outcome (a verified frame or a dropped one)
/// or the input runs dry. Partial frames stay buffered between calls.
#[derive(Debug)]
pub struct FrameSync {
    state: SyncState,
    buf: BytesMut,
    preamble: Option<Preamble>,
    policy: ResyncPolicy,
    max_payload: usize,
    discarded: u64,
}

impl FrameSync {
    /// Create a synchronizer with the given resync policy and payload cap.
    pub fn new(policy: ResyncPolicy, max_payload: usize) -> Self {
        Self {
            state: SyncState::Seeking,
            buf: BytesMut::with_capacity(PREAMBLE_SIZE),
            preamble: None,
            policy,
            max_payload,
            discarded: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// True while a frame is partially assembled.
    pub fn in_frame(&self) -> bool {
        self.state != SyncState::Seeking
    }

    /// Total bytes thrown away while seeking the marker.
    pub fn discarded_bytes(&self) -> u64 {
        self.discarded
    }

    /// Drop any partial frame and go back to seeking.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.preamble = None;
        self.state = SyncState::Seeking;
    }

    /// Consume bytes from `src` until a frame completes or is dropped.
    ///
    /// Returns `None` once `src` is empty without an outcome. Errors are
    /// per-frame: the synchronizer is back in [`SyncState::Seeking`] when one
    /// is returned and unconsumed bytes stay in `src`.
    pub fn advance(&mut self, src: &mut BytesMut) -> Option<Result<Frame>> {
        loop {
            match self.state {
                SyncState::Seeking => {
                    if src.is_empty() {
                        return None;
                    }
                    self.seek(src.get_u8());
                }
                SyncState::PreambleWait => {
                    if !self.fill(src, PREAMBLE_SIZE) {
                        return None;
                    }
                    if let Err(err) = self.parse_preamble() {
                        self.reset();
                        return Some(Err(err));
                    }
                }
                SyncState::PayloadWait => {
                    let target = PREAMBLE_SIZE + self.payload_len();
                    if !self.fill(src, target) {
                        return None;
                    }
                    self.state = SyncState::ChecksumWait;
                }
                SyncState::ChecksumWait => {
                    let target = PREAMBLE_SIZE + self.payload_len() + CHECKSUM_SIZE;
                    if !self.fill(src, target) {
                        return None;
                    }
                    let outcome = self.finish();
                    self.reset();
                    return Some(outcome);
                }
            }
        }
    }

    fn seek(&mut self, byte: u8) {
        self.buf.extend_from_slice(&[byte]);

        if self.buf[..] == MARKER {
            self.state = SyncState::PreambleWait;
            return;
        }

        if self.buf.len() >= MARKER.len() {
            let dropped = match self.policy {
                ResyncPolicy::Coarse => {
                    let n = self.buf.len();
                    self.buf.clear();
                    n
                }
                ResyncPolicy::Sliding => {
                    self.buf.advance(1);
                    1
                }
            };
            self.discarded = self.discarded.saturating_add(dropped as u64);
            tracing::trace!(dropped, policy = ?self.policy, "resync: no marker");
        }
    }

    /// Move bytes from `src` until the buffer holds `target` bytes.
    fn fill(&mut self, src: &mut BytesMut, target: usize) -> bool {
        let missing = target.saturating_sub(self.buf.len());
        let take = missing.min(src.len());
        if take > 0 {
            self.buf.extend_from_slice(&src.split_to(take));
        }
        self.buf.len() >= target
    }

    fn parse_preamble(&mut self) -> Result<()> {
        let mut raw = [0u8; PREAMBLE_SIZE];
        raw.copy_from_slice(&self.buf[..PREAMBLE_SIZE]);
        let preamble = Preamble::parse(&raw)?;

        let size = usize::from(preamble.payload_length);
        if size > self.max_payload {
            tracing::debug!(
                message_id = preamble.message_id,
                size,
                max = self.max_payload,
                "declared payload over limit"
            );
            return Err(FrameError::PayloadTooLarge {
                size,
                max: self.max_payload,
            });
        }

        self.preamble = Some(preamble);
        self.state = SyncState::PayloadWait;
        Ok(())
    }

    fn payload_len(&self) -> usize {
        self.preamble
            .map(|preamble| usize::from(preamble.payload_length))
            .unwrap_or(0)
    }

    fn finish(&mut self) -> Result<Frame> {
        let Some(preamble) = self.preamble else {
            return Err(FrameError::InvalidMarker);
        };
        let payload_end = PREAMBLE_SIZE + usize::from(preamble.payload_length);

        let mut frame = self.buf.split_to(payload_end + CHECKSUM_SIZE);
        let received = u16::from_le_bytes([frame[payload_end], frame[payload_end + 1]]);
        frame.truncate(payload_end);
        let payload = frame.split_off(PREAMBLE_SIZE).freeze();

        let expected = frame_checksum(&preamble, &payload);
        if expected != received {
            return Err(FrameError::ChecksumMismatch {
                message_id: preamble.message_id,
                expected,
                received,
            });
        }

        Ok(Frame {
            preamble,
            payload,
            checksum: received,
        })
    }
}

impl Default for FrameSync {
    fn default() -> Self {
        Self::new(ResyncPolicy::default(), crate::codec::MAX_PAYLOAD)
    }
}
