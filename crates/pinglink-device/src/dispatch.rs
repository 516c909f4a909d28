use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use pinglink_frame::{ids, Frame};
use pinglink_schema::{decode, DecodedMessage, SchemaTable};

use crate::error::DispatchError;
use crate::profile::{ProfileReport, ProfileSlot};

/// Outcome of dispatching one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// A profile report, now in the profile slot.
    Profile(ProfileReport),
    /// Any other known message.
    Message(DecodedMessage),
}

impl Dispatched {
    pub fn message_id(&self) -> u16 {
        match self {
            Dispatched::Profile(_) => ids::PROFILE,
            Dispatched::Message(message) => message.message_id,
        }
    }
}

/// Decodes verified frames against the schema table.
///
/// Profile reports go to the shared [`ProfileSlot`]. The last decoded value
/// of every message id is kept and can be read with [`latest`](Self::latest).
#[derive(Debug)]
pub struct Dispatcher {
    table: Arc<SchemaTable>,
    profile: Arc<ProfileSlot>,
    latest: Mutex<HashMap<u16, DecodedMessage>>,
}

impl Dispatcher {
    pub fn new(table: Arc<SchemaTable>, profile: Arc<ProfileSlot>) -> Self {
        Self {
            table,
            profile,
            latest: Mutex::new(HashMap::new()),
        }
    }

    /// Decode one frame and publish the result.
    ///
    /// On error nothing is published; the frame is the caller's to log and
    /// drop.
    pub fn dispatch(&self, frame: &Frame) -> Result<Dispatched, DispatchError> {
        let message_id = frame.message_id();
        let layout = self
            .table
            .get(message_id)
            .ok_or(DispatchError::UnknownMessageId(message_id))?;

        let decoded = decode(layout, &frame.payload, frame.payload_length())
            .map_err(|source| DispatchError::Decode { message_id, source })?;

        let dispatched = if message_id == ids::PROFILE {
            let report = ProfileReport::from_decoded(layout, &decoded)?;
            self.profile.store(report.clone());
            Dispatched::Profile(report)
        } else {
            Dispatched::Message(decoded.clone())
        };

        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(message_id, decoded);

        tracing::debug!(message_id, name = layout.name(), "dispatched frame");
        Ok(dispatched)
    }

    /// Most recent decoded value for a message id.
    pub fn latest(&self, message_id: u16) -> Option<DecodedMessage> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&message_id)
            .cloned()
    }

    pub fn profile_slot(&self) -> &Arc<ProfileSlot> {
        &self.profile
    }

    pub fn table(&self) -> &Arc<SchemaTable> {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use bytes::{BufMut, BytesMut};
    use pinglink_schema::{DecodeError, Value};

    use super::*;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(
            Arc::new(SchemaTable::builtin().unwrap()),
            Arc::new(ProfileSlot::new()),
        )
    }

    fn profile_payload(data: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        buf.put_u32_le(1500);
        buf.put_u16_le(80);
        buf.put_u16_le(200);
        buf.put_u32_le(7);
        buf.put_u32_le(100);
        buf.put_u32_le(5000);
        buf.put_u32_le(2);
        buf.put_u16_le(data.len() as u16);
        buf.put_slice(data);
        buf.to_vec()
    }

    #[test]
    fn profile_goes_to_slot() {
        let d = dispatcher();
        let frame = Frame::new(ids::PROFILE, profile_payload(&[10, 20, 30, 40])).unwrap();

        let dispatched = d.dispatch(&frame).unwrap();
        assert_eq!(dispatched.message_id(), ids::PROFILE);

        let slot = d.profile_slot();
        assert!(slot.is_fresh());
        let report = slot.read().unwrap();
        assert_eq!(report.distance, 1500);
        assert_eq!(report.confidence, 80);
        assert_eq!(report.profile_data.as_ref(), &[10, 20, 30, 40]);
        assert!(!slot.is_fresh());
    }

    #[test]
    fn other_messages_are_kept_as_latest() {
        let d = dispatcher();
        d.dispatch(&Frame::new(ids::PROTOCOL_VERSION, vec![1, 0, 0, 0]).unwrap())
            .unwrap();
        let dispatched = d
            .dispatch(&Frame::new(ids::PROTOCOL_VERSION, vec![1, 2, 3, 0]).unwrap())
            .unwrap();

        assert!(matches!(dispatched, Dispatched::Message(_)));
        let latest = d.latest(ids::PROTOCOL_VERSION).unwrap();
        assert_eq!(latest.values[1], Value::Unsigned(2));
        assert!(!d.profile_slot().is_fresh());
    }

    #[test]
    fn unknown_id_leaves_slot_untouched() {
        let d = dispatcher();
        let err = d.dispatch(&Frame::new(4242, vec![1, 2]).unwrap()).unwrap_err();

        assert_eq!(err, DispatchError::UnknownMessageId(4242));
        assert!(d.profile_slot().peek().is_none());
        assert!(d.latest(4242).is_none());
    }

    #[test]
    fn short_profile_is_negative_tail() {
        let d = dispatcher();
        let err = d
            .dispatch(&Frame::new(ids::PROFILE, vec![0u8; 10]).unwrap())
            .unwrap_err();

        assert_eq!(
            err,
            DispatchError::Decode {
                message_id: ids::PROFILE,
                source: DecodeError::NegativeTailLength {
                    message_id: ids::PROFILE,
                    declared: 10,
                    fixed: 26
                }
            }
        );
        assert!(d.profile_slot().peek().is_none());
    }

    #[test]
    fn wrong_fixed_length_is_decode_error() {
        let d = dispatcher();
        let err = d
            .dispatch(&Frame::new(ids::SET_RANGE, vec![0u8; 7]).unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Decode {
                source: DecodeError::LengthMismatch { .. },
                ..
            }
        ));
    }

    #[test]
    fn last_profile_wins() {
        let d = dispatcher();
        d.dispatch(&Frame::new(ids::PROFILE, profile_payload(&[1])).unwrap())
            .unwrap();
        d.dispatch(&Frame::new(ids::PROFILE, profile_payload(&[2, 2])).unwrap())
            .unwrap();

        let report = d.profile_slot().take_fresh().unwrap();
        assert_eq!(report.profile_data.as_ref(), &[2, 2]);
        assert_eq!(report.profile_data_length, 2);
    }
}
