use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use pinglink_frame::{encode_frame, ids, CHECKSUM_SIZE, PREAMBLE_SIZE};
use pinglink_schema::{encode, SchemaTable, Value};

use crate::error::CommandError;

type Result<T> = std::result::Result<T, CommandError>;

/// Builds complete command packets from field values.
///
/// Packets carry source and destination device id 0. Building is pure: the
/// caller decides where the bytes go.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    table: Arc<SchemaTable>,
}

impl CommandBuilder {
    pub fn new(table: Arc<SchemaTable>) -> Self {
        Self { table }
    }

    /// Schema table used to look up layouts.
    pub fn table(&self) -> &Arc<SchemaTable> {
        &self.table
    }

    /// Encode `values` against the layout for `message_id` and frame the
    /// result.
    pub fn build(&self, message_id: u16, values: &[Value]) -> Result<Bytes> {
        let layout = self
            .table
            .get(message_id)
            .ok_or(CommandError::UnknownMessageId(message_id))?;
        let payload = encode(layout, values)?;

        let mut packet = BytesMut::with_capacity(PREAMBLE_SIZE + payload.len() + CHECKSUM_SIZE);
        encode_frame(message_id, &payload, &mut packet)?;
        tracing::trace!(
            message_id,
            name = layout.name(),
            bytes = packet.len(),
            "built command"
        );
        Ok(packet.freeze())
    }

    /// Ask the device to send one message.
    pub fn general_request(&self, requested_id: u16) -> Result<Bytes> {
        self.build(ids::GENERAL_REQUEST, &[Value::from(requested_id)])
    }

    /// Ask the device for its protocol version.
    pub fn request_protocol_version(&self) -> Result<Bytes> {
        self.general_request(ids::PROTOCOL_VERSION)
    }

    pub fn set_device_id(&self, device_id: u8) -> Result<Bytes> {
        self.build(ids::SET_DEVICE_ID, &[Value::from(device_id)])
    }

    /// Set the scan window, in millimeters.
    pub fn set_range(&self, scan_start: u32, scan_length: u32) -> Result<Bytes> {
        self.build(
            ids::SET_RANGE,
            &[Value::from(scan_start), Value::from(scan_length)],
        )
    }

    /// Speed of sound in mm/s.
    pub fn set_speed_of_sound(&self, speed_of_sound: u32) -> Result<Bytes> {
        self.build(ids::SET_SPEED_OF_SOUND, &[Value::from(speed_of_sound)])
    }

    pub fn set_mode_auto(&self, auto: bool) -> Result<Bytes> {
        self.build(ids::SET_MODE_AUTO, &[Value::from(u8::from(auto))])
    }

    /// Interval between pings, in milliseconds.
    pub fn set_ping_interval(&self, interval_ms: u16) -> Result<Bytes> {
        self.build(ids::SET_PING_INTERVAL, &[Value::from(interval_ms)])
    }

    pub fn set_gain_setting(&self, gain_setting: u8) -> Result<Bytes> {
        self.build(ids::SET_GAIN_SETTING, &[Value::from(gain_setting)])
    }

    pub fn set_ping_enable(&self, enabled: bool) -> Result<Bytes> {
        self.build(ids::SET_PING_ENABLE, &[Value::from(u8::from(enabled))])
    }

    /// Start continuous emission of `message_id` (usually the profile).
    pub fn continuous_start(&self, message_id: u16) -> Result<Bytes> {
        self.build(ids::CONTINUOUS_START, &[Value::from(message_id)])
    }

    pub fn continuous_stop(&self, message_id: u16) -> Result<Bytes> {
        self.build(ids::CONTINUOUS_STOP, &[Value::from(message_id)])
    }
}
