//! Well-known message ids.
//!
//! Ids below 1000 belong to the common message set shared by every ping
//! device. Ids from 1000 up are ping1d (echosounder) specific.

/// Acknowledge a request.
pub const ACK: u16 = 1;
/// Reject a request.
pub const NACK: u16 = 2;
/// Human-readable text from the device.
pub const ASCII_TEXT: u16 = 3;
/// Device type and firmware revision.
pub const DEVICE_INFORMATION: u16 = 4;
/// Protocol version implemented by the device.
pub const PROTOCOL_VERSION: u16 = 5;
/// Ask the device to emit a message by id.
pub const GENERAL_REQUEST: u16 = 6;

/// Set the device id.
pub const SET_DEVICE_ID: u16 = 1000;
/// Set scan range (start and length, mm).
pub const SET_RANGE: u16 = 1001;
/// Set speed of sound (mm/s).
pub const SET_SPEED_OF_SOUND: u16 = 1002;
/// Enable or disable automatic range/gain.
pub const SET_MODE_AUTO: u16 = 1003;
/// Set ping interval (ms).
pub const SET_PING_INTERVAL: u16 = 1004;
/// Set gain setting index.
pub const SET_GAIN_SETTING: u16 = 1005;
/// Enable or disable pinging.
pub const SET_PING_ENABLE: u16 = 1006;

/// Reboot into the bootloader.
pub const GOTO_BOOTLOADER: u16 = 1100;
/// Distance and confidence only.
pub const DISTANCE_SIMPLE: u16 = 1211;
/// Distance measurement with its settings.
pub const DISTANCE: u16 = 1212;
/// Full echo profile report.
pub const PROFILE: u16 = 1300;

/// Start continuous emission of a message id.
pub const CONTINUOUS_START: u16 = 1400;
/// Stop continuous emission of a message id.
pub const CONTINUOUS_STOP: u16 = 1401;

/// First ping1d-specific message id.
pub const DEVICE_ID_START: u16 = 1000;

/// Returns a human-readable name for a well-known message id.
pub fn message_name(id: u16) -> &'static str {
    match id {
        ACK => "ack",
        NACK => "nack",
        ASCII_TEXT => "ascii_text",
        DEVICE_INFORMATION => "device_information",
        PROTOCOL_VERSION => "protocol_version",
        GENERAL_REQUEST => "general_request",
        SET_DEVICE_ID => "set_device_id",
        SET_RANGE => "set_range",
        SET_SPEED_OF_SOUND => "set_speed_of_sound",
        SET_MODE_AUTO => "set_mode_auto",
        SET_PING_INTERVAL => "set_ping_interval",
        SET_GAIN_SETTING => "set_gain_setting",
        SET_PING_ENABLE => "set_ping_enable",
        GOTO_BOOTLOADER => "goto_bootloader",
        DISTANCE_SIMPLE => "distance_simple",
        DISTANCE => "distance",
        PROFILE => "profile",
        CONTINUOUS_START => "continuous_start",
        CONTINUOUS_STOP => "continuous_stop",
        0..DEVICE_ID_START => "COMMON",
        _ => "DEVICE",
    }
}
