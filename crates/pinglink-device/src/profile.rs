use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use pinglink_frame::ids;
use pinglink_schema::{DecodedMessage, MessageLayout, Value};

use crate::error::DispatchError;

/// One decoded profile report (message 1300).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileReport {
    /// Distance to target, mm.
    pub distance: u32,
    /// Confidence in the distance, percent.
    pub confidence: u16,
    /// Acoustic pulse length, microseconds.
    pub transmit_duration: u16,
    pub ping_number: u32,
    /// Start of the scan window, mm.
    pub scan_start: u32,
    /// Length of the scan window, mm.
    pub scan_length: u32,
    pub gain_setting: u32,
    /// Sample count as reported by the device.
    pub profile_data_length: u16,
    /// Echo strength samples across the scan window.
    pub profile_data: Bytes,
}

impl ProfileReport {
    /// Build a report from a decoded profile message.
    pub fn from_decoded(
        layout: &MessageLayout,
        message: &DecodedMessage,
    ) -> Result<Self, DispatchError> {
        if message.message_id != ids::PROFILE {
            return Err(DispatchError::MalformedProfile(format!(
                "message id {} is not a profile",
                message.message_id
            )));
        }

        let unsigned = |name: &str| -> Result<u64, DispatchError> {
            message
                .value(layout, name)
                .and_then(Value::as_u64)
                .ok_or_else(|| DispatchError::MalformedProfile(format!("missing field '{name}'")))
        };
        let narrow = |name: &str, max: u64| -> Result<u64, DispatchError> {
            let value = unsigned(name)?;
            if value > max {
                return Err(DispatchError::MalformedProfile(format!(
                    "field '{name}' out of range: {value}"
                )));
            }
            Ok(value)
        };
        let u16_field = |name: &str| narrow(name, u64::from(u16::MAX)).map(|v| v as u16);
        let u32_field = |name: &str| narrow(name, u64::from(u32::MAX)).map(|v| v as u32);

        let profile_data = message
            .value(layout, "profile_data")
            .and_then(Value::as_bytes)
            .cloned()
            .ok_or_else(|| DispatchError::MalformedProfile("missing field 'profile_data'".into()))?;

        Ok(Self {
            distance: u32_field("distance")?,
            confidence: u16_field("confidence")?,
            transmit_duration: u16_field("transmit_duration")?,
            ping_number: u32_field("ping_number")?,
            scan_start: u32_field("scan_start")?,
            scan_length: u32_field("scan_length")?,
            gain_setting: u32_field("gain_setting")?,
            profile_data_length: u16_field("profile_data_length")?,
            profile_data,
        })
    }
}

#[derive(Debug, Default)]
struct SlotState {
    report: Option<ProfileReport>,
    fresh: bool,
}

/// Latest profile report plus a freshness flag.
///
/// The receive worker stores; any thread reads. Reading through
/// [`read`](Self::read) or [`take_fresh`](Self::take_fresh) clears the flag,
/// so each report is observed as fresh at most once.
#[derive(Debug, Default)]
pub struct ProfileSlot {
    state: Mutex<SlotState>,
}

impl ProfileSlot {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the state half-written.
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the stored report and mark it fresh.
    pub fn store(&self, report: ProfileReport) {
        let mut state = self.lock();
        state.report = Some(report);
        state.fresh = true;
    }

    /// The latest report, if any. Clears freshness.
    pub fn read(&self) -> Option<ProfileReport> {
        let mut state = self.lock();
        state.fresh = false;
        state.report.clone()
    }

    /// The latest report only if it has not been read yet. Clears freshness.
    pub fn take_fresh(&self) -> Option<ProfileReport> {
        let mut state = self.lock();
        if !state.fresh {
            return None;
        }
        state.fresh = false;
        state.report.clone()
    }

    /// Whether a report arrived since the last read.
    pub fn is_fresh(&self) -> bool {
        self.lock().fresh
    }

    /// The latest report without touching freshness.
    pub fn peek(&self) -> Option<ProfileReport> {
        self.lock().report.clone()
    }
}
