use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use pinglink_frame::FrameError;

use crate::error::DispatchError;

/// Something the receive worker observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A frame was verified and dispatched.
    Dispatched { message_id: u16 },
    /// A frame was dropped.
    Dropped {
        message_id: Option<u16>,
        reason: DropReason,
    },
    /// The worker has exited.
    Closed,
}

/// Why a frame was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    ChecksumMismatch,
    PayloadTooLarge,
    Timeout,
    UnknownMessageId,
    Decode,
    MalformedProfile,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::ChecksumMismatch => "checksum_mismatch",
            DropReason::PayloadTooLarge => "payload_too_large",
            DropReason::Timeout => "timeout",
            DropReason::UnknownMessageId => "unknown_message_id",
            DropReason::Decode => "decode",
            DropReason::MalformedProfile => "malformed_profile",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LinkEvent {
    /// Event for a non-fatal frame error. `None` for errors that end the link.
    pub fn from_frame_error(err: &FrameError) -> Option<Self> {
        let (message_id, reason) = match err {
            FrameError::ChecksumMismatch { message_id, .. } => {
                (Some(*message_id), DropReason::ChecksumMismatch)
            }
            FrameError::PayloadTooLarge { .. } => (None, DropReason::PayloadTooLarge),
            FrameError::IoTimeout { .. } => (None, DropReason::Timeout),
            FrameError::InvalidMarker => (None, DropReason::Decode),
            FrameError::Io(_) | FrameError::ConnectionClosed => return None,
        };
        Some(LinkEvent::Dropped { message_id, reason })
    }

    /// Event for a frame the dispatcher rejected.
    pub fn from_dispatch_error(err: &DispatchError) -> Self {
        let reason = match err {
            DispatchError::UnknownMessageId(_) => DropReason::UnknownMessageId,
            DispatchError::Decode { .. } => DropReason::Decode,
            DispatchError::MalformedProfile(_) => DropReason::MalformedProfile,
        };
        LinkEvent::Dropped {
            message_id: err.message_id(),
            reason,
        }
    }
}

/// Bounded queue of link events that keeps the newest ones.
///
/// When full, pushing evicts the oldest queued event, so drops and the final
/// [`LinkEvent::Closed`] are always observable to a late reader.
#[derive(Debug)]
pub struct EventQueue {
    capacity: usize,
    inner: Mutex<QueueState>,
    ready: Condvar,
}

#[derive(Debug, Default)]
struct QueueState {
    events: VecDeque<LinkEvent>,
    evicted: u64,
}

impl EventQueue {
    /// A queue holding at most `capacity` events (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: Mutex::new(QueueState {
                events: VecDeque::with_capacity(capacity),
                evicted: 0,
            }),
            ready: Condvar::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an event, evicting the oldest one when full.
    pub fn push(&self, event: LinkEvent) {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if state.events.len() == self.capacity {
            if let Some(old) = state.events.pop_front() {
                state.evicted += 1;
                tracing::trace!(?old, "event queue full, evicting oldest");
            }
        }
        state.events.push_back(event);
        drop(state);
        self.ready.notify_one();
    }

    /// Remove and return every queued event, oldest first.
    pub fn drain(&self) -> Vec<LinkEvent> {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.events.drain(..).collect()
    }

    /// Wait up to `timeout` for the oldest queued event.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<LinkEvent> {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(event) = state.events.pop_front() {
                return Some(event);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            state = self
                .ready
                .wait_timeout(state, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .events
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events discarded to make room since the queue was created.
    pub fn evicted(&self) -> u64 {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .evicted
    }
}
