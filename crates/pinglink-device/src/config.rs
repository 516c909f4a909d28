use std::time::Duration;

use pinglink_frame::FrameConfig;

/// Default depth of the link event queue.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Default read timeout; bounds how long the worker takes to notice a stop.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Link configuration.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Frame synchronizer settings for the receive side.
    pub frame: FrameConfig,
    /// Events buffered before the oldest ones are evicted.
    pub event_capacity: usize,
    /// Name of the receive worker thread.
    pub worker_name: String,
    /// Read timeout applied to the stream before the worker starts.
    pub read_timeout: Option<Duration>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            worker_name: "pinglink-rx".to_string(),
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
        }
    }
}
