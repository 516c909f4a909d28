//! Toolkit for the ping sonar binary protocol.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte streams over Unix sockets and TCP
//! - [`frame`]: marker synchronization, preamble, checksum, frame reader/writer
//! - [`schema`]: message definitions, schema compiler and payload codec
//! - [`device`]: command builder, packet dispatcher and the device link
//!   (behind the `device` feature)

/// Re-export transport types.
pub mod transport {
    pub use pinglink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use pinglink_frame::*;
}

/// Re-export schema types.
pub mod schema {
    pub use pinglink_schema::*;
}

/// Re-export device types (requires `device` feature).
#[cfg(feature = "device")]
pub mod device {
    pub use pinglink_device::*;
}
