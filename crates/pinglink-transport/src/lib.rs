//! Duplex byte-stream abstraction for ping sonar links.
//!
//! The sonar itself hangs off a serial line. Opening and configuring the
//! serial device is left to the caller; everything above this crate only sees
//! a [`ByteStream`]: bounded reads that come back empty on timeout, blocking
//! writes, and an explicit close that unblocks a pending read.
//!
//! [`LinkStream`] implements the trait for Unix domain sockets and TCP, which
//! covers serial-over-network bridges and socket-pair test rigs.

pub mod error;
pub mod stream;
pub mod traits;

pub use error::{Result, TransportError};
pub use stream::LinkStream;
pub use traits::ByteStream;
