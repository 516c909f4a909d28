//! Talking to a ping device over a framed link.
//!
//! [`CommandBuilder`] turns field values into complete packets,
//! [`Dispatcher`] decodes verified frames and publishes profile reports into
//! a [`ProfileSlot`], and [`Link`] runs the receive loop on a background
//! worker thread while callers send commands and read the latest profile.

pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod link;
pub mod profile;

pub use command::CommandBuilder;
pub use config::LinkConfig;
pub use dispatch::{Dispatched, Dispatcher};
pub use error::{CommandError, DeviceError, DispatchError, Result};
pub use events::{DropReason, EventQueue, LinkEvent};
pub use link::Link;
pub use profile::{ProfileReport, ProfileSlot};
