//! Ping protocol message schemas and the payload codec.
//!
//! Message definitions (id, name, ordered typed fields) are compiled once into
//! an immutable [`SchemaTable`] of [`MessageLayout`]s. The [`codec`] encodes
//! and decodes payloads against a layout, including the one trailing
//! variable-length byte array whose size comes from the frame length.
//!
//! The common and ping1d definition sets ship embedded; see
//! [`SchemaTable::builtin`].

pub mod codec;
pub mod compiler;
pub mod definitions;
pub mod description;
pub mod error;
pub mod layout;
pub mod types;

pub use codec::{decode, encode, DecodedMessage};
pub use compiler::compile;
pub use description::{FieldDescription, MessageDescription, MessageGroup, SchemaDescription};
pub use error::{DecodeError, EncodeError, Result, SchemaError};
pub use layout::{FieldDef, MessageLayout, SchemaTable};
pub use types::{FieldType, Value};
