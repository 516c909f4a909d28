//! Ping protocol definition documents.
//!
//! A definition document groups messages by category:
//!
//! ```json
//! { "messages": { "set": { "set_range": { "id": 1001, "payload": [
//!     { "name": "scan_start", "type": "u32" },
//!     { "name": "scan_length", "type": "u32" } ] } } } }
//! ```
//!
//! Documents are checked against an embedded JSON Schema before they are
//! turned into a [`MessageGroup`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::compiler::compile;
use crate::description::{FieldDescription, MessageDescription, MessageGroup, SchemaDescription};
use crate::error::{Result, SchemaError};
use crate::layout::SchemaTable;

/// JSON Schema every definition document must satisfy.
pub const DEFINITIONS_SCHEMA: &str = include_str!("definitions/definitions.schema.json");

/// Messages shared by every ping device (ids below 1000).
pub const COMMON_DEFINITIONS: &str = include_str!("definitions/common.json");

/// Ping1D echosounder messages.
pub const PING1D_DEFINITIONS: &str = include_str!("definitions/ping1d.json");

const MAX_REPORTED_ERRORS: usize = 4;

#[derive(Debug, Deserialize)]
struct Document {
    messages: BTreeMap<String, BTreeMap<String, RawMessage>>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    id: u16,
    #[serde(default)]
    description: String,
    #[serde(default)]
    payload: Vec<FieldDescription>,
}

impl MessageGroup {
    /// Parse and validate a definition document.
    ///
    /// Messages come back ordered by id regardless of their category.
    pub fn from_definition_json(name: &str, json: &str) -> Result<Self> {
        let document: JsonValue = serde_json::from_str(json)?;
        validate_document(name, &document)?;

        let document: Document = serde_json::from_value(document)?;
        let mut messages: Vec<MessageDescription> = document
            .messages
            .into_values()
            .flat_map(BTreeMap::into_iter)
            .map(|(message_name, raw)| MessageDescription {
                id: raw.id,
                name: message_name,
                description: raw.description,
                fields: raw.payload,
            })
            .collect();
        messages.sort_by_key(|m| m.id);

        tracing::debug!(group = name, messages = messages.len(), "loaded definitions");
        Ok(Self::new(name, messages))
    }

    /// Load a definition document from disk. The group is named after the
    /// file stem.
    pub fn from_definition_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .ok_or_else(|| SchemaError::LoadFailed(format!("{}: no file name", path.display())))?;
        Self::from_definition_json(&name, &json)
    }
}

fn validate_document(group: &str, document: &JsonValue) -> Result<()> {
    let schema: JsonValue = serde_json::from_str(DEFINITIONS_SCHEMA)?;
    let validator = jsonschema::validator_for(&schema)
        .map_err(|err| SchemaError::LoadFailed(format!("definitions schema: {err}")))?;

    let mut errors = validator.iter_errors(document);
    if let Some(first) = errors.next() {
        let mut message = first.to_string();
        for err in errors.take(MAX_REPORTED_ERRORS - 1) {
            message.push_str("; ");
            message.push_str(&err.to_string());
        }
        return Err(SchemaError::InvalidDocument {
            group: group.to_string(),
            message,
        });
    }

    Ok(())
}

/// The embedded common and ping1d definitions.
pub fn builtin() -> Result<SchemaDescription> {
    Ok(SchemaDescription::new(vec![
        MessageGroup::from_definition_json("common", COMMON_DEFINITIONS)?,
        MessageGroup::from_definition_json("ping1d", PING1D_DEFINITIONS)?,
    ]))
}

impl SchemaTable {
    /// Compile the embedded common and ping1d definitions.
    pub fn builtin() -> Result<Self> {
        compile(&builtin()?)
    }
}
