use serde::{Deserialize, Serialize};

/// In-memory message definitions, before compilation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescription {
    pub groups: Vec<MessageGroup>,
}

/// A named set of message definitions ("common", "ping1d").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageGroup {
    pub name: String,
    pub messages: Vec<MessageDescription>,
}

/// One message definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDescription {
    pub id: u16,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fields: Vec<FieldDescription>,
}

/// One payload field: a name and a type tag (`u8`, `u16`, `u32`, `char`,
/// `vector`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
}

impl SchemaDescription {
    pub fn new(groups: Vec<MessageGroup>) -> Self {
        Self { groups }
    }

    /// Total number of message definitions across groups.
    pub fn message_count(&self) -> usize {
        self.groups.iter().map(|g| g.messages.len()).sum()
    }
}

impl MessageGroup {
    pub fn new(name: impl Into<String>, messages: Vec<MessageDescription>) -> Self {
        Self {
            name: name.into(),
            messages,
        }
    }
}

impl MessageDescription {
    pub fn new(id: u16, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            fields: Vec::new(),
        }
    }

    /// Append a field.
    pub fn field(mut self, name: impl Into<String>, type_tag: impl Into<String>) -> Self {
        self.fields.push(FieldDescription {
            name: name.into(),
            type_tag: type_tag.into(),
        });
        self
    }
}
