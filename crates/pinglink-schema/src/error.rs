use crate::types::FieldType;

/// Errors raised while loading or compiling message schemas.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A definition file could not be read.
    #[error("failed to load definitions: {0}")]
    LoadFailed(String),

    /// A definition document does not have the expected shape.
    #[error("invalid definition document '{group}': {message}")]
    InvalidDocument { group: String, message: String },

    /// A definition document is not valid JSON.
    #[error("definition document is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A field uses a type tag outside the known set.
    #[error("message '{message}' field '{field}': unknown type '{type_tag}'")]
    UnknownFieldType {
        message: String,
        field: String,
        type_tag: String,
    },

    /// A variable-length field is followed by another field.
    #[error("message '{message}': variable-length field '{field}' must be last")]
    VariableFieldNotLast { message: String, field: String },

    /// Two messages declare the same id.
    #[error("message id {id} declared by both '{first}' and '{second}'")]
    DuplicateMessageId {
        id: u16,
        first: String,
        second: String,
    },
}

/// Errors raised while encoding field values into a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// Wrong number of values for the layout.
    #[error("message {message_id} takes {expected} values, got {actual}")]
    FieldCount {
        message_id: u16,
        expected: usize,
        actual: usize,
    },

    /// A value of the wrong kind for its field.
    #[error("message {message_id} field '{field}': expected {expected}, got {actual}")]
    TypeMismatch {
        message_id: u16,
        field: String,
        expected: FieldType,
        actual: &'static str,
    },

    /// An unsigned value too wide for its field.
    #[error("message {message_id} field '{field}': {value} does not fit {field_type}")]
    OutOfRange {
        message_id: u16,
        field: String,
        value: u64,
        field_type: FieldType,
    },
}

/// Errors raised while decoding a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Payload size does not match what the layout requires.
    #[error("message {message_id}: expected {expected} payload bytes, got {actual}")]
    LengthMismatch {
        message_id: u16,
        expected: usize,
        actual: usize,
    },

    /// The declared length is shorter than the fixed part of a
    /// variable-tail layout.
    #[error("message {message_id}: declared length {declared} is shorter than fixed prefix {fixed}")]
    NegativeTailLength {
        message_id: u16,
        declared: usize,
        fixed: usize,
    },
}

pub type Result<T> = std::result::Result<T, SchemaError>;
