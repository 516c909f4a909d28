use crate::description::{MessageDescription, SchemaDescription};
use crate::error::{Result, SchemaError};
use crate::layout::{FieldDef, MessageLayout, SchemaTable};
use crate::types::FieldType;

/// Compile message definitions into a schema table.
///
/// Fails on an unknown type tag, a variable-length field that is not last,
/// or an id declared twice (within or across groups).
pub fn compile(schema: &SchemaDescription) -> Result<SchemaTable> {
    let mut table = SchemaTable::with_capacity(schema.message_count());

    for group in &schema.groups {
        for message in &group.messages {
            let layout = compile_message(&group.name, message)?;
            if let Some(existing) = table.insert(layout) {
                return Err(SchemaError::DuplicateMessageId {
                    id: message.id,
                    first: existing.name().to_string(),
                    second: message.name.clone(),
                });
            }
        }
        tracing::debug!(group = %group.name, messages = group.messages.len(), "compiled message group");
    }

    Ok(table)
}

fn compile_message(group: &str, message: &MessageDescription) -> Result<MessageLayout> {
    let mut fields = Vec::with_capacity(message.fields.len());
    let mut fixed_size = 0usize;
    let mut has_variable_tail = false;

    for (index, field) in message.fields.iter().enumerate() {
        let field_type =
            FieldType::from_tag(&field.type_tag).ok_or_else(|| SchemaError::UnknownFieldType {
                message: message.name.clone(),
                field: field.name.clone(),
                type_tag: field.type_tag.clone(),
            })?;

        match field_type.width() {
            Some(width) => fixed_size += width,
            None if index + 1 == message.fields.len() => has_variable_tail = true,
            None => {
                return Err(SchemaError::VariableFieldNotLast {
                    message: message.name.clone(),
                    field: field.name.clone(),
                })
            }
        }

        fields.push(FieldDef {
            name: field.name.clone(),
            field_type,
        });
    }

    Ok(MessageLayout {
        id: message.id,
        name: message.name.clone(),
        description: message.description.clone(),
        group: group.to_string(),
        fields,
        fixed_size,
        has_variable_tail,
    })
}
