use std::sync::Arc;

use pinglink_device::CommandBuilder;
use pinglink_schema::{FieldType, MessageLayout, SchemaTable, Value};

use crate::cmd::EncodeArgs;
use crate::exit::{command_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let table = Arc::new(args.definitions.load_table()?);
    let layout = Arc::clone(resolve_message(&table, &args.message)?);
    let values = parse_values(&layout, &args.values)?;

    let packet = CommandBuilder::new(table)
        .build(layout.id(), &values)
        .map_err(|err| command_error("encode failed", err))?;

    print_packet(layout.id(), layout.name(), &packet, format);
    Ok(SUCCESS)
}

fn resolve_message<'a>(table: &'a SchemaTable, message: &str) -> CliResult<&'a Arc<MessageLayout>> {
    let found = match message.parse::<u16>() {
        Ok(id) => table.get(id),
        Err(_) => table.by_name(message),
    };
    found.ok_or_else(|| CliError::new(USAGE, format!("unknown message '{message}'")))
}

fn parse_values(layout: &MessageLayout, raw: &[String]) -> CliResult<Vec<Value>> {
    if raw.len() != layout.fields().len() {
        return Err(CliError::new(
            USAGE,
            format!(
                "{} takes {} values, got {}",
                layout.name(),
                layout.fields().len(),
                raw.len()
            ),
        ));
    }

    layout
        .fields()
        .iter()
        .zip(raw)
        .map(|(field, text)| {
            parse_value(field.field_type, text).ok_or_else(|| {
                CliError::new(
                    USAGE,
                    format!("field '{}': cannot read '{text}' as {}", field.name, field.field_type),
                )
            })
        })
        .collect()
}

fn parse_value(field_type: FieldType, text: &str) -> Option<Value> {
    match field_type {
        FieldType::U8 | FieldType::U16 | FieldType::U32 => parse_unsigned(text).map(Value::Unsigned),
        FieldType::Char => match text.as_bytes() {
            [c] if c.is_ascii() => Some(Value::Char(*c)),
            _ => None,
        },
        FieldType::ByteArray => {
            let digits = text.strip_prefix("0x").unwrap_or(text);
            hex::decode(digits).ok().map(Value::from)
        }
    }
}

// Range is checked by the encoder, which knows the field width.
fn parse_unsigned(text: &str) -> Option<u64> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(digits) => u64::from_str_radix(digits, 16).ok(),
        None => text.parse().ok(),
    }
}
