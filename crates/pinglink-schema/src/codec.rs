//! Layout-driven payload encoding and decoding.
//!
//! Multi-byte integers are little-endian and fields are packed in declared
//! order with no padding. A variable-tail layout's byte array takes whatever
//! the declared payload length leaves after the fixed fields.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{DecodeError, EncodeError};
use crate::layout::{FieldDef, MessageLayout};
use crate::types::{FieldType, Value};

/// A decoded payload: field values in layout order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    pub message_id: u16,
    pub values: Vec<Value>,
}

impl DecodedMessage {
    /// Value of a named field.
    pub fn value(&self, layout: &MessageLayout, name: &str) -> Option<&Value> {
        layout.field_index(name).and_then(|i| self.values.get(i))
    }
}

/// Encode field values against a layout.
///
/// Checks every value before writing anything.
pub fn encode(layout: &MessageLayout, values: &[Value]) -> Result<Bytes, EncodeError> {
    if values.len() != layout.fields().len() {
        return Err(EncodeError::FieldCount {
            message_id: layout.id(),
            expected: layout.fields().len(),
            actual: values.len(),
        });
    }

    let mut tail_len = 0usize;
    for (field, value) in layout.fields().iter().zip(values) {
        check_value(layout.id(), field, value)?;
        if let Value::Bytes(bytes) = value {
            tail_len = bytes.len();
        }
    }

    let mut dst = BytesMut::with_capacity(layout.fixed_size() + tail_len);
    for (field, value) in layout.fields().iter().zip(values) {
        match value {
            Value::Unsigned(v) => put_unsigned(&mut dst, *v, field.field_type),
            Value::Char(c) => dst.put_u8(*c),
            Value::Bytes(bytes) => dst.put_slice(bytes),
        }
    }

    Ok(dst.freeze())
}

// Range was checked by `check_value`; the casts cannot truncate.
fn put_unsigned(dst: &mut BytesMut, value: u64, field_type: FieldType) {
    match field_type {
        FieldType::U8 => dst.put_u8(value as u8),
        FieldType::U16 => dst.put_u16_le(value as u16),
        _ => dst.put_u32_le(value as u32),
    }
}

fn check_value(message_id: u16, field: &FieldDef, value: &Value) -> Result<(), EncodeError> {
    let mismatch = || EncodeError::TypeMismatch {
        message_id,
        field: field.name.clone(),
        expected: field.field_type,
        actual: value.kind(),
    };

    match (field.field_type, value) {
        (FieldType::U8 | FieldType::U16 | FieldType::U32, Value::Unsigned(v)) => {
            let max = field.field_type.max_unsigned().unwrap_or(0);
            if *v > max {
                return Err(EncodeError::OutOfRange {
                    message_id,
                    field: field.name.clone(),
                    value: *v,
                    field_type: field.field_type,
                });
            }
            Ok(())
        }
        (FieldType::Char, Value::Char(_)) => Ok(()),
        (FieldType::ByteArray, Value::Bytes(_)) => Ok(()),
        _ => Err(mismatch()),
    }
}

/// Decode a payload against a layout.
///
/// `declared_length` is the payload length from the frame preamble; for a
/// variable-tail layout it fixes the byte array size at
/// `declared_length - fixed_size`.
pub fn decode(
    layout: &MessageLayout,
    payload: &[u8],
    declared_length: usize,
) -> Result<DecodedMessage, DecodeError> {
    let message_id = layout.id();
    let fixed = layout.fixed_size();

    let tail_len = if layout.has_variable_tail() {
        if declared_length < fixed {
            return Err(DecodeError::NegativeTailLength {
                message_id,
                declared: declared_length,
                fixed,
            });
        }
        declared_length - fixed
    } else {
        0
    };

    let expected = fixed + tail_len;
    if payload.len() != expected {
        return Err(DecodeError::LengthMismatch {
            message_id,
            expected,
            actual: payload.len(),
        });
    }

    let mut cursor = payload;
    let values = layout
        .fields()
        .iter()
        .map(|field| match field.field_type {
            FieldType::U8 => Value::Unsigned(u64::from(cursor.get_u8())),
            FieldType::U16 => Value::Unsigned(u64::from(cursor.get_u16_le())),
            FieldType::U32 => Value::Unsigned(u64::from(cursor.get_u32_le())),
            FieldType::Char => Value::Char(cursor.get_u8()),
            FieldType::ByteArray => Value::Bytes(cursor.copy_to_bytes(tail_len)),
        })
        .collect();

    Ok(DecodedMessage { message_id, values })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use crate::description::{MessageDescription, MessageGroup, SchemaDescription};
    use crate::layout::SchemaTable;

    fn table() -> SchemaTable {
        compile(&SchemaDescription::new(vec![MessageGroup::new(
            "test",
            vec![
                MessageDescription::new(1001, "set_range")
                    .field("scan_start", "u32")
                    .field("scan_length", "u32"),
                MessageDescription::new(1210, "general_info")
                    .field("firmware_version_major", "u16")
                    .field("firmware_version_minor", "u16")
                    .field("voltage_5", "u16")
                    .field("ping_interval", "u16")
                    .field("gain_setting", "u8")
                    .field("mode_auto", "u8"),
                MessageDescription::new(42, "tagged")
                    .field("tag", "char")
                    .field("count", "u8"),
                MessageDescription::new(1300, "profile")
                    .field("distance", "u32")
                    .field("confidence", "u16")
                    .field("profile_data_length", "u16")
                    .field("profile_data", "vector"),
                MessageDescription::new(1100, "goto_bootloader"),
            ],
        )]))
        .unwrap()
    }

    #[test]
    fn encode_little_endian() {
        let table = table();
        let bytes = encode(
            table.get(1001).unwrap(),
            &[Value::from(500u32), Value::from(2000u32)],
        )
        .unwrap();

        assert_eq!(bytes.as_ref(), &[0xf4, 0x01, 0, 0, 0xd0, 0x07, 0, 0]);
    }

    #[test]
    fn fixed_layouts_roundtrip() {
        let table = table();
        let cases: Vec<(u16, Vec<Value>)> = vec![
            (1001, vec![Value::from(0u32), Value::from(u32::MAX)]),
            (
                1210,
                vec![
                    Value::from(3u16),
                    Value::from(25u16),
                    Value::from(5000u16),
                    Value::from(100u16),
                    Value::from(6u8),
                    Value::from(1u8),
                ],
            ),
            (42, vec![Value::Char(b'z'), Value::from(255u8)]),
            (1100, vec![]),
        ];

        for (id, values) in cases {
            let layout = table.get(id).unwrap();
            let bytes = encode(layout, &values).unwrap();
            assert_eq!(bytes.len(), layout.fixed_size());

            let decoded = decode(layout, &bytes, bytes.len()).unwrap();
            assert_eq!(decoded.message_id, id);
            assert_eq!(decoded.values, values);
        }
    }

    fn bound_value(field_type: FieldType, high: bool) -> Value {
        match (field_type, high) {
            (FieldType::Char, true) => Value::Char(u8::MAX),
            (FieldType::Char, false) => Value::Char(0),
            (FieldType::ByteArray, _) => unreachable!("fixed layouts have no byte array"),
            (unsigned, true) => Value::Unsigned(unsigned.max_unsigned().unwrap()),
            (_, false) => Value::Unsigned(0),
        }
    }

    #[test]
    fn builtin_fixed_layouts_roundtrip_at_width_bounds() {
        let table = SchemaTable::builtin().unwrap();
        let fixed: Vec<_> = table
            .layouts()
            .into_iter()
            .filter(|layout| !layout.has_variable_tail())
            .collect();
        assert!(fixed.len() > 20, "only {} fixed layouts", fixed.len());

        // All-min, all-max, then alternating so neighbouring fields differ.
        let patterns: [fn(usize) -> bool; 4] =
            [|_| false, |_| true, |i| i % 2 == 0, |i| i % 2 == 1];

        for layout in fixed {
            for pattern in patterns {
                let values: Vec<Value> = layout
                    .fields()
                    .iter()
                    .enumerate()
                    .map(|(i, field)| bound_value(field.field_type, pattern(i)))
                    .collect();

                let bytes = encode(layout, &values).unwrap();
                assert_eq!(bytes.len(), layout.fixed_size(), "{}", layout.name());

                let decoded = decode(layout, &bytes, bytes.len()).unwrap();
                assert_eq!(decoded.message_id, layout.id());
                assert_eq!(decoded.values, values, "{}", layout.name());
            }
        }
    }

    #[test]
    fn width_max_plus_one_is_out_of_range() {
        let table = SchemaTable::builtin().unwrap();
        let cases = [
            ("set_gain_setting", u64::from(u8::MAX) + 1, FieldType::U8),
            ("set_ping_interval", u64::from(u16::MAX) + 1, FieldType::U16),
            ("set_speed_of_sound", u64::from(u32::MAX) + 1, FieldType::U32),
        ];

        for (name, value, field_type) in cases {
            let layout = table.by_name(name).unwrap();
            assert_eq!(layout.fields()[0].field_type, field_type, "{name}");
            let err = encode(layout, &[Value::Unsigned(value)]).unwrap_err();
            assert!(matches!(err, EncodeError::OutOfRange { .. }), "{name}");
        }
    }

    #[test]
    fn variable_tail_roundtrip() {
        let table = table();
        let layout = table.get(1300).unwrap();
        let tail = vec![7u8; 200];
        let values = vec![
            Value::from(1500u32),
            Value::from(80u16),
            Value::from(200u16),
            Value::from(tail.clone()),
        ];

        let bytes = encode(layout, &values).unwrap();
        assert_eq!(bytes.len(), layout.fixed_size() + tail.len());

        let decoded = decode(layout, &bytes, layout.fixed_size() + tail.len()).unwrap();
        assert_eq!(
            decoded.value(layout, "profile_data").and_then(Value::as_bytes).map(|b| b.to_vec()),
            Some(tail)
        );
        assert_eq!(decoded.values, values);
    }

    #[test]
    fn empty_tail() {
        let table = table();
        let layout = table.get(1300).unwrap();
        let payload = [0u8; 8];

        let decoded = decode(layout, &payload, 8).unwrap();
        assert_eq!(decoded.values[3], Value::Bytes(Bytes::new()));
    }

    #[test]
    fn negative_tail_length_rejected() {
        let table = table();
        let layout = table.get(1300).unwrap();

        let err = decode(layout, &[0u8; 5], 5).unwrap_err();
        assert_eq!(
            err,
            DecodeError::NegativeTailLength {
                message_id: 1300,
                declared: 5,
                fixed: 8
            }
        );
    }

    #[test]
    fn tail_payload_shorter_than_declared() {
        let table = table();
        let layout = table.get(1300).unwrap();

        let err = decode(layout, &[0u8; 10], 12).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::LengthMismatch {
                expected: 12,
                actual: 10,
                ..
            }
        ));
    }

    #[test]
    fn fixed_length_mismatch() {
        let table = table();
        let layout = table.get(1001).unwrap();

        assert!(matches!(
            decode(layout, &[0u8; 7], 7),
            Err(DecodeError::LengthMismatch {
                expected: 8,
                actual: 7,
                ..
            })
        ));
        assert!(matches!(
            decode(layout, &[0u8; 9], 9),
            Err(DecodeError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn wrong_field_count() {
        let table = table();
        let err = encode(table.get(1001).unwrap(), &[Value::from(1u32)]).unwrap_err();
        assert_eq!(
            err,
            EncodeError::FieldCount {
                message_id: 1001,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn out_of_range_value() {
        let table = table();
        let layout = table.get(1210).unwrap();
        let mut values = vec![Value::from(0u16); 4];
        values.push(Value::Unsigned(256));
        values.push(Value::from(0u8));

        let err = encode(layout, &values).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::OutOfRange { value: 256, field_type: FieldType::U8, ref field, .. }
                if field == "gain_setting"
        ));
    }

    #[test]
    fn type_mismatch() {
        let table = table();
        let err = encode(
            table.get(42).unwrap(),
            &[Value::Unsigned(1), Value::from(1u8)],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EncodeError::TypeMismatch {
                expected: FieldType::Char,
                actual: "unsigned",
                ..
            }
        ));

        let err = encode(
            table.get(1001).unwrap(),
            &[Value::from(vec![1u8]), Value::from(1u32)],
        )
        .unwrap_err();
        assert!(matches!(err, EncodeError::TypeMismatch { .. }));
    }
}
