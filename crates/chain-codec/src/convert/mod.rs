//! Structural conversion between compatible shapes.
//!
//! [`convert`] copies a value into a target [`Type`]:
//!
//! - struct fields are matched by name (exact first, then ASCII
//!   case-insensitive), missing fields become zero, unknown fields are ignored
//! - pointers are dereferenced or allocated as needed, nil becomes zero
//! - arrays require the same element count, slices take any length
//! - scalars that do not line up are handed to the [`DecodeHooks`] chain

pub mod hooks;

pub use hooks::{DecodeHook, DecodeHooks};

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value as JsonValue;

use crate::error::CodecError;
use crate::model::{StructType, StructValue, Type, Value};

/// Converts `from` into the shape `to`.
pub fn convert(from: &Value, to: &Type, hooks: &DecodeHooks) -> Result<Value, CodecError> {
    if from.check(to).is_ok() {
        return Ok(from.clone());
    }
    convert_value(from, to, hooks)
}

fn convert_value(from: &Value, to: &Type, hooks: &DecodeHooks) -> Result<Value, CodecError> {
    match (to, from) {
        (Type::Pointer(_), Value::Pointer(None)) => Ok(Value::Pointer(None)),
        (Type::Pointer(inner), Value::Pointer(Some(v))) => {
            Ok(Value::pointer(convert_value(v, inner, hooks)?))
        }
        (Type::Pointer(inner), v) => Ok(Value::pointer(convert_value(v, inner, hooks)?)),
        (_, Value::Pointer(None)) => Ok(to.zero_value()),
        (_, Value::Pointer(Some(v))) => convert_value(v, to, hooks),
        (Type::Array(elem, len), Value::Slice(items) | Value::Array(items)) => {
            if items.len() != *len {
                return Err(CodecError::SliceWrongLen {
                    expected: *len,
                    found: items.len(),
                });
            }
            Ok(Value::Array(convert_items(items, elem, hooks)?))
        }
        (Type::Slice(elem), Value::Slice(items) | Value::Array(items)) => {
            Ok(Value::Slice(convert_items(items, elem, hooks)?))
        }
        (Type::Struct(st), Value::Struct(sv)) => Ok(Value::Struct(convert_struct(sv, st, hooks)?)),
        _ => convert_scalar(from, to, hooks),
    }
}

fn convert_items(items: &[Value], elem: &Type, hooks: &DecodeHooks) -> Result<Vec<Value>, CodecError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            convert_value(item, elem, hooks).map_err(|e| e.context(format!("element {}", i)))
        })
        .collect()
}

fn convert_struct(sv: &StructValue, st: &StructType, hooks: &DecodeHooks) -> Result<StructValue, CodecError> {
    let mut out = StructValue::new();
    for field in &st.fields {
        let source = sv.get(&field.name).or_else(|| {
            sv.fields
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(&field.name))
                .map(|(_, v)| v)
        });
        let value = match source {
            Some(v) => convert_value(v, &field.ty, hooks)
                .map_err(|e| e.context(format!("field {}", field.name)))?,
            None => field.ty.zero_value(),
        };
        out.push(field.name.clone(), value);
    }
    Ok(out)
}

fn convert_scalar(from: &Value, to: &Type, hooks: &DecodeHooks) -> Result<Value, CodecError> {
    if from.check(to).is_ok() {
        return Ok(from.clone());
    }
    match hooks.apply(from, to)? {
        Some(value) => {
            value.check(to)?;
            Ok(value)
        }
        None => Err(CodecError::TypeMismatch {
            at: "value".to_string(),
            expected: to.to_string(),
            found: from.describe(),
        }),
    }
}

/// Reads JSON without a target type.
///
/// Integers become `Int` (or `Uint` above `i64::MAX`), arrays become slices,
/// objects become structs in key order and `null` becomes a nil pointer.
/// Non-integer numbers are rejected.
pub fn untyped_from_json(json: &JsonValue) -> Result<Value, CodecError> {
    let value = match json {
        JsonValue::Null => Value::Pointer(None),
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(u) = n.as_u64() {
                Value::Uint(u)
            } else {
                return Err(CodecError::Conversion {
                    from: format!("number {}", n),
                    to: "integer".to_string(),
                    reason: "only integers are supported".to_string(),
                });
            }
        }
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Array(items) => Value::Slice(
            items
                .iter()
                .map(untyped_from_json)
                .collect::<Result<_, _>>()?,
        ),
        JsonValue::Object(map) => {
            let mut sv = StructValue::new();
            for (name, item) in map {
                sv.push(name.clone(), untyped_from_json(item)?);
            }
            Value::Struct(sv)
        }
    };
    Ok(value)
}

/// Reads JSON into the shape `to`.
pub fn from_json(json: &JsonValue, to: &Type, hooks: &DecodeHooks) -> Result<Value, CodecError> {
    convert(&untyped_from_json(json)?, to, hooks)
}

/// Writes a value as JSON (see the `Serialize` impl on [`Value`]).
pub fn to_json(value: &Value) -> Result<JsonValue, CodecError> {
    serde_json::to_value(value).map_err(|e| CodecError::Conversion {
        from: value.describe(),
        to: "json".to_string(),
        reason: e.to_string(),
    })
}

/// Writes a value as JSON for deserializing into caller types. Unlike
/// [`to_json`], bytes become arrays of numbers, which is what `Vec<u8>` and
/// `[u8; N]` fields expect.
pub fn to_serde_json(value: &Value) -> Result<JsonValue, CodecError> {
    serde_json::to_value(SerdeView(value)).map_err(|e| CodecError::Conversion {
        from: value.describe(),
        to: "json".to_string(),
        reason: e.to_string(),
    })
}

struct SerdeView<'a>(&'a Value);

impl Serialize for SerdeView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Bytes(v) => serializer.serialize_bytes(v),
            Value::Pointer(None) => serializer.serialize_none(),
            Value::Pointer(Some(inner)) => SerdeView(inner).serialize(serializer),
            Value::Slice(items) | Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&SerdeView(item))?;
                }
                seq.end()
            }
            Value::Struct(sv) => {
                let mut map = serializer.serialize_map(Some(sv.fields.len()))?;
                for (name, item) in &sv.fields {
                    map.serialize_entry(name, &SerdeView(item))?;
                }
                map.end()
            }
            scalar => scalar.serialize(serializer),
        }
    }
}
