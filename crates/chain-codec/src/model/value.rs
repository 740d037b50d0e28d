//! Dynamic values for on-chain and off-chain shapes.
//!
//! A [`Value`] is checked against a [`Type`] with [`Value::check`]; every
//! modifier transform checks its input this way before touching it.

use alloy_primitives::{hex, I256, U256};
use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::error::CodecError;
use crate::model::types::{StructType, Type};
use crate::util::datetime::format_timestamp;

/// A value of some [`Type`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    /// Signed native integer.
    Int(i64),
    /// Unsigned native integer.
    Uint(u64),
    BigInt(I256),
    BigUint(U256),
    String(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    Struct(StructValue),
    /// `None` is a nil pointer.
    Pointer(Option<Box<Value>>),
    Slice(Vec<Value>),
    Array(Vec<Value>),
}

impl Value {
    /// Allocates a pointer to `value`.
    pub fn pointer(value: Value) -> Value {
        Value::Pointer(Some(Box::new(value)))
    }

    /// Returns the struct value if this is a struct.
    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(sv) => Some(sv),
            _ => None,
        }
    }

    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Value::Bool(_) => "bool".to_string(),
            Value::Int(v) => format!("int {}", v),
            Value::Uint(v) => format!("uint {}", v),
            Value::BigInt(v) => format!("int256 {}", v),
            Value::BigUint(v) => format!("uint256 {}", v),
            Value::String(_) => "string".to_string(),
            Value::Bytes(b) => format!("bytes of length {}", b.len()),
            Value::Timestamp(_) => "timestamp".to_string(),
            Value::Struct(sv) => {
                let names: Vec<&str> = sv.fields.iter().map(|(n, _)| n.as_str()).collect();
                format!("struct {{ {} }}", names.join(", "))
            }
            Value::Pointer(None) => "nil pointer".to_string(),
            Value::Pointer(Some(inner)) => format!("pointer to {}", inner.describe()),
            Value::Slice(items) => format!("slice of length {}", items.len()),
            Value::Array(items) => format!("array of length {}", items.len()),
        }
    }

    /// Verifies that this value has exactly the shape `ty`.
    pub fn check(&self, ty: &Type) -> Result<(), CodecError> {
        let mut at = String::from("value");
        self.check_at(ty, &mut at)
    }

    fn check_at(&self, ty: &Type, at: &mut String) -> Result<(), CodecError> {
        let ok = match (ty, self) {
            (Type::Bool, Value::Bool(_)) => true,
            (Type::Int { signed: true, bits }, Value::Int(v)) => fits_signed(*v as i128, *bits),
            (Type::Int { signed: false, bits }, Value::Uint(v)) => fits_unsigned(*v as u128, *bits),
            (Type::BigInt { signed: true }, Value::BigInt(_)) => true,
            (Type::BigInt { signed: false }, Value::BigUint(_)) => true,
            (Type::String, Value::String(_)) => true,
            (Type::Bytes, Value::Bytes(_)) => true,
            (Type::Timestamp, Value::Timestamp(_)) => true,
            (Type::Pointer(_), Value::Pointer(None)) => true,
            (Type::Pointer(inner), Value::Pointer(Some(v))) => return v.check_at(inner, at),
            (Type::Slice(elem), Value::Slice(items)) => {
                return check_items(items, elem, at);
            }
            (Type::Array(elem, len), Value::Array(items)) => {
                if items.len() != *len {
                    return Err(CodecError::SliceWrongLen {
                        expected: *len,
                        found: items.len(),
                    });
                }
                return check_items(items, elem, at);
            }
            (Type::Struct(st), Value::Struct(sv)) => return sv.check_at(st, at),
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(CodecError::TypeMismatch {
                at: at.clone(),
                expected: ty.to_string(),
                found: self.describe(),
            })
        }
    }

    /// Applies `f` to every struct reached through pointer, slice and array
    /// wrappers, keeping the wrappers. Nil pointers stay nil.
    pub fn map_structs<F>(self, f: &mut F) -> Result<Value, CodecError>
    where
        F: FnMut(StructValue) -> Result<Value, CodecError>,
    {
        match self {
            Value::Struct(sv) => f(sv),
            Value::Pointer(None) => Ok(Value::Pointer(None)),
            Value::Pointer(Some(inner)) => Ok(Value::pointer(inner.map_structs(f)?)),
            Value::Slice(items) => Ok(Value::Slice(map_items(items, f)?)),
            Value::Array(items) => Ok(Value::Array(map_items(items, f)?)),
            other => Err(CodecError::NotAStruct {
                at: "value".to_string(),
                found: other.describe(),
            }),
        }
    }

    /// Infers the narrowest type this value could be an instance of.
    ///
    /// Used for hard-coded literals that add new fields; empty slices and nil
    /// pointers carry no element type and are rejected.
    pub fn type_of(&self) -> Result<Type, CodecError> {
        let ty = match self {
            Value::Bool(_) => Type::Bool,
            Value::Int(_) => Type::int(64),
            Value::Uint(_) => Type::uint(64),
            Value::BigInt(_) => Type::big_int(),
            Value::BigUint(_) => Type::big_uint(),
            Value::String(_) => Type::String,
            Value::Bytes(_) => Type::Bytes,
            Value::Timestamp(_) => Type::Timestamp,
            Value::Struct(sv) => {
                let mut fields = Vec::with_capacity(sv.fields.len());
                for (name, value) in &sv.fields {
                    fields.push((name.clone(), value.type_of()?));
                }
                Type::structure(fields)
            }
            Value::Pointer(Some(inner)) => Type::pointer(inner.type_of()?),
            Value::Slice(items) => Type::slice(element_type(items, self)?),
            Value::Array(items) => Type::array(element_type(items, self)?, items.len()),
            Value::Pointer(None) => {
                return Err(CodecError::Conversion {
                    from: self.describe(),
                    to: "a typed value".to_string(),
                    reason: "nil has no type".to_string(),
                });
            }
        };
        Ok(ty)
    }
}

fn fits_signed(v: i128, bits: u16) -> bool {
    if bits >= 64 {
        return v >= i64::MIN as i128 && v <= i64::MAX as i128;
    }
    let half = 1i128 << (bits.max(1) - 1);
    v >= -half && v < half
}

fn fits_unsigned(v: u128, bits: u16) -> bool {
    if bits >= 64 {
        return v <= u64::MAX as u128;
    }
    v < (1u128 << bits)
}

/// Returns true if `v` is representable by the native integer type `signed`/`bits`.
pub(crate) fn fits_native(v: i128, signed: bool, bits: u16) -> bool {
    if signed {
        fits_signed(v, bits)
    } else {
        v >= 0 && fits_unsigned(v as u128, bits)
    }
}

fn check_items(items: &[Value], elem: &Type, at: &mut String) -> Result<(), CodecError> {
    let base = at.len();
    for (i, item) in items.iter().enumerate() {
        at.push_str(&format!("[{}]", i));
        item.check_at(elem, at)?;
        at.truncate(base);
    }
    Ok(())
}

fn map_items<F>(items: Vec<Value>, f: &mut F) -> Result<Vec<Value>, CodecError>
where
    F: FnMut(StructValue) -> Result<Value, CodecError>,
{
    items.into_iter().map(|item| item.map_structs(f)).collect()
}

fn element_type(items: &[Value], whole: &Value) -> Result<Type, CodecError> {
    match items.first() {
        Some(first) => first.type_of(),
        None => Err(CodecError::Conversion {
            from: whole.describe(),
            to: "a typed value".to_string(),
            reason: "empty sequence has no element type".to_string(),
        }),
    }
}

/// Field values of a struct, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructValue {
    pub fields: Vec<(String, Value)>,
}

impl StructValue {
    /// Creates an empty struct value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field (builder style).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Looks up a field value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Looks up a field value by name for modification.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Removes a field and returns its value.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        let pos = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(pos).1)
    }

    /// Replaces a field value, or appends the field if it is absent.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.get_mut(&name) {
            Some(slot) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Appends a field without looking for an existing one.
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.fields.push((name.into(), value));
    }

    /// Rewrites a field value in place. Returns false if the field is absent.
    pub fn map_field<F>(&mut self, name: &str, f: F) -> Result<bool, CodecError>
    where
        F: FnOnce(Value) -> Result<Value, CodecError>,
    {
        let Some(slot) = self.get_mut(name) else {
            return Ok(false);
        };
        let value = std::mem::replace(slot, Value::Bool(false));
        *slot = f(value)?;
        Ok(true)
    }

    /// Rebuilds this value in the field order of `st`.
    ///
    /// Fields missing from `self` get their zero value; fields not in `st`
    /// are discarded.
    pub fn conform_to(mut self, st: &StructType) -> StructValue {
        let fields = st
            .fields
            .iter()
            .map(|f| {
                let value = self.take(&f.name).unwrap_or_else(|| f.ty.zero_value());
                (f.name.clone(), value)
            })
            .collect();
        StructValue { fields }
    }

    fn check_at(&self, st: &StructType, at: &mut String) -> Result<(), CodecError> {
        let names_match = self.fields.len() == st.fields.len()
            && self
                .fields
                .iter()
                .zip(&st.fields)
                .all(|((name, _), field)| *name == field.name);
        if !names_match {
            return Err(CodecError::TypeMismatch {
                at: at.clone(),
                expected: st.to_string(),
                found: Value::Struct(self.clone()).describe(),
            });
        }
        let base = at.len();
        for ((name, value), field) in self.fields.iter().zip(&st.fields) {
            at.push('.');
            at.push_str(name);
            value.check_at(&field.ty, at)?;
            at.truncate(base);
        }
        Ok(())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(v)
    }
}

impl From<I256> for Value {
    fn from(v: I256) -> Self {
        Value::BigInt(v)
    }
}

impl From<U256> for Value {
    fn from(v: U256) -> Self {
        Value::BigUint(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<StructValue> for Value {
    fn from(v: StructValue) -> Self {
        Value::Struct(v)
    }
}

/// JSON view of a value: big integers become numbers when they fit in 64
/// bits and decimal strings otherwise, bytes become `0x` hex, timestamps
/// become RFC 3339 strings, nil pointers become `null`.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::Uint(v) => serializer.serialize_u64(*v),
            Value::BigInt(v) => match i64::try_from(*v) {
                Ok(small) => serializer.serialize_i64(small),
                Err(_) => serializer.serialize_str(&v.to_string()),
            },
            Value::BigUint(v) => match u64::try_from(*v) {
                Ok(small) => serializer.serialize_u64(small),
                Err(_) => serializer.serialize_str(&v.to_string()),
            },
            Value::String(v) => serializer.serialize_str(v),
            Value::Bytes(v) => serializer.serialize_str(&hex::encode_prefixed(v)),
            Value::Timestamp(v) => serializer.serialize_str(&format_timestamp(v)),
            Value::Struct(sv) => sv.serialize(serializer),
            Value::Pointer(None) => serializer.serialize_none(),
            Value::Pointer(Some(inner)) => inner.serialize(serializer),
            Value::Slice(items) | Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for StructValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
