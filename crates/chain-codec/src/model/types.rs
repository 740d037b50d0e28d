//! Shape descriptions for on-chain and off-chain values.
//!
//! A [`Type`] is the explicit stand-in for a runtime struct type: modifiers
//! read an on-chain `Type` and build a new off-chain `Type` from it field by
//! field, instead of synthesizing native structs.

use std::fmt;

use alloy_primitives::{I256, U256};
use chrono::{DateTime, Utc};

use crate::model::value::{StructValue, Value};

/// The shape of a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Bool,
    /// Native integer of at most 64 bits.
    Int { signed: bool, bits: u16 },
    /// 256-bit integer.
    BigInt { signed: bool },
    String,
    Bytes,
    /// UTC timestamp with second precision.
    Timestamp,
    Struct(StructType),
    /// Nullable indirection.
    Pointer(Box<Type>),
    /// Variable-length sequence.
    Slice(Box<Type>),
    /// Fixed-length sequence.
    Array(Box<Type>, usize),
}

impl Type {
    /// Signed native integer of the given width.
    pub fn int(bits: u16) -> Type {
        Type::Int { signed: true, bits }
    }

    /// Unsigned native integer of the given width.
    pub fn uint(bits: u16) -> Type {
        Type::Int { signed: false, bits }
    }

    pub fn big_int() -> Type {
        Type::BigInt { signed: true }
    }

    pub fn big_uint() -> Type {
        Type::BigInt { signed: false }
    }

    pub fn pointer(inner: Type) -> Type {
        Type::Pointer(Box::new(inner))
    }

    pub fn slice(elem: Type) -> Type {
        Type::Slice(Box::new(elem))
    }

    pub fn array(elem: Type, len: usize) -> Type {
        Type::Array(Box::new(elem), len)
    }

    /// Struct type from `(name, type)` pairs, in order.
    pub fn structure<I, S>(fields: I) -> Type
    where
        I: IntoIterator<Item = (S, Type)>,
        S: Into<String>,
    {
        Type::Struct(StructType::new(fields))
    }

    /// Returns the struct type if this is a struct.
    pub fn as_struct(&self) -> Option<&StructType> {
        match self {
            Type::Struct(st) => Some(st),
            _ => None,
        }
    }

    /// Returns true for native and big integers.
    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Int { .. } | Type::BigInt { .. })
    }

    /// Returns true for pointer, slice and array types.
    pub fn is_wrapper(&self) -> bool {
        matches!(self, Type::Pointer(_) | Type::Slice(_) | Type::Array(..))
    }

    /// Peels pointer, slice and array wrappers.
    pub fn innermost(&self) -> &Type {
        match self {
            Type::Pointer(inner) | Type::Slice(inner) | Type::Array(inner, _) => inner.innermost(),
            other => other,
        }
    }

    /// Rebuilds the same wrappers around `replacement` in place of the innermost type.
    pub fn replace_innermost(&self, replacement: Type) -> Type {
        match self {
            Type::Pointer(inner) => Type::pointer(inner.replace_innermost(replacement)),
            Type::Slice(inner) => Type::slice(inner.replace_innermost(replacement)),
            Type::Array(inner, len) => Type::array(inner.replace_innermost(replacement), *len),
            _ => replacement,
        }
    }

    /// Returns the zero value of this type. Pointers are nil.
    pub fn zero_value(&self) -> Value {
        match self {
            Type::Bool => Value::Bool(false),
            Type::Int { signed: true, .. } => Value::Int(0),
            Type::Int { signed: false, .. } => Value::Uint(0),
            Type::BigInt { signed: true } => Value::BigInt(I256::ZERO),
            Type::BigInt { signed: false } => Value::BigUint(U256::ZERO),
            Type::String => Value::String(String::new()),
            Type::Bytes => Value::Bytes(Vec::new()),
            Type::Timestamp => Value::Timestamp(DateTime::<Utc>::default()),
            Type::Struct(st) => Value::Struct(st.zero_value()),
            Type::Pointer(_) => Value::Pointer(None),
            Type::Slice(_) => Value::Slice(Vec::new()),
            Type::Array(elem, len) => Value::Array(vec![elem.zero_value(); *len]),
        }
    }

    /// Returns a fresh value of this type with a top-level pointer allocated.
    pub fn new_value(&self) -> Value {
        match self {
            Type::Pointer(inner) => Value::pointer(inner.zero_value()),
            other => other.zero_value(),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Bool => write!(f, "bool"),
            Type::Int { signed: true, bits } => write!(f, "int{}", bits),
            Type::Int { signed: false, bits } => write!(f, "uint{}", bits),
            Type::BigInt { signed: true } => write!(f, "int256"),
            Type::BigInt { signed: false } => write!(f, "uint256"),
            Type::String => write!(f, "string"),
            Type::Bytes => write!(f, "bytes"),
            Type::Timestamp => write!(f, "timestamp"),
            Type::Struct(st) => write!(f, "{}", st),
            Type::Pointer(inner) => write!(f, "*{}", inner),
            Type::Slice(inner) => write!(f, "[]{}", inner),
            Type::Array(inner, len) => write!(f, "[{}]{}", len, inner),
        }
    }
}

/// A named, typed struct member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub ty: Type,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// An ordered list of fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StructType {
    pub fields: Vec<Field>,
}

impl StructType {
    /// Creates a struct type from `(name, type)` pairs, in order.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Type)>,
        S: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(name, ty)| Field::new(name, ty))
                .collect(),
        }
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the struct has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Looks up a field by name for modification.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    /// Returns the position of a field.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Returns the first field name that occurs more than once.
    pub fn duplicate_name(&self) -> Option<&str> {
        self.fields.iter().enumerate().find_map(|(i, f)| {
            self.fields[..i]
                .iter()
                .any(|prev| prev.name == f.name)
                .then_some(f.name.as_str())
        })
    }

    /// Returns a struct value holding the zero value of every field.
    pub fn zero_value(&self) -> StructValue {
        StructValue {
            fields: self
                .fields
                .iter()
                .map(|f| (f.name.clone(), f.ty.zero_value()))
                .collect(),
        }
    }
}

impl fmt::Display for StructType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "struct {{")?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ";")?;
            }
            write!(f, " {} {}", field.name, field.ty)?;
        }
        write!(f, " }}")
    }
}
