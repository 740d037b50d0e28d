//! Decode hooks: scalar coercions applied when shapes do not line up exactly.
//!
//! A hook returns `Ok(None)` when it does not handle a `(value, type)` pair,
//! so hooks can be chained. The first hook returning a value wins.

use std::fmt;

use alloy_primitives::{hex, I256, U256};

use crate::error::CodecError;
use crate::model::value::fits_native;
use crate::model::{Type, Value};
use crate::util::datetime::{epoch_seconds, parse_timestamp, timestamp_from_epoch_seconds};

/// A single coercion step.
pub type DecodeHook = fn(&Value, &Type) -> Result<Option<Value>, CodecError>;

/// An ordered chain of [`DecodeHook`]s.
#[derive(Clone)]
pub struct DecodeHooks {
    hooks: Vec<DecodeHook>,
}

impl DecodeHooks {
    /// No coercions: only exact shapes convert.
    pub fn none() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Integer widening/narrowing, epoch timestamps, numeric strings and hex bytes.
    pub fn standard() -> Self {
        Self {
            hooks: vec![integer_hook, timestamp_hook, numeric_string_hook, bytes_hook],
        }
    }

    /// Adds a hook that runs before the existing ones.
    pub fn with_hook(mut self, hook: DecodeHook) -> Self {
        self.hooks.insert(0, hook);
        self
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Runs the chain until a hook produces a value.
    pub fn apply(&self, from: &Value, to: &Type) -> Result<Option<Value>, CodecError> {
        for hook in &self.hooks {
            if let Some(value) = hook(from, to)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

impl Default for DecodeHooks {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for DecodeHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeHooks")
            .field("len", &self.hooks.len())
            .finish()
    }
}

fn is_integer_value(value: &Value) -> bool {
    matches!(
        value,
        Value::Int(_) | Value::Uint(_) | Value::BigInt(_) | Value::BigUint(_)
    )
}

/// Converts any integer value to the integer type `to`, failing on overflow.
pub(crate) fn integer_to(from: &Value, to: &Type) -> Result<Value, CodecError> {
    let overflow = || CodecError::Overflow {
        value: from.describe(),
        target: to.to_string(),
    };
    match *to {
        Type::Int { signed, bits } => {
            let v: i128 = match from {
                Value::Int(i) => *i as i128,
                Value::Uint(u) => *u as i128,
                Value::BigInt(b) => i128::try_from(*b).map_err(|_| overflow())?,
                Value::BigUint(u) => u128::try_from(*u)
                    .ok()
                    .and_then(|u| i128::try_from(u).ok())
                    .ok_or_else(overflow)?,
                _ => return Err(not_an_integer(from, to)),
            };
            if !fits_native(v, signed, bits) {
                return Err(overflow());
            }
            Ok(if signed {
                Value::Int(v as i64)
            } else {
                Value::Uint(v as u64)
            })
        }
        Type::BigInt { signed: true } => {
            let v = match from {
                Value::Int(i) => I256::try_from(*i).ok(),
                Value::Uint(u) => I256::try_from(*u).ok(),
                Value::BigInt(b) => Some(*b),
                Value::BigUint(u) => I256::try_from(*u).ok(),
                _ => return Err(not_an_integer(from, to)),
            };
            v.map(Value::BigInt).ok_or_else(overflow)
        }
        Type::BigInt { signed: false } => {
            let v = match from {
                Value::Int(i) => u64::try_from(*i).ok().map(U256::from),
                Value::Uint(u) => Some(U256::from(*u)),
                Value::BigInt(b) => U256::try_from(*b).ok(),
                Value::BigUint(u) => Some(*u),
                _ => return Err(not_an_integer(from, to)),
            };
            v.map(Value::BigUint).ok_or_else(overflow)
        }
        _ => Err(not_an_integer(from, to)),
    }
}

/// Reads any integer value as an `i64`.
pub(crate) fn integer_as_i64(from: &Value) -> Result<i64, CodecError> {
    match integer_to(from, &Type::int(64))? {
        Value::Int(v) => Ok(v),
        other => Err(not_an_integer(&other, &Type::int(64))),
    }
}

fn not_an_integer(from: &Value, to: &Type) -> CodecError {
    CodecError::Conversion {
        from: from.describe(),
        to: to.to_string(),
        reason: "not an integer".to_string(),
    }
}

/// Native ⇄ big integer conversion with overflow checks.
pub fn integer_hook(from: &Value, to: &Type) -> Result<Option<Value>, CodecError> {
    if !to.is_integer() || !is_integer_value(from) {
        return Ok(None);
    }
    integer_to(from, to).map(Some)
}

/// Epoch seconds and RFC 3339 strings to timestamps, and timestamps back to epoch seconds.
pub fn timestamp_hook(from: &Value, to: &Type) -> Result<Option<Value>, CodecError> {
    match (to, from) {
        (Type::Timestamp, Value::String(s)) => parse_timestamp(s).map(|ts| Some(Value::Timestamp(ts))),
        (Type::Timestamp, v) if is_integer_value(v) => {
            let secs = integer_as_i64(v)?;
            Ok(Some(Value::Timestamp(timestamp_from_epoch_seconds(secs)?)))
        }
        (ty, Value::Timestamp(ts)) if ty.is_integer() => {
            integer_to(&Value::Int(epoch_seconds(ts)), ty).map(Some)
        }
        _ => Ok(None),
    }
}

/// Decimal (optionally negative) or `0x` hex strings to integers.
pub fn numeric_string_hook(from: &Value, to: &Type) -> Result<Option<Value>, CodecError> {
    let Value::String(s) = from else {
        return Ok(None);
    };
    if !to.is_integer() {
        return Ok(None);
    }
    let parse_error = |reason: String| CodecError::Conversion {
        from: format!("string {:?}", s),
        to: to.to_string(),
        reason,
    };
    let trimmed = s.trim();
    let parsed = if let Some(digits) = trimmed.strip_prefix("0x") {
        U256::from_str_radix(digits, 16)
            .map(Value::BigUint)
            .map_err(|e| parse_error(e.to_string()))?
    } else if trimmed.starts_with('-') {
        I256::from_dec_str(trimmed)
            .map(Value::BigInt)
            .map_err(|e| parse_error(e.to_string()))?
    } else {
        U256::from_str_radix(trimmed, 10)
            .map(Value::BigUint)
            .map_err(|e| parse_error(e.to_string()))?
    };
    integer_to(&parsed, to).map(Some)
}

/// Hex strings and sequences of small integers to bytes.
pub fn bytes_hook(from: &Value, to: &Type) -> Result<Option<Value>, CodecError> {
    if *to != Type::Bytes {
        return Ok(None);
    }
    match from {
        Value::String(s) => hex::decode(s)
            .map(|b| Some(Value::Bytes(b)))
            .map_err(|e| CodecError::Conversion {
                from: format!("string {:?}", s),
                to: "bytes".to_string(),
                reason: e.to_string(),
            }),
        Value::Slice(items) | Value::Array(items) => {
            let mut bytes = Vec::with_capacity(items.len());
            for item in items {
                match integer_to(item, &Type::uint(8))? {
                    Value::Uint(b) => bytes.push(b as u8),
                    other => return Err(not_an_integer(&other, &Type::uint(8))),
                }
            }
            Ok(Some(Value::Bytes(bytes)))
        }
        _ => Ok(None),
    }
}
