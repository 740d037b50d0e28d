//! Slice and array fields reduced to a single element.
//!
//! Going back on-chain a slice becomes a one-element slice and an array of
//! length N gets the element at its configured location with every other
//! element zero.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::error::CodecError;
use crate::model::{Field, FieldPath, Type, Value};
use crate::modifier::field::{FieldModifier, FieldRule};

/// Which element an [`ElementExtractor`] keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementLocation {
    /// Index 0.
    First,
    /// Index `len / 2`.
    Middle,
    /// Index `len - 1`.
    Last,
}

impl ElementLocation {
    /// Index of the element for a non-empty sequence of length `len`.
    pub fn index(self, len: usize) -> usize {
        match self {
            ElementLocation::First => 0,
            ElementLocation::Middle => len / 2,
            ElementLocation::Last => len.saturating_sub(1),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ElementLocation::First => "first",
            ElementLocation::Middle => "middle",
            ElementLocation::Last => "last",
        }
    }
}

impl fmt::Display for ElementLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementLocation {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" => Ok(ElementLocation::First),
            "middle" => Ok(ElementLocation::Middle),
            "last" => Ok(ElementLocation::Last),
            _ => Err(CodecError::InvalidLocation {
                location: s.to_string(),
            }),
        }
    }
}

impl Serialize for ElementLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ElementLocation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Replaces slice and array fields with one of their elements.
pub type ElementExtractor = FieldModifier<ExtractElementRule>;

#[derive(Debug, Default)]
pub struct ExtractElementRule;

#[derive(Debug)]
pub struct ResolvedExtraction {
    location: ElementLocation,
    element: Type,
    /// Set when the on-chain field is a fixed-size array.
    array_len: Option<usize>,
}

impl FieldRule for ExtractElementRule {
    type Change = ElementLocation;
    type Resolved = ResolvedExtraction;

    const NAME: &'static str = "extract element";

    fn retype_field(
        &self,
        field: &Field,
        location: &ElementLocation,
        path: &FieldPath,
    ) -> Result<(Option<Field>, ResolvedExtraction), CodecError> {
        let (element, array_len) = match &field.ty {
            Type::Slice(elem) => ((**elem).clone(), None),
            Type::Array(elem, len) => {
                if *len > 1 {
                    warn!(field = %path, len, "array field keeps one element when converted back on-chain");
                }
                ((**elem).clone(), Some(*len))
            }
            other => {
                return Err(CodecError::UnsupportedField {
                    path: path.to_string(),
                    found: other.to_string(),
                    expected: "a slice or array",
                });
            }
        };
        let resolved = ResolvedExtraction {
            location: *location,
            element: element.clone(),
            array_len,
        };
        Ok((Some(Field::new(field.name.clone(), element)), resolved))
    }

    fn value_to_off_chain(
        &self,
        value: Option<Value>,
        resolved: &ResolvedExtraction,
    ) -> Result<Option<Value>, CodecError> {
        let Some(value) = value else {
            return Ok(None);
        };
        let items = match value {
            Value::Slice(items) | Value::Array(items) => items,
            other => {
                return Err(CodecError::TypeMismatch {
                    at: "value".to_string(),
                    expected: "a slice or array".to_string(),
                    found: other.describe(),
                });
            }
        };
        if items.is_empty() {
            return Ok(Some(resolved.element.zero_value()));
        }
        let index = resolved.location.index(items.len());
        Ok(items.into_iter().nth(index))
    }

    fn value_to_on_chain(
        &self,
        value: Option<Value>,
        resolved: &ResolvedExtraction,
    ) -> Result<Option<Value>, CodecError> {
        let Some(value) = value else {
            return Ok(None);
        };
        let rebuilt = match resolved.array_len {
            None => Value::Slice(vec![value]),
            Some(0) => Value::Array(Vec::new()),
            Some(len) => {
                let mut items = vec![resolved.element.zero_value(); len];
                items[resolved.location.index(len)] = value;
                Value::Array(items)
            }
        };
        Ok(Some(rebuilt))
    }
}

impl FieldModifier<ExtractElementRule> {
    /// Builds an extractor from `(field path, location)` pairs.
    pub fn new<I, K>(extractions: I) -> Result<Self, CodecError>
    where
        I: IntoIterator<Item = (K, ElementLocation)>,
        K: AsRef<str>,
    {
        let changes = extractions
            .into_iter()
            .map(|(path, location)| FieldPath::parse(path.as_ref()).map(|p| (p, location)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FieldModifier::from_rule(ExtractElementRule, changes))
    }
}
