//! Wraps fields into single-field structs.

use crate::error::CodecError;
use crate::model::{Field, FieldPath, StructType, StructValue, Type, Value};
use crate::modifier::field::{FieldModifier, FieldRule};
use crate::modifier::validate_field_name;

/// Replaces a field of type `T` with `struct { <name> T }`.
pub type WrapperModifier = FieldModifier<WrapRule>;

#[derive(Debug, Default)]
pub struct WrapRule;

impl FieldRule for WrapRule {
    /// Name of the field inside the wrapper struct.
    type Change = String;
    type Resolved = String;

    const NAME: &'static str = "wrapper";

    fn retype_field(&self, field: &Field, inner: &String, _path: &FieldPath) -> Result<(Option<Field>, String), CodecError> {
        let wrapped = Type::Struct(StructType::new([(inner.clone(), field.ty.clone())]));
        Ok((Some(Field::new(field.name.clone(), wrapped)), inner.clone()))
    }

    fn value_to_off_chain(&self, value: Option<Value>, inner: &String) -> Result<Option<Value>, CodecError> {
        Ok(value.map(|v| Value::Struct(StructValue::new().with(inner.clone(), v))))
    }

    fn value_to_on_chain(&self, value: Option<Value>, inner: &String) -> Result<Option<Value>, CodecError> {
        match value {
            Some(Value::Struct(mut sv)) => Ok(sv.take(inner)),
            Some(other) => Err(CodecError::TypeMismatch {
                at: "value".to_string(),
                expected: format!("struct {{ {} }}", inner),
                found: other.describe(),
            }),
            None => Ok(None),
        }
    }
}

impl FieldModifier<WrapRule> {
    /// Builds the modifier from `(field path, wrapper field name)` pairs.
    pub fn new<I, K, V>(fields: I) -> Result<Self, CodecError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut changes = Vec::new();
        for (path, inner) in fields {
            let inner = inner.into();
            validate_field_name(&inner)?;
            changes.push((FieldPath::parse(path.as_ref())?, inner));
        }
        Ok(FieldModifier::from_rule(WrapRule, changes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::Modifier;

    #[test]
    fn test_wrap_round_trip() {
        let on = Type::slice(Type::structure([("Amount", Type::uint(64)), ("Memo", Type::String)]));
        let mut wrapper = WrapperModifier::new([("Amount", "Value")]).unwrap();
        let off = wrapper.retype_to_off_chain(&on, "Item").unwrap();
        assert_eq!(
            off,
            Type::slice(Type::structure([
                ("Amount", Type::structure([("Value", Type::uint(64))])),
                ("Memo", Type::String),
            ]))
        );

        let value = Value::Slice(vec![Value::Struct(StructValue::new().with("Amount", 5u64).with("Memo", "m"))]);
        let off_value = wrapper.transform_to_off_chain(value.clone(), "Item").unwrap();
        assert_eq!(
            off_value,
            Value::Slice(vec![Value::Struct(
                StructValue::new()
                    .with("Amount", StructValue::new().with("Value", 5u64))
                    .with("Memo", "m")
            )])
        );
        assert_eq!(wrapper.transform_to_on_chain(off_value, "Item").unwrap(), value);
    }

    #[test]
    fn test_wrapper_name_is_validated() {
        assert!(WrapperModifier::new([("Amount", "")]).is_err());
        assert!(WrapperModifier::new([("Amount", "A.B")]).is_err());
    }
}
