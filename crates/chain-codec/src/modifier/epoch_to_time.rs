//! Integer epoch seconds as timestamps.
//!
//! Integer fields become `*timestamp`; slices and arrays of integers become
//! `[]*timestamp`. A nil timestamp goes back on-chain as 0.

use crate::convert::hooks::{integer_as_i64, integer_to};
use crate::error::CodecError;
use crate::model::{Field, FieldPath, Type, Value};
use crate::modifier::field::{FieldModifier, FieldRule};
use crate::util::datetime::{epoch_seconds, timestamp_from_epoch_seconds};

/// Converts integer epoch fields to and from timestamps.
pub type EpochToTimeModifier = FieldModifier<EpochToTimeRule>;

#[derive(Debug, Default)]
pub struct EpochToTimeRule;

fn timestamp_type() -> Type {
    Type::pointer(Type::Timestamp)
}

fn to_timestamp(value: &Value) -> Result<Value, CodecError> {
    let secs = integer_as_i64(value)?;
    Ok(Value::pointer(Value::Timestamp(timestamp_from_epoch_seconds(secs)?)))
}

fn from_timestamp(value: &Value, ty: &Type) -> Result<Value, CodecError> {
    match value {
        Value::Pointer(None) => integer_to(&Value::Int(0), ty),
        Value::Pointer(Some(inner)) => from_timestamp(inner, ty),
        Value::Timestamp(ts) => integer_to(&Value::Int(epoch_seconds(ts)), ty),
        other => Err(CodecError::TypeMismatch {
            at: "value".to_string(),
            expected: "*timestamp".to_string(),
            found: other.describe(),
        }),
    }
}

fn sequence(value: Value) -> Result<Vec<Value>, CodecError> {
    match value {
        Value::Slice(items) | Value::Array(items) => Ok(items),
        other => Err(CodecError::TypeMismatch {
            at: "value".to_string(),
            expected: "a slice or array".to_string(),
            found: other.describe(),
        }),
    }
}

impl FieldRule for EpochToTimeRule {
    type Change = ();
    /// The on-chain field type.
    type Resolved = Type;

    const NAME: &'static str = "epoch to time";

    fn retype_field(&self, field: &Field, _: &(), path: &FieldPath) -> Result<(Option<Field>, Type), CodecError> {
        let off = match &field.ty {
            ty if ty.is_integer() => timestamp_type(),
            Type::Slice(elem) | Type::Array(elem, _) if elem.is_integer() => Type::slice(timestamp_type()),
            other => {
                return Err(CodecError::UnsupportedField {
                    path: path.to_string(),
                    found: other.to_string(),
                    expected: "an integer or a slice or array of integers",
                });
            }
        };
        Ok((Some(Field::new(field.name.clone(), off)), field.ty.clone()))
    }

    fn value_to_off_chain(&self, value: Option<Value>, on: &Type) -> Result<Option<Value>, CodecError> {
        let Some(value) = value else {
            return Ok(None);
        };
        let converted = match on {
            Type::Slice(_) | Type::Array(..) => Value::Slice(
                sequence(value)?
                    .iter()
                    .map(to_timestamp)
                    .collect::<Result<_, _>>()?,
            ),
            _ => to_timestamp(&value)?,
        };
        Ok(Some(converted))
    }

    fn value_to_on_chain(&self, value: Option<Value>, on: &Type) -> Result<Option<Value>, CodecError> {
        let Some(value) = value else {
            return Ok(None);
        };
        let converted = match on {
            Type::Array(elem, len) => {
                let items = sequence(value)?;
                if items.len() != *len {
                    return Err(CodecError::SliceWrongLen {
                        expected: *len,
                        found: items.len(),
                    });
                }
                Value::Array(
                    items
                        .iter()
                        .map(|item| from_timestamp(item, elem))
                        .collect::<Result<_, _>>()?,
                )
            }
            Type::Slice(elem) => Value::Slice(
                sequence(value)?
                    .iter()
                    .map(|item| from_timestamp(item, elem))
                    .collect::<Result<_, _>>()?,
            ),
            ty => from_timestamp(&value, ty)?,
        };
        Ok(Some(converted))
    }
}

impl FieldModifier<EpochToTimeRule> {
    /// Builds the modifier from the paths of integer epoch fields.
    pub fn new<I, K>(fields: I) -> Result<Self, CodecError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let changes = fields
            .into_iter()
            .map(|path| FieldPath::parse(path.as_ref()).map(|p| (p, ())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FieldModifier::from_rule(EpochToTimeRule, changes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::StructValue;
    use crate::modifier::Modifier;
    use crate::util::datetime::parse_timestamp;
    use alloy_primitives::U256;
    use proptest::prelude::*;

    fn on_type() -> Type {
        Type::structure([
            ("Ts", Type::uint(64)),
            ("Big", Type::big_int()),
            ("Many", Type::slice(Type::int(64))),
            ("Fixed", Type::array(Type::uint(32), 2)),
            ("Other", Type::String),
        ])
    }

    fn modifier() -> EpochToTimeModifier {
        let mut m = EpochToTimeModifier::new(["Ts", "Big", "Many", "Fixed"]).unwrap();
        m.retype_to_off_chain(&on_type(), "Item").unwrap();
        m
    }

    fn ts(s: &str) -> Value {
        Value::pointer(Value::Timestamp(parse_timestamp(s).unwrap()))
    }

    #[test]
    fn test_retype() {
        let mut m = EpochToTimeModifier::new(["Ts", "Big", "Many", "Fixed"]).unwrap();
        let off = m.retype_to_off_chain(&on_type(), "Item").unwrap();
        let stamp = Type::pointer(Type::Timestamp);
        assert_eq!(
            off,
            Type::structure([
                ("Ts", stamp.clone()),
                ("Big", stamp.clone()),
                ("Many", Type::slice(stamp.clone())),
                ("Fixed", Type::slice(stamp)),
                ("Other", Type::String),
            ])
        );
    }

    #[test]
    fn test_rejects_non_integer_field() {
        let mut m = EpochToTimeModifier::new(["Other"]).unwrap();
        let err = m.retype_to_off_chain(&on_type(), "Item").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
    }

    #[test]
    fn test_transform_both_ways() {
        let m = modifier();
        let on = Value::Struct(
            StructValue::new()
                .with("Ts", 1_710_513_000u64)
                .with("Big", Value::BigInt(alloy_primitives::I256::try_from(86_400i64).unwrap()))
                .with("Many", Value::Slice(vec![Value::Int(0), Value::Int(60)]))
                .with("Fixed", Value::Array(vec![Value::Uint(1), Value::Uint(2)]))
                .with("Other", "x"),
        );
        let off = m.transform_to_off_chain(on.clone(), "Item").unwrap();
        assert_eq!(
            off,
            Value::Struct(
                StructValue::new()
                    .with("Ts", ts("2024-03-15T14:30:00Z"))
                    .with("Big", ts("1970-01-02T00:00:00Z"))
                    .with("Many", Value::Slice(vec![ts("1970-01-01T00:00:00Z"), ts("1970-01-01T00:01:00Z")]))
                    .with("Fixed", Value::Slice(vec![ts("1970-01-01T00:00:01Z"), ts("1970-01-01T00:00:02Z")]))
                    .with("Other", "x")
            )
        );
        assert_eq!(m.transform_to_on_chain(off, "Item").unwrap(), on);
    }

    #[test]
    fn test_nil_timestamp_is_zero() {
        let m = modifier();
        let off = Value::Struct(
            StructValue::new()
                .with("Ts", Value::Pointer(None))
                .with("Big", Value::Pointer(None))
                .with("Many", Value::Slice(vec![Value::Pointer(None)]))
                .with("Fixed", Value::Slice(vec![Value::Pointer(None), Value::Pointer(None)]))
                .with("Other", ""),
        );
        let on = m.transform_to_on_chain(off, "Item").unwrap();
        let Value::Struct(sv) = on else {
            panic!("expected struct");
        };
        assert_eq!(sv.get("Ts"), Some(&Value::Uint(0)));
        assert_eq!(sv.get("Many"), Some(&Value::Slice(vec![Value::Int(0)])));
    }

    #[test]
    fn test_array_length_must_match() {
        let m = modifier();
        let off = Value::Struct(
            StructValue::new()
                .with("Ts", Value::Pointer(None))
                .with("Big", Value::Pointer(None))
                .with("Many", Value::Slice(vec![]))
                .with("Fixed", Value::Slice(vec![Value::Pointer(None)]))
                .with("Other", ""),
        );
        let err = m.transform_to_on_chain(off, "Item").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SliceWrongLen);
    }

    #[test]
    fn test_negative_time_does_not_fit_unsigned() {
        let mut m = EpochToTimeModifier::new(["Ts"]).unwrap();
        let on = Type::structure([("Ts", Type::big_uint())]);
        m.retype_to_off_chain(&on, "Item").unwrap();
        let off = Value::Struct(StructValue::new().with("Ts", ts("1969-12-31T23:59:59Z")));
        let err = m.transform_to_on_chain(off, "Item").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);

        let huge = Value::Struct(StructValue::new().with("Ts", Value::BigUint(U256::MAX)));
        assert!(m.transform_to_off_chain(huge, "Item").is_err());
    }

    proptest! {
        #[test]
        fn test_epoch_round_trips(secs in 0i64..=4_102_444_800, items in proptest::collection::vec(-1_000_000_000i64..4_102_444_800, 0..4)) {
            let mut m = EpochToTimeModifier::new(["At", "Series"]).unwrap();
            let on_type = Type::structure([("At", Type::int(64)), ("Series", Type::slice(Type::int(64)))]);
            m.retype_to_off_chain(&on_type, "Item").unwrap();
            let on = Value::Struct(
                StructValue::new()
                    .with("At", secs)
                    .with("Series", Value::Slice(items.into_iter().map(Value::Int).collect())),
            );
            let off = m.transform_to_off_chain(on.clone(), "Item").unwrap();
            let back = m.transform_to_on_chain(off.clone(), "Item").unwrap();
            prop_assert_eq!(&back, &on);
            prop_assert_eq!(m.transform_to_off_chain(back, "Item").unwrap(), off);
        }
    }
}
