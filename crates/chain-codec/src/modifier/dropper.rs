//! Field removal.
//!
//! Dropped fields come back on-chain as the zero value of their type.

use crate::error::CodecError;
use crate::model::{Field, FieldPath, Value};
use crate::modifier::field::{FieldModifier, FieldRule};

/// Removes fields from the off-chain shape.
pub type Dropper = FieldModifier<DropRule>;

#[derive(Debug, Default)]
pub struct DropRule;

impl FieldRule for DropRule {
    type Change = ();
    type Resolved = ();

    const NAME: &'static str = "drop";

    fn retype_field(&self, _field: &Field, _: &(), _path: &FieldPath) -> Result<(Option<Field>, ()), CodecError> {
        Ok((None, ()))
    }

    fn value_to_off_chain(&self, _value: Option<Value>, _: &()) -> Result<Option<Value>, CodecError> {
        Ok(None)
    }

    fn value_to_on_chain(&self, _value: Option<Value>, _: &()) -> Result<Option<Value>, CodecError> {
        Ok(None)
    }
}

impl FieldModifier<DropRule> {
    /// Builds a dropper from on-chain field paths.
    pub fn new<I, K>(fields: I) -> Result<Self, CodecError>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let changes = fields
            .into_iter()
            .map(|path| FieldPath::parse(path.as_ref()).map(|p| (p, ())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FieldModifier::from_rule(DropRule, changes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::{StructValue, Type};
    use crate::modifier::Modifier;

    #[test]
    fn test_drop_zero_fills_on_the_way_back() {
        let on = Type::pointer(Type::structure([
            ("A", Type::String),
            ("B", Type::int(64)),
            ("C", Type::slice(Type::structure([("D", Type::Bool), ("E", Type::uint(8))]))),
        ]));
        let mut dropper = Dropper::new(["B", "C.E"]).unwrap();
        let off = dropper.retype_to_off_chain(&on, "Item").unwrap();
        assert_eq!(
            off,
            Type::pointer(Type::structure([
                ("A", Type::String),
                ("C", Type::slice(Type::structure([("D", Type::Bool)]))),
            ]))
        );

        let element = Value::Struct(StructValue::new().with("D", true).with("E", 7u64));
        let value = Value::pointer(Value::Struct(
            StructValue::new()
                .with("A", "keep")
                .with("B", 42i64)
                .with("C", Value::Slice(vec![element])),
        ));
        let off_value = dropper.transform_to_off_chain(value, "Item").unwrap();
        assert_eq!(
            off_value,
            Value::pointer(Value::Struct(
                StructValue::new()
                    .with("A", "keep")
                    .with("C", Value::Slice(vec![Value::Struct(StructValue::new().with("D", true))])),
            ))
        );

        let back = dropper.transform_to_on_chain(off_value, "Item").unwrap();
        let zeroed = Value::Struct(StructValue::new().with("D", true).with("E", 0u64));
        assert_eq!(
            back,
            Value::pointer(Value::Struct(
                StructValue::new()
                    .with("A", "keep")
                    .with("B", 0i64)
                    .with("C", Value::Slice(vec![zeroed])),
            ))
        );
    }

    #[test]
    fn test_drop_missing_field() {
        let mut dropper = Dropper::new(["Nope"]).unwrap();
        let err = dropper
            .retype_to_off_chain(&Type::structure([("A", Type::Bool)]), "Item")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
    }

    #[test]
    fn test_drop_nil_pointer_stays_nil() {
        let mut dropper = Dropper::new(["A"]).unwrap();
        let on = Type::pointer(Type::structure([("A", Type::Bool), ("B", Type::Bool)]));
        dropper.retype_to_off_chain(&on, "Item").unwrap();
        assert_eq!(
            dropper.transform_to_on_chain(Value::Pointer(None), "Item").unwrap(),
            Value::Pointer(None)
        );
    }

    #[test]
    fn test_drop_accepts_pointer_to_value() {
        let mut dropper = Dropper::new(["B"]).unwrap();
        let on = Type::structure([("A", Type::String), ("B", Type::int(64))]);
        dropper.retype_to_off_chain(&on, "Item").unwrap();

        let value = Value::pointer(Value::Struct(StructValue::new().with("A", "a").with("B", 5i64)));
        let off_value = dropper.transform_to_off_chain(value, "Item").unwrap();
        assert_eq!(off_value, Value::pointer(Value::Struct(StructValue::new().with("A", "a"))));

        let back = dropper.transform_to_on_chain(off_value, "Item").unwrap();
        assert_eq!(
            back,
            Value::pointer(Value::Struct(StructValue::new().with("A", "a").with("B", 0i64)))
        );
    }
}
