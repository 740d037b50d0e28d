//! Field renaming.
//!
//! Paths address on-chain names; only the last segment is renamed. Renames
//! of an outer field combine with renames inside it.

use crate::error::CodecError;
use crate::model::{Field, FieldPath, Value};
use crate::modifier::field::{FieldModifier, FieldRule};
use crate::modifier::validate_field_name;

/// Renames fields; values move unchanged.
pub type Renamer = FieldModifier<RenameRule>;

#[derive(Debug, Default)]
pub struct RenameRule;

impl FieldRule for RenameRule {
    /// The off-chain name.
    type Change = String;
    type Resolved = ();

    const NAME: &'static str = "rename";

    fn retype_field(
        &self,
        field: &Field,
        change: &String,
        _path: &FieldPath,
    ) -> Result<(Option<Field>, ()), CodecError> {
        Ok((Some(Field::new(change.clone(), field.ty.clone())), ()))
    }

    fn value_to_off_chain(&self, value: Option<Value>, _: &()) -> Result<Option<Value>, CodecError> {
        Ok(value)
    }

    fn value_to_on_chain(&self, value: Option<Value>, _: &()) -> Result<Option<Value>, CodecError> {
        Ok(value)
    }
}

impl FieldModifier<RenameRule> {
    /// Builds a renamer from `(on-chain path, off-chain name)` pairs.
    pub fn new<I, K, V>(fields: I) -> Result<Self, CodecError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut changes = Vec::new();
        for (path, name) in fields {
            let name = name.into();
            validate_field_name(&name)?;
            changes.push((FieldPath::parse(path.as_ref())?, name));
        }
        Ok(FieldModifier::from_rule(RenameRule, changes))
    }
}
