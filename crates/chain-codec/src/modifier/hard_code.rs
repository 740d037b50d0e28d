//! Hard-coded field values.
//!
//! `on_chain_values` are written into the on-chain value on the way to the
//! raw codec; `off_chain_values` are written into (or added to) the
//! off-chain value on the way out. Literals are JSON and are converted to the
//! field type with the decode hooks. Keys inside slices or arrays of structs
//! apply to every element.

use std::collections::BTreeMap;

use serde_json::Value as JsonValue;

use crate::convert::{from_json, untyped_from_json, DecodeHooks};
use crate::error::CodecError;
use crate::model::{reject_nested_paths, Field, FieldPath, Type, Value};
use crate::modifier::field::{FieldModifier, FieldRule};

/// Writes fixed values into on-chain and/or off-chain values.
pub type HardCoder = FieldModifier<HardCodeRule>;

#[derive(Debug)]
pub struct HardCodeRule {
    hooks: DecodeHooks,
}

/// The literals configured for one path.
#[derive(Debug, Clone, Default)]
pub struct HardCodedLiterals {
    pub on_chain: Option<JsonValue>,
    pub off_chain: Option<JsonValue>,
}

/// Literals converted to the types resolved for one item type.
#[derive(Debug)]
pub struct ResolvedLiterals {
    on_chain: Option<Value>,
    off_chain: Option<Value>,
}

impl HardCodeRule {
    fn literal(&self, json: &JsonValue, ty: &Type, path: &FieldPath) -> Result<Value, CodecError> {
        from_json(json, ty, &self.hooks).map_err(|e| e.context(format!("hard-coded value for {}", path)))
    }

    /// Converts an off-chain literal to its natural type when it has no field to fit.
    fn inferred_literal(&self, json: &JsonValue, path: &FieldPath) -> Result<(Type, Value), CodecError> {
        let ty = untyped_from_json(json)
            .and_then(|v| v.type_of())
            .map_err(|e| e.context(format!("hard-coded value for {}", path)))?;
        let value = self.literal(json, &ty, path)?;
        Ok((ty, value))
    }
}

impl FieldRule for HardCodeRule {
    type Change = HardCodedLiterals;
    type Resolved = ResolvedLiterals;

    const NAME: &'static str = "hard code";

    fn retype_field(
        &self,
        field: &Field,
        change: &HardCodedLiterals,
        path: &FieldPath,
    ) -> Result<(Option<Field>, ResolvedLiterals), CodecError> {
        let on_chain = change
            .on_chain
            .as_ref()
            .map(|json| self.literal(json, &field.ty, path))
            .transpose()?;

        let (off_ty, off_chain) = match &change.off_chain {
            None => (field.ty.clone(), None),
            Some(json) => match self.literal(json, &field.ty, path) {
                Ok(value) => (field.ty.clone(), Some(value)),
                Err(_) if on_chain.is_some() => {
                    let (ty, value) = self.inferred_literal(json, path)?;
                    (ty, Some(value))
                }
                Err(_) => {
                    return Err(CodecError::UnrecoverableField {
                        path: path.to_string(),
                    });
                }
            },
        };

        let resolved = ResolvedLiterals { on_chain, off_chain };
        Ok((Some(Field::new(field.name.clone(), off_ty)), resolved))
    }

    fn add_field(
        &self,
        name: &str,
        change: &HardCodedLiterals,
        path: &FieldPath,
    ) -> Result<(Field, ResolvedLiterals), CodecError> {
        let (None, Some(json)) = (&change.on_chain, &change.off_chain) else {
            return Err(CodecError::FieldNotFound {
                path: path.to_string(),
            });
        };
        let (ty, value) = self.inferred_literal(json, path)?;
        let resolved = ResolvedLiterals {
            on_chain: None,
            off_chain: Some(value),
        };
        Ok((Field::new(name, ty), resolved))
    }

    fn value_to_off_chain(
        &self,
        value: Option<Value>,
        resolved: &ResolvedLiterals,
    ) -> Result<Option<Value>, CodecError> {
        Ok(resolved.off_chain.clone().or(value))
    }

    fn value_to_on_chain(
        &self,
        value: Option<Value>,
        resolved: &ResolvedLiterals,
    ) -> Result<Option<Value>, CodecError> {
        Ok(resolved.on_chain.clone().or(value))
    }
}

fn parse_keys<I, K>(values: I) -> Result<Vec<(FieldPath, JsonValue)>, CodecError>
where
    I: IntoIterator<Item = (K, JsonValue)>,
    K: AsRef<str>,
{
    let parsed = values
        .into_iter()
        .map(|(key, json)| FieldPath::parse(key.as_ref()).map(|p| (p, json)))
        .collect::<Result<Vec<_>, _>>()?;
    reject_nested_paths(parsed.iter().map(|(p, _)| p))?;
    Ok(parsed)
}

impl FieldModifier<HardCodeRule> {
    /// Builds a hard coder with the standard decode hooks.
    pub fn new<I, J, K>(on_chain_values: I, off_chain_values: J) -> Result<Self, CodecError>
    where
        I: IntoIterator<Item = (K, JsonValue)>,
        J: IntoIterator<Item = (K, JsonValue)>,
        K: AsRef<str>,
    {
        Self::with_hooks(on_chain_values, off_chain_values, DecodeHooks::standard())
    }

    /// Builds a hard coder that converts literals with `hooks`.
    ///
    /// Fails with an `InvalidConfig` error when a map holds both a path and
    /// one of its sub-paths.
    pub fn with_hooks<I, J, K>(on_chain_values: I, off_chain_values: J, hooks: DecodeHooks) -> Result<Self, CodecError>
    where
        I: IntoIterator<Item = (K, JsonValue)>,
        J: IntoIterator<Item = (K, JsonValue)>,
        K: AsRef<str>,
    {
        let mut literals: BTreeMap<FieldPath, HardCodedLiterals> = BTreeMap::new();
        for (path, json) in parse_keys(on_chain_values)? {
            literals.entry(path).or_default().on_chain = Some(json);
        }
        for (path, json) in parse_keys(off_chain_values)? {
            literals.entry(path).or_default().off_chain = Some(json);
        }
        Ok(FieldModifier::from_rule(HardCodeRule { hooks }, literals))
    }
}
