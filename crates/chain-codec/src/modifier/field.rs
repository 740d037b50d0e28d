//! Shared driver for modifiers configured by field path.
//!
//! A [`FieldModifier`] groups its configured paths into a tree, resolves that
//! tree against each on-chain struct at retype time and keeps the result as a
//! per-item-type plan. Transforms only follow the plan: they never look at
//! configuration or split paths.
//!
//! What happens to an individual field is delegated to a [`FieldRule`].

use std::fmt;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::error::CodecError;
use crate::model::path::PathTree;
use crate::model::{Field, FieldPath, StructType, StructValue, Type, Value};
use crate::modifier::{transform_checked, Modifier};

/// Per-field behavior plugged into a [`FieldModifier`].
pub trait FieldRule: fmt::Debug + Send + Sync {
    /// Configuration attached to one path.
    type Change: fmt::Debug + Send + Sync;
    /// What the value transforms need for one field, computed at retype time.
    type Resolved: fmt::Debug + Send + Sync;

    /// Modifier name used in logs.
    const NAME: &'static str;

    /// Computes the off-chain field for an existing on-chain field.
    /// Returning `None` removes the field from the off-chain struct.
    fn retype_field(
        &self,
        field: &Field,
        change: &Self::Change,
        path: &FieldPath,
    ) -> Result<(Option<Field>, Self::Resolved), CodecError>;

    /// Computes an off-chain field configured at a path with no on-chain field.
    fn add_field(
        &self,
        _name: &str,
        _change: &Self::Change,
        path: &FieldPath,
    ) -> Result<(Field, Self::Resolved), CodecError> {
        Err(CodecError::FieldNotFound {
            path: path.to_string(),
        })
    }

    /// Maps one field value on-chain to off-chain. The input is `None` for
    /// added fields; returning `None` omits the field.
    fn value_to_off_chain(
        &self,
        value: Option<Value>,
        resolved: &Self::Resolved,
    ) -> Result<Option<Value>, CodecError>;

    /// Maps one field value off-chain to on-chain. The input is `None` for
    /// removed fields; returning `None` leaves the on-chain field zero.
    fn value_to_on_chain(
        &self,
        value: Option<Value>,
        resolved: &Self::Resolved,
    ) -> Result<Option<Value>, CodecError>;
}

/// A modifier that applies a [`FieldRule`] to the fields named by a set of paths.
#[derive(Debug)]
pub struct FieldModifier<R: FieldRule> {
    rule: R,
    tree: PathTree<R::Change>,
    plans: FxHashMap<String, Plan<R::Resolved>>,
}

#[derive(Debug)]
struct Plan<T> {
    on: Type,
    off: Type,
    level: LevelPlan<T>,
}

/// Resolved changes for one struct level.
#[derive(Debug)]
struct LevelPlan<T> {
    on: StructType,
    nested: Vec<NestedPlan<T>>,
    changes: Vec<FieldChange<T>>,
}

#[derive(Debug)]
struct NestedPlan<T> {
    /// On-chain name of the field holding the nested struct.
    name: String,
    plan: LevelPlan<T>,
}

#[derive(Debug)]
struct FieldChange<T> {
    on_name: String,
    /// `None` when the field is removed off-chain.
    off_name: Option<String>,
    /// True when the field exists only off-chain.
    added: bool,
    resolved: T,
}

impl<R: FieldRule> FieldModifier<R> {
    /// Builds a modifier from a rule and its per-path configuration.
    pub fn from_rule<I>(rule: R, changes: I) -> Self
    where
        I: IntoIterator<Item = (FieldPath, R::Change)>,
    {
        Self {
            rule,
            tree: PathTree::build(changes),
            plans: FxHashMap::default(),
        }
    }

    pub fn rule(&self) -> &R {
        &self.rule
    }

    fn plan(&self, item_type: &str) -> Result<&Plan<R::Resolved>, CodecError> {
        self.plans
            .get(item_type)
            .ok_or_else(|| CodecError::NotRetyped {
                item_type: item_type.to_string(),
            })
    }

    fn retype_level(
        &self,
        on: &StructType,
        tree: &PathTree<R::Change>,
        prefix: &FieldPath,
    ) -> Result<(LevelPlan<R::Resolved>, StructType), CodecError> {
        // Nested changes first, so a field's own change sees its retyped contents.
        let mut mid = on.clone();
        let mut nested = Vec::new();
        for (name, node) in tree.iter() {
            if node.nested.is_empty() {
                continue;
            }
            let path = prefix.join(name);
            let field = mid.field_mut(name).ok_or_else(|| CodecError::FieldNotFound {
                path: path.to_string(),
            })?;
            let Type::Struct(inner) = field.ty.innermost() else {
                return Err(CodecError::NotAStruct {
                    at: path.to_string(),
                    found: field.ty.to_string(),
                });
            };
            let (plan, inner_off) = self.retype_level(inner, &node.nested, &path)?;
            field.ty = field.ty.replace_innermost(Type::Struct(inner_off));
            nested.push(NestedPlan {
                name: name.clone(),
                plan,
            });
        }

        let mut off = StructType::default();
        let mut changes = Vec::new();
        for field in &mid.fields {
            let Some(change) = tree.get(&field.name).and_then(|n| n.change.as_ref()) else {
                off.fields.push(field.clone());
                continue;
            };
            let path = prefix.join(&field.name);
            let (new_field, resolved) = self.rule.retype_field(field, change, &path)?;
            changes.push(FieldChange {
                on_name: field.name.clone(),
                off_name: new_field.as_ref().map(|f| f.name.clone()),
                added: false,
                resolved,
            });
            off.fields.extend(new_field);
        }

        for (name, node) in tree.iter() {
            let Some(change) = &node.change else {
                continue;
            };
            if mid.field(name).is_some() {
                continue;
            }
            let path = prefix.join(name);
            let (field, resolved) = self.rule.add_field(name, change, &path)?;
            changes.push(FieldChange {
                on_name: name.clone(),
                off_name: Some(field.name.clone()),
                added: true,
                resolved,
            });
            off.fields.push(field);
        }

        if let Some(name) = off.duplicate_name() {
            return Err(CodecError::FieldCollision {
                name: name.to_string(),
            });
        }

        let plan = LevelPlan {
            on: on.clone(),
            nested,
            changes,
        };
        Ok((plan, off))
    }

    fn level_to_off_chain(
        &self,
        plan: &LevelPlan<R::Resolved>,
        mut sv: StructValue,
    ) -> Result<StructValue, CodecError> {
        for nested in &plan.nested {
            sv.map_field(&nested.name, |value| {
                value.map_structs(&mut |inner| {
                    self.level_to_off_chain(&nested.plan, inner).map(Value::Struct)
                })
            })?;
        }

        let mut out = StructValue::new();
        for (name, value) in sv.fields {
            let change = plan.changes.iter().find(|c| !c.added && c.on_name == name);
            let Some(change) = change else {
                out.push(name, value);
                continue;
            };
            let mapped = self.rule.value_to_off_chain(Some(value), &change.resolved)?;
            if let (Some(off_name), Some(mapped)) = (&change.off_name, mapped) {
                out.push(off_name.clone(), mapped);
            }
        }
        for change in plan.changes.iter().filter(|c| c.added) {
            if let (Some(off_name), Some(value)) = (
                &change.off_name,
                self.rule.value_to_off_chain(None, &change.resolved)?,
            ) {
                out.push(off_name.clone(), value);
            }
        }
        Ok(out)
    }

    fn level_to_on_chain(
        &self,
        plan: &LevelPlan<R::Resolved>,
        sv: StructValue,
    ) -> Result<StructValue, CodecError> {
        let mut out = StructValue::new();
        for (name, value) in sv.fields {
            let change = plan
                .changes
                .iter()
                .find(|c| c.off_name.as_deref() == Some(name.as_str()));
            match change {
                None => out.push(name, value),
                Some(change) if change.added => {}
                Some(change) => {
                    if let Some(v) = self.rule.value_to_on_chain(Some(value), &change.resolved)? {
                        out.push(change.on_name.clone(), v);
                    }
                }
            }
        }
        for change in plan.changes.iter().filter(|c| c.off_name.is_none()) {
            if let Some(v) = self.rule.value_to_on_chain(None, &change.resolved)? {
                out.push(change.on_name.clone(), v);
            }
        }

        for nested in &plan.nested {
            out.map_field(&nested.name, |value| {
                value.map_structs(&mut |inner| {
                    self.level_to_on_chain(&nested.plan, inner).map(Value::Struct)
                })
            })?;
        }
        Ok(out.conform_to(&plan.on))
    }
}

impl<R: FieldRule> Modifier for FieldModifier<R> {
    fn retype_to_off_chain(&mut self, on_chain: &Type, item_type: &str) -> Result<Type, CodecError> {
        let Type::Struct(st) = on_chain.innermost() else {
            return Err(CodecError::NotAStruct {
                at: item_type.to_string(),
                found: on_chain.to_string(),
            });
        };
        let (level, off_struct) = self.retype_level(st, &self.tree, &FieldPath::root())?;
        let off = on_chain.replace_innermost(Type::Struct(off_struct));
        debug!(modifier = R::NAME, item_type, off_chain = %off, "retyped item type");
        self.plans.insert(
            item_type.to_string(),
            Plan {
                on: on_chain.clone(),
                off: off.clone(),
                level,
            },
        );
        Ok(off)
    }

    fn transform_to_on_chain(&self, off_chain: Value, item_type: &str) -> Result<Value, CodecError> {
        let plan = self.plan(item_type)?;
        trace!(modifier = R::NAME, item_type, "transform to on-chain");
        transform_checked(off_chain, &plan.off, |value| {
            value.map_structs(&mut |sv| self.level_to_on_chain(&plan.level, sv).map(Value::Struct))
        })
    }

    fn transform_to_off_chain(&self, on_chain: Value, item_type: &str) -> Result<Value, CodecError> {
        let plan = self.plan(item_type)?;
        trace!(modifier = R::NAME, item_type, "transform to off-chain");
        transform_checked(on_chain, &plan.on, |value| {
            value.map_structs(&mut |sv| self.level_to_off_chain(&plan.level, sv).map(Value::Struct))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    /// Appends "_off" to configured field names and leaves values alone.
    #[derive(Debug)]
    struct SuffixRule;

    impl FieldRule for SuffixRule {
        type Change = ();
        type Resolved = ();
        const NAME: &'static str = "suffix";

        fn retype_field(
            &self,
            field: &Field,
            _change: &(),
            _path: &FieldPath,
        ) -> Result<(Option<Field>, ()), CodecError> {
            Ok((Some(Field::new(format!("{}_off", field.name), field.ty.clone())), ()))
        }

        fn value_to_off_chain(&self, value: Option<Value>, _: &()) -> Result<Option<Value>, CodecError> {
            Ok(value)
        }

        fn value_to_on_chain(&self, value: Option<Value>, _: &()) -> Result<Option<Value>, CodecError> {
            Ok(value)
        }
    }

    fn suffix(paths: &[&str]) -> FieldModifier<SuffixRule> {
        FieldModifier::from_rule(
            SuffixRule,
            paths.iter().map(|p| (FieldPath::parse(p).unwrap(), ())),
        )
    }

    fn inner() -> Type {
        Type::structure([("A", Type::String), ("B", Type::int(64))])
    }

    #[test]
    fn test_transform_before_retype_fails() {
        let m = suffix(&["A"]);
        let err = m
            .transform_to_off_chain(Value::Struct(StructValue::new()), "Item")
            .unwrap_err();
        assert_eq!(err, CodecError::NotRetyped { item_type: "Item".into() });
        assert_eq!(err.kind(), ErrorKind::InvalidType);
    }

    #[test]
    fn test_retype_requires_struct() {
        let mut m = suffix(&["A"]);
        let err = m.retype_to_off_chain(&Type::slice(Type::String), "Item").unwrap_err();
        assert!(matches!(err, CodecError::NotAStruct { .. }));
    }

    #[test]
    fn test_nested_path_through_slice_of_pointers() {
        let on = Type::structure([("C", Type::slice(Type::pointer(inner()))), ("A", Type::Bool)]);
        let mut m = suffix(&["C.A"]);
        let off = m.retype_to_off_chain(&on, "Item").unwrap();
        assert_eq!(
            off,
            Type::structure([
                (
                    "C",
                    Type::slice(Type::pointer(Type::structure([("A_off", Type::String), ("B", Type::int(64))])))
                ),
                ("A", Type::Bool),
            ])
        );

        let element = |a: &str| Value::pointer(Value::Struct(StructValue::new().with("A", a).with("B", 1i64)));
        let on_value = Value::Struct(
            StructValue::new()
                .with("C", Value::Slice(vec![element("x"), Value::Pointer(None), element("y")]))
                .with("A", true),
        );
        let off_value = m.transform_to_off_chain(on_value.clone(), "Item").unwrap();
        assert!(off_value.check(&off).is_ok());
        let back = m.transform_to_on_chain(off_value, "Item").unwrap();
        assert_eq!(back, on_value);
    }

    #[test]
    fn test_nested_path_requires_struct_field() {
        let on = Type::structure([("A", Type::String)]);
        let err = suffix(&["A.B"]).retype_to_off_chain(&on, "Item").unwrap_err();
        assert!(matches!(err, CodecError::NotAStruct { ref at, .. } if at == "A"));

        let err = suffix(&["Missing.B"]).retype_to_off_chain(&on, "Item").unwrap_err();
        assert_eq!(err, CodecError::FieldNotFound { path: "Missing".into() });
    }

    #[test]
    fn test_transform_rejects_wrong_shape() {
        let mut m = suffix(&["A"]);
        m.retype_to_off_chain(&inner(), "Item").unwrap();
        let wrong = Value::Struct(StructValue::new().with("A", 1i64).with("B", 1i64));
        assert!(m.transform_to_off_chain(wrong, "Item").is_err());
        let on_shape = Value::Struct(StructValue::new().with("A", "a").with("B", 1i64));
        assert!(m.transform_to_on_chain(on_shape, "Item").is_err());
    }

    #[test]
    fn test_item_types_are_cached_independently() {
        let mut m = suffix(&["A"]);
        let first = m.retype_to_off_chain(&inner(), "First").unwrap();
        let second = m
            .retype_to_off_chain(&Type::pointer(Type::structure([("A", Type::Bool)])), "Second")
            .unwrap();
        assert_ne!(first, second);
        let value = Value::pointer(Value::Struct(StructValue::new().with("A", true)));
        let off = m.transform_to_off_chain(value, "Second").unwrap();
        assert_eq!(off, Value::pointer(Value::Struct(StructValue::new().with("A_off", true))));
    }
}
