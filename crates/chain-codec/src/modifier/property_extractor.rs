//! Replaces a whole struct with one of its (possibly nested) properties.
//!
//! Wrappers crossed on the way to the property are kept: an outer slice of
//! structs becomes a slice of properties, a pointer becomes a pointer. Going
//! back on-chain every struct on the path is rebuilt zero-valued with only
//! the property set.

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::error::CodecError;
use crate::model::{FieldPath, Type, Value};
use crate::modifier::{transform_checked, Modifier};

#[derive(Debug)]
struct Plan {
    on: Type,
    off: Type,
}

/// Extracts the property at a dotted path.
#[derive(Debug)]
pub struct PropertyExtractor {
    field: FieldPath,
    plans: FxHashMap<String, Plan>,
}

impl PropertyExtractor {
    pub fn new(field_name: &str) -> Result<Self, CodecError> {
        Ok(Self {
            field: FieldPath::parse(field_name)?,
            plans: FxHashMap::default(),
        })
    }

    /// The configured property path.
    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    fn plan(&self, item_type: &str) -> Result<&Plan, CodecError> {
        self.plans
            .get(item_type)
            .ok_or_else(|| CodecError::NotRetyped {
                item_type: item_type.to_string(),
            })
    }

    fn extract_type(&self, ty: &Type, segments: &[String]) -> Result<Type, CodecError> {
        let Some((first, rest)) = segments.split_first() else {
            return Ok(ty.clone());
        };
        match ty {
            Type::Pointer(inner) => Ok(Type::pointer(self.extract_type(inner, segments)?)),
            Type::Slice(inner) => Ok(Type::slice(self.extract_type(inner, segments)?)),
            Type::Array(inner, len) => Ok(Type::array(self.extract_type(inner, segments)?, *len)),
            Type::Struct(st) => {
                let field = st.field(first).ok_or_else(|| CodecError::FieldNotFound {
                    path: self.field.to_string(),
                })?;
                self.extract_type(&field.ty, rest)
            }
            other => Err(CodecError::NotAStruct {
                at: self.field.to_string(),
                found: other.to_string(),
            }),
        }
    }
}

fn extract_value(value: Value, segments: &[String]) -> Result<Value, CodecError> {
    let Some((first, rest)) = segments.split_first() else {
        return Ok(value);
    };
    match value {
        Value::Pointer(None) => Ok(Value::Pointer(None)),
        Value::Pointer(Some(inner)) => Ok(Value::pointer(extract_value(*inner, segments)?)),
        Value::Slice(items) => Ok(Value::Slice(extract_items(items, segments)?)),
        Value::Array(items) => Ok(Value::Array(extract_items(items, segments)?)),
        Value::Struct(mut sv) => {
            let field = sv.take(first).ok_or_else(|| CodecError::FieldNotFound {
                path: first.clone(),
            })?;
            extract_value(field, rest)
        }
        other => Err(CodecError::NotAStruct {
            at: first.clone(),
            found: other.describe(),
        }),
    }
}

fn extract_items(items: Vec<Value>, segments: &[String]) -> Result<Vec<Value>, CodecError> {
    items.into_iter().map(|item| extract_value(item, segments)).collect()
}

/// Rebuilds a value of type `on` holding `value` at `segments`.
fn inject_value(value: Value, on: &Type, segments: &[String]) -> Result<Value, CodecError> {
    let Some((first, rest)) = segments.split_first() else {
        return Ok(value);
    };
    match (on, value) {
        (Type::Pointer(_), Value::Pointer(None)) => Ok(Value::Pointer(None)),
        (Type::Pointer(inner), Value::Pointer(Some(v))) => Ok(Value::pointer(inject_value(*v, inner, segments)?)),
        (Type::Slice(inner), Value::Slice(items)) => Ok(Value::Slice(inject_items(items, inner, segments)?)),
        (Type::Array(inner, _), Value::Array(items)) => Ok(Value::Array(inject_items(items, inner, segments)?)),
        (Type::Struct(st), value) => {
            let field = st.field(first).ok_or_else(|| CodecError::FieldNotFound {
                path: first.clone(),
            })?;
            let leaf = inject_value(value, &field.ty, rest)?;
            let mut sv = st.zero_value();
            sv.set(first.clone(), leaf);
            Ok(Value::Struct(sv))
        }
        (ty, value) => Err(CodecError::TypeMismatch {
            at: "value".to_string(),
            expected: ty.to_string(),
            found: value.describe(),
        }),
    }
}

fn inject_items(items: Vec<Value>, on: &Type, segments: &[String]) -> Result<Vec<Value>, CodecError> {
    items
        .into_iter()
        .map(|item| inject_value(item, on, segments))
        .collect()
}

impl Modifier for PropertyExtractor {
    fn retype_to_off_chain(&mut self, on_chain: &Type, item_type: &str) -> Result<Type, CodecError> {
        if on_chain.innermost().as_struct().is_none() {
            return Err(CodecError::NotAStruct {
                at: item_type.to_string(),
                found: on_chain.to_string(),
            });
        }
        let off = self.extract_type(on_chain, self.field.segments())?;
        debug!(modifier = "extract property", item_type, off_chain = %off, "retyped item type");
        self.plans.insert(
            item_type.to_string(),
            Plan {
                on: on_chain.clone(),
                off: off.clone(),
            },
        );
        Ok(off)
    }

    fn transform_to_on_chain(&self, off_chain: Value, item_type: &str) -> Result<Value, CodecError> {
        let plan = self.plan(item_type)?;
        trace!(modifier = "extract property", item_type, "transform to on-chain");
        transform_checked(off_chain, &plan.off, |value| {
            inject_value(value, &plan.on, self.field.segments())
        })
    }

    fn transform_to_off_chain(&self, on_chain: Value, item_type: &str) -> Result<Value, CodecError> {
        let plan = self.plan(item_type)?;
        trace!(modifier = "extract property", item_type, "transform to off-chain");
        transform_checked(on_chain, &plan.on, |value| extract_value(value, self.field.segments()))
    }
}
