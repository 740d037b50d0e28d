//! Modifiers translate between the on-chain shape a raw codec understands and
//! the off-chain shape callers work with.
//!
//! Every modifier is retyped once per item type at startup
//! ([`Modifier::retype_to_off_chain`], which caches a resolved plan) and is
//! read-only afterwards, so warmed-up instances can be shared across threads.
//!
//! All modifiers look through pointer, slice and array wrappers: a modifier
//! configured for a struct behaves the same on `T`, `*T`, `[]T`, `[N]*T`
//! and so on. Nil pointers stay nil and slices keep their length.

pub mod by_item_type;
pub mod dropper;
pub mod element_extractor;
pub mod epoch_to_time;
pub mod field;
pub mod hard_code;
pub mod multi;
pub mod property_extractor;
pub mod rename;
pub mod wrapper;

use std::fmt;

use crate::error::CodecError;
use crate::model::{Type, Value};

pub use by_item_type::ByItemTypeModifier;
pub use dropper::Dropper;
pub use element_extractor::{ElementExtractor, ElementLocation};
pub use epoch_to_time::EpochToTimeModifier;
pub use field::{FieldModifier, FieldRule};
pub use hard_code::HardCoder;
pub use multi::MultiModifier;
pub use property_extractor::PropertyExtractor;
pub use rename::Renamer;
pub use wrapper::WrapperModifier;

/// A bidirectional type-level and value-level transformation.
pub trait Modifier: fmt::Debug + Send + Sync {
    /// Derives the off-chain type for `item_type` and caches whatever the
    /// transforms need.
    fn retype_to_off_chain(&mut self, on_chain: &Type, item_type: &str) -> Result<Type, CodecError>;

    /// Converts an off-chain value back to the on-chain shape.
    fn transform_to_on_chain(&self, off_chain: Value, item_type: &str) -> Result<Value, CodecError>;

    /// Converts a decoded on-chain value to the off-chain shape.
    fn transform_to_off_chain(&self, on_chain: Value, item_type: &str) -> Result<Value, CodecError>;
}

impl Modifier for Box<dyn Modifier> {
    fn retype_to_off_chain(&mut self, on_chain: &Type, item_type: &str) -> Result<Type, CodecError> {
        (**self).retype_to_off_chain(on_chain, item_type)
    }

    fn transform_to_on_chain(&self, off_chain: Value, item_type: &str) -> Result<Value, CodecError> {
        (**self).transform_to_on_chain(off_chain, item_type)
    }

    fn transform_to_off_chain(&self, on_chain: Value, item_type: &str) -> Result<Value, CodecError> {
        (**self).transform_to_off_chain(on_chain, item_type)
    }
}

/// Checks a configured field name that will appear in an off-chain struct.
pub(crate) fn validate_field_name(name: &str) -> Result<(), CodecError> {
    if name.is_empty() || name.contains('.') || name.trim() != name {
        return Err(CodecError::InvalidFieldName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Checks `value` against a retyped shape and runs `f` on it. A pointer to a
/// value of that shape is accepted too: the pointee is transformed and
/// re-wrapped, and a nil pointer stays nil.
pub(crate) fn transform_checked<F>(value: Value, ty: &Type, f: F) -> Result<Value, CodecError>
where
    F: FnOnce(Value) -> Result<Value, CodecError>,
{
    match value {
        Value::Pointer(inner) if !matches!(ty, Type::Pointer(_)) => match inner {
            None => Ok(Value::Pointer(None)),
            Some(inner) => {
                inner.check(ty)?;
                f(*inner).map(Value::pointer)
            }
        },
        value => {
            value.check(ty)?;
            f(value)
        }
    }
}
