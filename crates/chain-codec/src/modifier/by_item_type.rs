//! Per-item-type dispatch.

use rustc_hash::FxHashMap;

use crate::error::CodecError;
use crate::model::{Type, Value};
use crate::modifier::Modifier;

/// Routes every call to the modifier registered for its item type.
#[derive(Debug, Default)]
pub struct ByItemTypeModifier {
    modifiers: FxHashMap<String, Box<dyn Modifier>>,
}

impl ByItemTypeModifier {
    /// Builds the table, rejecting an item type registered twice.
    pub fn new<I, K>(modifiers: I) -> Result<Self, CodecError>
    where
        I: IntoIterator<Item = (K, Box<dyn Modifier>)>,
        K: Into<String>,
    {
        let mut table = FxHashMap::default();
        for (item_type, modifier) in modifiers {
            let item_type = item_type.into();
            if table.contains_key(&item_type) {
                return Err(CodecError::DuplicateItemType { item_type });
            }
            table.insert(item_type, modifier);
        }
        Ok(Self { modifiers: table })
    }

    /// Returns true if a modifier is registered for `item_type`.
    pub fn contains(&self, item_type: &str) -> bool {
        self.modifiers.contains_key(item_type)
    }

    /// Registered item types, in no particular order.
    pub fn item_types(&self) -> impl Iterator<Item = &str> {
        self.modifiers.keys().map(String::as_str)
    }

    fn get(&self, item_type: &str) -> Result<&dyn Modifier, CodecError> {
        self.modifiers
            .get(item_type)
            .map(|m| m.as_ref())
            .ok_or_else(|| CodecError::UnknownItemType {
                item_type: item_type.to_string(),
            })
    }
}

impl Modifier for ByItemTypeModifier {
    fn retype_to_off_chain(&mut self, on_chain: &Type, item_type: &str) -> Result<Type, CodecError> {
        let modifier = self
            .modifiers
            .get_mut(item_type)
            .ok_or_else(|| CodecError::UnknownItemType {
                item_type: item_type.to_string(),
            })?;
        modifier.retype_to_off_chain(on_chain, item_type)
    }

    fn transform_to_on_chain(&self, off_chain: Value, item_type: &str) -> Result<Value, CodecError> {
        self.get(item_type)?.transform_to_on_chain(off_chain, item_type)
    }

    fn transform_to_off_chain(&self, on_chain: Value, item_type: &str) -> Result<Value, CodecError> {
        self.get(item_type)?.transform_to_off_chain(on_chain, item_type)
    }
}
