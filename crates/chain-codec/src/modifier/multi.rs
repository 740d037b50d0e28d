//! Ordered composition of modifiers.

use tracing::debug;

use crate::error::CodecError;
use crate::model::{Type, Value};
use crate::modifier::Modifier;

/// Applies child modifiers in order towards off-chain and in reverse order
/// towards on-chain.
#[derive(Debug, Default)]
pub struct MultiModifier {
    modifiers: Vec<Box<dyn Modifier>>,
}

impl MultiModifier {
    pub fn new(modifiers: Vec<Box<dyn Modifier>>) -> Self {
        Self { modifiers }
    }

    /// Appends a modifier to the end of the chain.
    pub fn push(&mut self, modifier: Box<dyn Modifier>) {
        self.modifiers.push(modifier);
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }
}

impl FromIterator<Box<dyn Modifier>> for MultiModifier {
    fn from_iter<I: IntoIterator<Item = Box<dyn Modifier>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Modifier for MultiModifier {
    fn retype_to_off_chain(&mut self, on_chain: &Type, item_type: &str) -> Result<Type, CodecError> {
        let mut ty = on_chain.clone();
        for (i, modifier) in self.modifiers.iter_mut().enumerate() {
            ty = modifier
                .retype_to_off_chain(&ty, item_type)
                .map_err(|e| e.context(format!("modifier {}", i)))?;
        }
        debug!(item_type, modifiers = self.modifiers.len(), "retyped modifier chain");
        Ok(ty)
    }

    fn transform_to_on_chain(&self, off_chain: Value, item_type: &str) -> Result<Value, CodecError> {
        self.modifiers
            .iter()
            .rev()
            .try_fold(off_chain, |value, modifier| modifier.transform_to_on_chain(value, item_type))
    }

    fn transform_to_off_chain(&self, on_chain: Value, item_type: &str) -> Result<Value, CodecError> {
        self.modifiers
            .iter()
            .try_fold(on_chain, |value, modifier| modifier.transform_to_off_chain(value, item_type))
    }
}
