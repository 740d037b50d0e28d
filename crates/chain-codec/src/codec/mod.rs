//! Raw codec contract, the modifier-aware codec wrapper and size estimation.
//!
//! A raw [`Codec`] knows one wire format and only ever sees on-chain shapes.
//! [`ModifierCodec`] puts a [`Modifier`](crate::modifier::Modifier) in front
//! of it so callers work with off-chain shapes.

pub mod modifier_codec;
pub mod size;
#[cfg(test)]
pub(crate) mod testing;

pub use modifier_codec::ModifierCodec;
pub use size::max_size;

use crate::error::CodecError;
use crate::model::{Type, Value};

/// A wire-format encoder/decoder for named item types.
pub trait Codec: Send + Sync {
    /// Encodes an on-chain value. `None` encodes the item type's default.
    fn encode(&self, item: Option<&Value>, item_type: &str) -> Result<Vec<u8>, CodecError>;

    /// Decodes bytes into a value of the on-chain shape.
    fn decode(&self, raw: &[u8], item_type: &str) -> Result<Value, CodecError>;

    /// Returns the on-chain shape of an item type.
    fn create_type(&self, item_type: &str, for_encoding: bool) -> Result<Type, CodecError>;

    /// Worst-case encoded size with `n` elements in every dynamic position.
    fn max_encoding_size(&self, n: usize, item_type: &str) -> Result<usize, CodecError>;

    /// Worst-case size of bytes accepted by `decode`.
    fn max_decoding_size(&self, n: usize, item_type: &str) -> Result<usize, CodecError>;
}
