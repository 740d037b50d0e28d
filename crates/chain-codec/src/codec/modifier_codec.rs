//! A codec that exposes off-chain shapes over a raw on-chain codec.
//!
//! Encoding converts the caller's value into the off-chain type, runs the
//! modifier towards on-chain and hands the result to the raw codec. Decoding
//! runs the same steps in reverse. Every item type is retyped when the codec
//! is built, so configuration errors surface before the first call.

use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, trace};

use crate::codec::Codec;
use crate::convert::{convert, from_json, to_serde_json, DecodeHooks};
use crate::error::CodecError;
use crate::model::{Type, Value};
use crate::modifier::Modifier;

/// Wraps a raw codec with a modifier.
///
/// The raw codec must report the same on-chain shape for encoding and
/// decoding of an item type; construction fails with a type mismatch
/// otherwise. Off-chain types are therefore the same in both directions.
#[derive(Debug)]
pub struct ModifierCodec<C> {
    codec: C,
    modifier: Box<dyn Modifier>,
    off_chain: FxHashMap<String, Type>,
    hooks: DecodeHooks,
}

impl<C: Codec> ModifierCodec<C> {
    /// Builds the codec and retypes every item type in `item_types`.
    pub fn new<I, S>(codec: C, modifier: Box<dyn Modifier>, item_types: I) -> Result<Self, CodecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::with_hooks(codec, modifier, item_types, DecodeHooks::standard())
    }

    /// Like [`ModifierCodec::new`], converting caller values with `hooks`.
    pub fn with_hooks<I, S>(
        codec: C,
        modifier: Box<dyn Modifier>,
        item_types: I,
        hooks: DecodeHooks,
    ) -> Result<Self, CodecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut this = Self {
            codec,
            modifier,
            off_chain: FxHashMap::default(),
            hooks,
        };
        for item_type in item_types {
            this.register(item_type.as_ref())?;
        }
        Ok(this)
    }

    fn register(&mut self, item_type: &str) -> Result<(), CodecError> {
        let encoding = self.codec.create_type(item_type, true)?;
        let decoding = self.codec.create_type(item_type, false)?;
        if encoding != decoding {
            return Err(CodecError::TypeMismatch {
                at: format!("item type {}", item_type),
                expected: encoding.to_string(),
                found: decoding.to_string(),
            });
        }
        let off = self
            .modifier
            .retype_to_off_chain(&encoding, item_type)
            .map_err(|e| e.context(format!("retyping {}", item_type)))?;
        debug!(item_type, on_chain = %encoding, off_chain = %off, "registered item type");
        self.off_chain.insert(item_type.to_string(), off);
        Ok(())
    }

    fn off_chain_type(&self, item_type: &str) -> Result<&Type, CodecError> {
        self.off_chain
            .get(item_type)
            .ok_or_else(|| CodecError::UnknownItemType {
                item_type: item_type.to_string(),
            })
    }

    /// Item types this codec was built for, in no particular order.
    pub fn item_types(&self) -> impl Iterator<Item = &str> {
        self.off_chain.keys().map(String::as_str)
    }

    /// The wrapped raw codec.
    pub fn inner(&self) -> &C {
        &self.codec
    }

    /// Returns the off-chain type of an item type.
    ///
    /// Encoding and decoding shapes are checked to agree when the codec is
    /// built, so `for_encoding` does not change the result.
    pub fn create_type(&self, item_type: &str, _for_encoding: bool) -> Result<Type, CodecError> {
        self.off_chain_type(item_type).cloned()
    }

    /// Returns a fresh off-chain value, with a top-level pointer allocated.
    pub fn zero_value(&self, item_type: &str, for_encoding: bool) -> Result<Value, CodecError> {
        Ok(self.create_type(item_type, for_encoding)?.new_value())
    }

    /// Encodes an off-chain value. `None` encodes the raw codec's default.
    ///
    /// The value only has to be structurally compatible with the off-chain
    /// type; it is converted first.
    pub fn encode_value(&self, item: Option<&Value>, item_type: &str) -> Result<Vec<u8>, CodecError> {
        let Some(item) = item else {
            return self.codec.encode(None, item_type);
        };
        let off_type = self.off_chain_type(item_type)?;
        let off = convert(item, off_type, &self.hooks)?;
        let on = self.modifier.transform_to_on_chain(off, item_type)?;
        trace!(item_type, "encoding");
        self.codec.encode(Some(&on), item_type)
    }

    /// Decodes raw bytes into the off-chain shape.
    pub fn decode_value(&self, raw: &[u8], item_type: &str) -> Result<Value, CodecError> {
        self.off_chain_type(item_type)?;
        let on = self.codec.decode(raw, item_type)?;
        trace!(item_type, len = raw.len(), "decoded");
        self.modifier.transform_to_off_chain(on, item_type)
    }

    /// Encodes any serializable value whose fields line up with the off-chain type.
    pub fn encode<T: Serialize>(&self, item: &T, item_type: &str) -> Result<Vec<u8>, CodecError> {
        let json = serde_json::to_value(item).map_err(|e| CodecError::Conversion {
            from: std::any::type_name::<T>().to_string(),
            to: item_type.to_string(),
            reason: e.to_string(),
        })?;
        let value = from_json(&json, self.off_chain_type(item_type)?, &self.hooks)?;
        self.encode_value(Some(&value), item_type)
    }

    /// Decodes into any deserializable type whose fields line up with the off-chain type.
    pub fn decode<T: DeserializeOwned>(&self, raw: &[u8], item_type: &str) -> Result<T, CodecError> {
        let value = self.decode_value(raw, item_type)?;
        let json = to_serde_json(&value)?;
        serde_json::from_value(json).map_err(|e| CodecError::Conversion {
            from: item_type.to_string(),
            to: std::any::type_name::<T>().to_string(),
            reason: e.to_string(),
        })
    }

    /// Passes through to the raw codec, which sizes the on-chain shape.
    pub fn max_encoding_size(&self, n: usize, item_type: &str) -> Result<usize, CodecError> {
        self.codec.max_encoding_size(n, item_type)
    }

    pub fn max_decoding_size(&self, n: usize, item_type: &str) -> Result<usize, CodecError> {
        self.codec.max_decoding_size(n, item_type)
    }
}

impl<C: Codec> Codec for ModifierCodec<C> {
    fn encode(&self, item: Option<&Value>, item_type: &str) -> Result<Vec<u8>, CodecError> {
        self.encode_value(item, item_type)
    }

    fn decode(&self, raw: &[u8], item_type: &str) -> Result<Value, CodecError> {
        self.decode_value(raw, item_type)
    }

    fn create_type(&self, item_type: &str, for_encoding: bool) -> Result<Type, CodecError> {
        ModifierCodec::create_type(self, item_type, for_encoding)
    }

    fn max_encoding_size(&self, n: usize, item_type: &str) -> Result<usize, CodecError> {
        ModifierCodec::max_encoding_size(self, n, item_type)
    }

    fn max_decoding_size(&self, n: usize, item_type: &str) -> Result<usize, CodecError> {
        ModifierCodec::max_decoding_size(self, n, item_type)
    }
}
