//! A JSON-backed raw codec for tests.

use rustc_hash::FxHashMap;

use crate::codec::Codec;
use crate::convert::{from_json, DecodeHooks};
use crate::error::CodecError;
use crate::model::{Type, Value};

/// Encodes on-chain values as JSON text. Decoding converts the JSON back into
/// the registered shape, so values round-trip exactly.
#[derive(Debug, Default)]
pub(crate) struct JsonCodec {
    types: FxHashMap<String, Type>,
}

impl JsonCodec {
    pub fn new<'a>(types: impl IntoIterator<Item = (&'a str, Type)>) -> Self {
        Self {
            types: types.into_iter().map(|(name, ty)| (name.to_string(), ty)).collect(),
        }
    }

    fn shape(&self, item_type: &str) -> Result<&Type, CodecError> {
        self.types
            .get(item_type)
            .ok_or_else(|| CodecError::UnknownItemType {
                item_type: item_type.to_string(),
            })
    }
}

impl Codec for JsonCodec {
    fn encode(&self, item: Option<&Value>, item_type: &str) -> Result<Vec<u8>, CodecError> {
        let ty = self.shape(item_type)?;
        let value = match item {
            Some(value) => {
                value.check(ty)?;
                value.clone()
            }
            None => ty.zero_value(),
        };
        serde_json::to_vec(&value).map_err(|e| CodecError::InvalidEncoding(e.to_string()))
    }

    fn decode(&self, raw: &[u8], item_type: &str) -> Result<Value, CodecError> {
        let ty = self.shape(item_type)?;
        let json: serde_json::Value =
            serde_json::from_slice(raw).map_err(|e| CodecError::InvalidEncoding(e.to_string()))?;
        from_json(&json, ty, &DecodeHooks::standard())
    }

    fn create_type(&self, item_type: &str, _for_encoding: bool) -> Result<Type, CodecError> {
        self.shape(item_type).cloned()
    }

    fn max_encoding_size(&self, n: usize, item_type: &str) -> Result<usize, CodecError> {
        self.shape(item_type)?;
        Ok(n * 10)
    }

    fn max_decoding_size(&self, n: usize, item_type: &str) -> Result<usize, CodecError> {
        self.shape(item_type)?;
        Ok(n * 20)
    }
}
