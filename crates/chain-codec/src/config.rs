//! Declarative modifier configuration.
//!
//! A chain is a JSON array of objects, each with a `"Type"` discriminator
//! (matched case-insensitively) and PascalCase settings:
//!
//! ```json
//! [
//!   { "Type": "rename", "Fields": { "Account": "Owner" } },
//!   { "Type": "Epoch To Time", "Fields": ["Meta.Ts"] },
//!   { "Type": "hard code", "OffChainValues": { "Source": "chain" } }
//! ]
//! ```
//!
//! Loading the JSON from files or the environment is left to the caller.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::CodecError;
use crate::modifier::{
    ByItemTypeModifier, Dropper, ElementExtractor, ElementLocation, EpochToTimeModifier, HardCoder,
    Modifier, MultiModifier, PropertyExtractor, Renamer, WrapperModifier,
};

// =============================================================================
// Individual modifiers
// =============================================================================

/// `{"Type": "rename", "Fields": {"on-chain path": "off-chain name"}}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RenameConfig {
    pub fields: BTreeMap<String, String>,
}

impl RenameConfig {
    pub fn to_modifier(&self) -> Result<Renamer, CodecError> {
        Renamer::new(&self.fields)
    }
}

/// `{"Type": "drop", "Fields": ["path", ...]}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DropConfig {
    pub fields: Vec<String>,
}

impl DropConfig {
    pub fn to_modifier(&self) -> Result<Dropper, CodecError> {
        Dropper::new(&self.fields)
    }
}

/// `{"Type": "hard code", "OnChainValues": {...}, "OffChainValues": {...}}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HardCodeConfig {
    #[serde(default)]
    pub on_chain_values: BTreeMap<String, JsonValue>,
    #[serde(default)]
    pub off_chain_values: BTreeMap<String, JsonValue>,
}

impl HardCodeConfig {
    pub fn to_modifier(&self) -> Result<HardCoder, CodecError> {
        HardCoder::new(
            self.on_chain_values.iter().map(|(k, v)| (k.as_str(), v.clone())),
            self.off_chain_values.iter().map(|(k, v)| (k.as_str(), v.clone())),
        )
    }
}

/// `{"Type": "extract element", "Extractions": {"path": "first" | "middle" | "last"}}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ElementExtractorConfig {
    pub extractions: BTreeMap<String, ElementLocation>,
}

impl ElementExtractorConfig {
    pub fn to_modifier(&self) -> Result<ElementExtractor, CodecError> {
        ElementExtractor::new(self.extractions.iter().map(|(k, v)| (k.as_str(), *v)))
    }
}

/// `{"Type": "extract property", "FieldName": "B.C"}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PropertyExtractorConfig {
    pub field_name: String,
}

impl PropertyExtractorConfig {
    pub fn to_modifier(&self) -> Result<PropertyExtractor, CodecError> {
        PropertyExtractor::new(&self.field_name)
    }
}

/// `{"Type": "epoch to time", "Fields": ["path", ...]}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EpochToTimeConfig {
    pub fields: Vec<String>,
}

impl EpochToTimeConfig {
    pub fn to_modifier(&self) -> Result<EpochToTimeModifier, CodecError> {
        EpochToTimeModifier::new(&self.fields)
    }
}

/// `{"Type": "wrapper", "Fields": {"path": "wrapper field name"}}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WrapperConfig {
    pub fields: BTreeMap<String, String>,
}

impl WrapperConfig {
    pub fn to_modifier(&self) -> Result<WrapperModifier, CodecError> {
        WrapperModifier::new(&self.fields)
    }
}

// =============================================================================
// Tagged union
// =============================================================================

/// One modifier in a chain, tagged by `"Type"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "Type")]
pub enum ModifierConfig {
    #[serde(rename = "rename")]
    Rename(RenameConfig),
    #[serde(rename = "drop")]
    Drop(DropConfig),
    #[serde(rename = "hard code")]
    HardCode(HardCodeConfig),
    #[serde(rename = "extract element")]
    ExtractElement(ElementExtractorConfig),
    #[serde(rename = "extract property")]
    ExtractProperty(PropertyExtractorConfig),
    #[serde(rename = "epoch to time")]
    EpochToTime(EpochToTimeConfig),
    #[serde(rename = "wrapper")]
    Wrapper(WrapperConfig),
}

const MODIFIER_TYPES: &[&str] = &[
    "rename",
    "drop",
    "hard code",
    "extract element",
    "extract property",
    "epoch to time",
    "wrapper",
];

impl ModifierConfig {
    /// Returns the canonical `"Type"` string.
    pub fn type_name(&self) -> &'static str {
        match self {
            ModifierConfig::Rename(_) => "rename",
            ModifierConfig::Drop(_) => "drop",
            ModifierConfig::HardCode(_) => "hard code",
            ModifierConfig::ExtractElement(_) => "extract element",
            ModifierConfig::ExtractProperty(_) => "extract property",
            ModifierConfig::EpochToTime(_) => "epoch to time",
            ModifierConfig::Wrapper(_) => "wrapper",
        }
    }

    /// Builds the configured modifier.
    pub fn to_modifier(&self) -> Result<Box<dyn Modifier>, CodecError> {
        let modifier: Box<dyn Modifier> = match self {
            ModifierConfig::Rename(c) => Box::new(c.to_modifier()?),
            ModifierConfig::Drop(c) => Box::new(c.to_modifier()?),
            ModifierConfig::HardCode(c) => Box::new(c.to_modifier()?),
            ModifierConfig::ExtractElement(c) => Box::new(c.to_modifier()?),
            ModifierConfig::ExtractProperty(c) => Box::new(c.to_modifier()?),
            ModifierConfig::EpochToTime(c) => Box::new(c.to_modifier()?),
            ModifierConfig::Wrapper(c) => Box::new(c.to_modifier()?),
        };
        Ok(modifier)
    }
}

impl<'de> Deserialize<'de> for ModifierConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut body = serde_json::Map::<String, JsonValue>::deserialize(deserializer)?;
        let key = body
            .keys()
            .find(|k| k.eq_ignore_ascii_case("type"))
            .cloned()
            .ok_or_else(|| D::Error::missing_field("Type"))?;
        let tag = match body.remove(&key) {
            Some(JsonValue::String(tag)) => tag,
            _ => return Err(D::Error::custom("modifier \"Type\" must be a string")),
        };
        let body = JsonValue::Object(body);
        let config = match tag.to_ascii_lowercase().as_str() {
            "rename" => serde_json::from_value(body).map(ModifierConfig::Rename),
            "drop" => serde_json::from_value(body).map(ModifierConfig::Drop),
            "hard code" => serde_json::from_value(body).map(ModifierConfig::HardCode),
            "extract element" => serde_json::from_value(body).map(ModifierConfig::ExtractElement),
            "extract property" => serde_json::from_value(body).map(ModifierConfig::ExtractProperty),
            "epoch to time" => serde_json::from_value(body).map(ModifierConfig::EpochToTime),
            "wrapper" => serde_json::from_value(body).map(ModifierConfig::Wrapper),
            _ => return Err(D::Error::unknown_variant(&tag, MODIFIER_TYPES)),
        };
        config.map_err(|e| D::Error::custom(format!("{} modifier: {}", tag, e)))
    }
}

// =============================================================================
// Chains
// =============================================================================

/// An ordered modifier chain.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifiersConfig(pub Vec<ModifierConfig>);

impl ModifiersConfig {
    /// Parses a chain from JSON.
    pub fn from_json(json: &str) -> Result<Self, CodecError> {
        serde_json::from_str(json).map_err(|e| CodecError::Config(e.to_string()))
    }

    /// Serializes the chain to JSON.
    pub fn to_json(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(|e| CodecError::Config(e.to_string()))
    }

    /// Builds every modifier in order.
    pub fn to_modifier(&self) -> Result<MultiModifier, CodecError> {
        let modifiers = self
            .0
            .iter()
            .enumerate()
            .map(|(i, config)| {
                config
                    .to_modifier()
                    .map_err(|e| e.context(format!("modifier {} ({})", i, config.type_name())))
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!(modifiers = modifiers.len(), "built modifier chain");
        Ok(MultiModifier::new(modifiers))
    }
}

/// Modifier chains keyed by item type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemTypeModifiersConfig(pub BTreeMap<String, ModifiersConfig>);

impl ItemTypeModifiersConfig {
    pub fn from_json(json: &str) -> Result<Self, CodecError> {
        serde_json::from_str(json).map_err(|e| CodecError::Config(e.to_string()))
    }

    /// Builds a dispatcher with one chain per item type.
    pub fn to_modifier(&self) -> Result<ByItemTypeModifier, CodecError> {
        let mut modifiers = Vec::with_capacity(self.0.len());
        for (item_type, chain) in &self.0 {
            let modifier = chain
                .to_modifier()
                .map_err(|e| e.context(format!("item type {}", item_type)))?;
            modifiers.push((item_type.clone(), Box::new(modifier) as Box<dyn Modifier>));
        }
        ByItemTypeModifier::new(modifiers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::model::{StructValue, Type, Value};
    use serde_json::json;

    fn full_chain() -> ModifiersConfig {
        ModifiersConfig(vec![
            ModifierConfig::Rename(RenameConfig {
                fields: BTreeMap::from([("A".to_string(), "X".to_string())]),
            }),
            ModifierConfig::Drop(DropConfig {
                fields: vec!["B".to_string()],
            }),
            ModifierConfig::HardCode(HardCodeConfig {
                on_chain_values: BTreeMap::from([("C".to_string(), json!(1))]),
                off_chain_values: BTreeMap::from([("D".to_string(), json!({"E": [1, 2]}))]),
            }),
            ModifierConfig::ExtractElement(ElementExtractorConfig {
                extractions: BTreeMap::from([("F".to_string(), ElementLocation::Middle)]),
            }),
            ModifierConfig::ExtractProperty(PropertyExtractorConfig {
                field_name: "G.H".to_string(),
            }),
            ModifierConfig::EpochToTime(EpochToTimeConfig {
                fields: vec!["T".to_string()],
            }),
            ModifierConfig::Wrapper(WrapperConfig {
                fields: BTreeMap::from([("W".to_string(), "Inner".to_string())]),
            }),
        ])
    }

    #[test]
    fn test_json_round_trip() {
        let config = full_chain();
        let json = config.to_json().unwrap();
        let parsed = ModifiersConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);

        let value: JsonValue = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["Type"], "rename");
        assert_eq!(value[2]["OffChainValues"]["D"], json!({"E": [1, 2]}));
        assert_eq!(value[3]["Extractions"]["F"], "middle");
    }

    #[test]
    fn test_discriminator_is_case_insensitive() {
        let json = r#"[
            {"Type": "RENAME", "Fields": {"A": "X"}},
            {"type": "Epoch To Time", "Fields": ["T"]},
            {"TYPE": "Extract Element", "Extractions": {"F": "LAST"}},
            {"Type": "Hard Code", "OffChainValues": {"S": "chain"}}
        ]"#;
        let config = ModifiersConfig::from_json(json).unwrap();
        let names: Vec<&str> = config.0.iter().map(ModifierConfig::type_name).collect();
        assert_eq!(names, ["rename", "epoch to time", "extract element", "hard code"]);
        assert_eq!(
            config.0[2],
            ModifierConfig::ExtractElement(ElementExtractorConfig {
                extractions: BTreeMap::from([("F".to_string(), ElementLocation::Last)]),
            })
        );
    }

    #[test]
    fn test_unknown_or_missing_type() {
        let err = ModifiersConfig::from_json(r#"[{"Type": "shuffle"}]"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
        assert!(err.to_string().contains("shuffle"));

        assert!(ModifiersConfig::from_json(r#"[{"Fields": ["A"]}]"#).is_err());
        assert!(ModifiersConfig::from_json(r#"[{"Type": 3}]"#).is_err());
        assert!(ModifiersConfig::from_json(r#"[{"Type": "drop", "Fields": "A"}]"#).is_err());
    }

    #[test]
    fn test_build_chain() {
        let config = ModifiersConfig::from_json(
            r#"[{"Type": "rename", "Fields": {"A": "X"}}, {"Type": "drop", "Fields": ["B"]}]"#,
        )
        .unwrap();
        let mut modifier = config.to_modifier().unwrap();
        assert_eq!(modifier.len(), 2);

        let on = Type::structure([("A", Type::String), ("B", Type::Bool)]);
        let off = modifier.retype_to_off_chain(&on, "Item").unwrap();
        assert_eq!(off, Type::structure([("X", Type::String)]));
        let value = Value::Struct(StructValue::new().with("A", "a").with("B", true));
        assert_eq!(
            modifier.transform_to_off_chain(value, "Item").unwrap(),
            Value::Struct(StructValue::new().with("X", "a"))
        );
    }

    #[test]
    fn test_build_reports_invalid_modifier() {
        let config = ModifiersConfig::from_json(
            r#"[{"Type": "hard code", "OnChainValues": {"A": 1, "A.B": 2}}]"#,
        )
        .unwrap();
        let err = config.to_modifier().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
        assert!(err.to_string().starts_with("modifier 0 (hard code):"));
    }

    #[test]
    fn test_item_type_configs() {
        let config = ItemTypeModifiersConfig::from_json(
            r#"{
                "Transfer": [{"Type": "rename", "Fields": {"A": "From"}}],
                "Approval": [{"Type": "rename", "Fields": {"A": "Owner"}}]
            }"#,
        )
        .unwrap();
        let mut modifier = config.to_modifier().unwrap();
        let on = Type::structure([("A", Type::String)]);
        assert_eq!(
            modifier.retype_to_off_chain(&on, "Approval").unwrap(),
            Type::structure([("Owner", Type::String)])
        );
        let err = modifier.retype_to_off_chain(&on, "Mint").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
    }
}
