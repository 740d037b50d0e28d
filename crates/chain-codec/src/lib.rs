//! Schema-driven modifiers between on-chain ABI shapes and off-chain representations.
//!
//! A raw codec (an ABI packer, for example) encodes and decodes values of a
//! fixed on-chain shape per item type. Callers usually want something else:
//! renamed fields, timestamps instead of epoch integers, constants filled in,
//! single elements instead of arrays. This crate describes those differences
//! as composable [`Modifier`](modifier::Modifier)s and wraps the raw codec in
//! a [`ModifierCodec`](codec::ModifierCodec) so callers only ever see the
//! off-chain shape.
//!
//! # Quick Start
//!
//! ```rust
//! use chain_codec::model::{StructValue, Type, Value};
//! use chain_codec::modifier::{Modifier, Renamer};
//!
//! let on_chain = Type::structure([
//!     ("A", Type::String),
//!     ("B", Type::int(64)),
//!     ("C", Type::int(64)),
//! ]);
//!
//! let mut renamer = Renamer::new([("A", "X"), ("C", "Z")])?;
//! let off_chain = renamer.retype_to_off_chain(&on_chain, "Item")?;
//! assert_eq!(off_chain.to_string(), "struct { X string; B int64; Z int64 }");
//!
//! let value = Value::Struct(StructValue::new().with("A", "foo").with("B", 10i64).with("C", 20i64));
//! let off = renamer.transform_to_off_chain(value.clone(), "Item")?;
//! assert_eq!(renamer.transform_to_on_chain(off, "Item")?, value);
//! # Ok::<(), chain_codec::CodecError>(())
//! ```
//!
//! # Modules
//!
//! - [`model`]: Types, values and field paths
//! - [`convert`]: Structural conversion with decode hooks
//! - [`modifier`]: Rename, drop, hard code, extract, epoch-to-time, wrapper, composition
//! - [`config`]: JSON modifier configuration
//! - [`codec`]: Raw codec contract, `ModifierCodec` and size estimation
//! - [`error`]: Error types
//!
//! # Lifecycle
//!
//! Modifiers are retyped once per item type at startup and are read-only
//! afterwards. `ModifierCodec::new` retypes every item type it is given, so
//! configuration errors surface before the first encode or decode.

pub mod codec;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod modifier;
pub mod util;

// Re-export commonly used types at crate root
pub use codec::{max_size, Codec, ModifierCodec};
pub use config::{ItemTypeModifiersConfig, ModifierConfig, ModifiersConfig};
pub use convert::{convert, DecodeHooks};
pub use error::{CodecError, ErrorKind};
pub use model::{Field, FieldPath, StructType, StructValue, Type, Value};
pub use modifier::{
    ByItemTypeModifier, Dropper, ElementExtractor, ElementLocation, EpochToTimeModifier, HardCoder,
    Modifier, MultiModifier, PropertyExtractor, Renamer, WrapperModifier,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
