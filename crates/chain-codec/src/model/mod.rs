//! Shape and value model.
//!
//! This module contains the types every modifier works on:
//! - Types (struct shapes and the wrappers around them)
//! - Values (dynamic instances of those types)
//! - Field paths (dotted addresses into nested structs)

pub mod path;
pub mod types;
pub mod value;

pub use path::{reject_nested_paths, FieldPath};
pub use types::{Field, StructType, Type};
pub use value::{StructValue, Value};
