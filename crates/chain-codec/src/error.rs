//! Error types for retyping, transforming and encoding.

use thiserror::Error;

/// Error classes that callers match on, independent of the context an error carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Shape or field mismatch, or an unknown item type.
    InvalidType,
    /// A modifier could not be constructed from its configuration.
    InvalidConfig,
    /// An array was given a value with the wrong number of elements.
    SliceWrongLen,
    /// The raw codec reported malformed bytes.
    InvalidEncoding,
}

impl ErrorKind {
    /// Returns the stable identifier for this kind (e.g., "invalid type").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidType => "invalid type",
            ErrorKind::InvalidConfig => "invalid config",
            ErrorKind::SliceWrongLen => "slice wrong length",
            ErrorKind::InvalidEncoding => "invalid encoding",
        }
    }
}

/// Error produced anywhere in the modifier and codec pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    // === InvalidType ===
    #[error("invalid type: unknown item type {item_type}")]
    UnknownItemType { item_type: String },

    #[error("invalid type: item type {item_type} has not been retyped")]
    NotRetyped { item_type: String },

    #[error("invalid type: cannot find field {path}")]
    FieldNotFound { path: String },

    #[error("invalid type: field name {name} is used more than once")]
    FieldCollision { name: String },

    #[error("invalid type: {at}: expected {expected}, found {found}")]
    TypeMismatch {
        at: String,
        expected: String,
        found: String,
    },

    #[error("invalid type: {at} must be a struct or a pointer, slice or array of structs, found {found}")]
    NotAStruct { at: String, found: String },

    #[error("invalid type: field {path} has unsupported type {found}, expected {expected}")]
    UnsupportedField {
        path: String,
        found: String,
        expected: &'static str,
    },

    #[error("invalid type: cannot change the type of field {path} without hard-coding its on-chain value")]
    UnrecoverableField { path: String },

    #[error("invalid type: {value} does not fit in {target}")]
    Overflow { value: String, target: String },

    #[error("invalid type: cannot convert {from} to {to}: {reason}")]
    Conversion {
        from: String,
        to: String,
        reason: String,
    },

    #[error("invalid type: dynamic type {ty} is not allowed in a nested position")]
    NestedDynamic { ty: String },

    // === InvalidConfig ===
    #[error("invalid config: {path} is configured together with its parent {parent}")]
    AmbiguousPath { path: String, parent: String },

    #[error("invalid config: malformed field path {path:?}")]
    InvalidPath { path: String },

    #[error("invalid config: invalid field name {name:?}")]
    InvalidFieldName { name: String },

    #[error("invalid config: item type {item_type} is registered more than once")]
    DuplicateItemType { item_type: String },

    #[error("invalid config: unknown element location {location:?}")]
    InvalidLocation { location: String },

    #[error("invalid config: {0}")]
    Config(String),

    // === SliceWrongLen ===
    #[error("slice wrong length: expected {expected} elements, found {found}")]
    SliceWrongLen { expected: usize, found: usize },

    // === InvalidEncoding ===
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Any of the above with caller-supplied context.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<CodecError>,
    },
}

impl CodecError {
    /// Returns the class of this error, looking through any added context.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::UnknownItemType { .. }
            | CodecError::NotRetyped { .. }
            | CodecError::FieldNotFound { .. }
            | CodecError::FieldCollision { .. }
            | CodecError::TypeMismatch { .. }
            | CodecError::NotAStruct { .. }
            | CodecError::UnsupportedField { .. }
            | CodecError::UnrecoverableField { .. }
            | CodecError::Overflow { .. }
            | CodecError::Conversion { .. }
            | CodecError::NestedDynamic { .. } => ErrorKind::InvalidType,
            CodecError::AmbiguousPath { .. }
            | CodecError::InvalidPath { .. }
            | CodecError::InvalidFieldName { .. }
            | CodecError::DuplicateItemType { .. }
            | CodecError::InvalidLocation { .. }
            | CodecError::Config(_) => ErrorKind::InvalidConfig,
            CodecError::SliceWrongLen { .. } => ErrorKind::SliceWrongLen,
            CodecError::InvalidEncoding(_) => ErrorKind::InvalidEncoding,
            CodecError::Context { source, .. } => source.kind(),
        }
    }

    /// Returns true if this error belongs to `kind`.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }

    /// Wraps the error with context while keeping its kind.
    pub fn context(self, context: impl Into<String>) -> Self {
        CodecError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_survives_context() {
        let err = CodecError::FieldNotFound { path: "A.B".into() }
            .context("retyping Trade")
            .context("building codec");
        assert_eq!(err.kind(), ErrorKind::InvalidType);
        assert!(err.is(ErrorKind::InvalidType));
        assert_eq!(
            err.to_string(),
            "building codec: retyping Trade: invalid type: cannot find field A.B"
        );
    }

    #[test]
    fn test_kind_codes() {
        assert_eq!(
            CodecError::AmbiguousPath { path: "A.Z".into(), parent: "A".into() }.kind(),
            ErrorKind::InvalidConfig
        );
        assert_eq!(
            CodecError::SliceWrongLen { expected: 3, found: 2 }.kind().code(),
            "slice wrong length"
        );
        assert_eq!(
            CodecError::InvalidEncoding("short".into()).kind(),
            ErrorKind::InvalidEncoding
        );
    }
}
