//! Error types shared across the grain runtime.

/// Errors raised by the grain runtime data model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrainError {
    /// A checked cursor was advanced past the last entry.
    #[error("no more entries: cursor advanced past the end")]
    IteratorExhausted,

    /// A cursor accessor was used before the first `next_entry` call.
    #[error("cursor not positioned: call next_entry first")]
    CursorNotPositioned,

    /// A schema was constructed with two properties sharing a name.
    #[error("duplicate basis property '{name}' in schema '{schema}'")]
    DuplicateProperty { schema: String, name: String },

    /// A schema was constructed with mismatched property/default counts.
    #[error("schema '{schema}': {properties} properties but {defaults} defaults")]
    DefaultCountMismatch {
        schema: String,
        properties: usize,
        defaults: usize,
    },
}

/// Errors raised by reflect operations on the type universe.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReflectError {
    /// A type referenced a declaration name absent from the universe.
    #[error("unknown declaration '{name}'")]
    UnknownDeclaration { name: String },

    /// A declaration was registered twice.
    #[error("declaration '{name}' already exists")]
    DuplicateDeclaration { name: String },

    /// A parameterized type's argument count does not match the declaration.
    #[error("'{name}' declares {expected} type parameters, got {actual} arguments")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// A value failed a validating cast built by the transform factory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CastError {
    /// The value's runtime shape does not match the target type.
    #[error("expected {expected}, got {actual}")]
    Mismatch { expected: String, actual: String },

    /// A nested element/key/value failed the check.
    #[error("{at}: expected {expected}, got {actual}")]
    Element {
        at: String,
        expected: String,
        actual: String,
    },
}

/// The transform factory cannot build a cast for the target type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    /// No runtime value can inhabit the target type.
    #[error("no runtime representation for type {type_display}")]
    Uninhabited { type_display: String },
}

/// The kind-tagged JSON form of a value could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed tagged value: {message}")]
pub struct ValueParseError {
    pub message: String,
}
