//! Generator error taxonomy. The driver collects these per run instead of
//! stopping at the first one.

use grain_core::error::ReflectError;

/// A type with no immutable form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImmutifyError {
    /// Raw const containers have an implicit unbounded element type.
    #[error("raw const container '{type_display}' is not immutable")]
    RawConstContainer { type_display: String },

    /// Arrays are never immutable, whatever their element type.
    #[error("array type '{type_display}' is not immutable")]
    Array { type_display: String },

    /// Lower-bounded and unbounded wildcards admit arbitrary mutable types.
    #[error("open wildcard '{type_display}' has no immutable form")]
    OpenWildcard { type_display: String },

    /// Bare type variables are unresolved at generation time.
    #[error("type variable '{type_display}' has no immutable form")]
    TypeVariable { type_display: String },

    /// Plain classes, raw mutable containers, and unregistered interfaces.
    #[error("no registered immutable form for '{type_display}'")]
    Unregistered { type_display: String },
}

/// An invalid policy registration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// A mapping target must narrow its source.
    #[error("mapping target '{target}' is not a subtype of source '{source}'")]
    NotNarrowing { r#source: String, target: String },

    /// Mappings may only name declared types.
    #[error("unknown declaration '{name}' in mapping")]
    UnknownDeclaration { name: String },
}

/// A per-schema generation failure. The driver returns every error it
/// found across the whole run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("unknown schema '{name}'")]
    UnknownSchema { name: String },

    #[error("schema '{name}' requested twice in one run")]
    DuplicateSchema { name: String },

    /// Two same-level declarations of one property with types neither of
    /// which subsumes the others.
    #[error("schema '{schema}': property '{name}' declared with conflicting types {types:?}")]
    AmbiguousProperty {
        schema: String,
        name: String,
        types: Vec<String>,
    },

    /// An accessor signature referenced a type missing from the universe.
    #[error("schema '{schema}': accessor '{method}' references unknown type '{type_name}'")]
    UnknownTypeInSignature {
        schema: String,
        method: String,
        type_name: String,
    },

    /// Cooking a declared property type failed.
    #[error("schema '{schema}': property '{property}': {source}")]
    Cook {
        schema: String,
        property: String,
        #[source]
        source: ReflectError,
    },

    /// A property type has no immutable form.
    #[error("schema '{schema}': property '{property}': {source}")]
    Immutify {
        schema: String,
        property: String,
        #[source]
        source: ImmutifyError,
    },
}

/// A schema descriptor that does not parse back into an artifact.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed descriptor: {message}")]
pub struct DescriptorError {
    pub message: String,
}

impl From<grain_core::error::ValueParseError> for DescriptorError {
    fn from(e: grain_core::error::ValueParseError) -> DescriptorError {
        DescriptorError {
            message: e.to_string(),
        }
    }
}
