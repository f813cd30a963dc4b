//! Decode error taxonomy shared by the wire adapters.

use grain_core::error::CastError;

/// Why a wire form did not decode into a grain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// A basis value failed its property's validating cast.
    #[error("property '{key}': {source}")]
    Cast {
        key: String,
        #[source]
        source: CastError,
    },

    /// The wire form is structurally invalid for this codec.
    #[error("malformed input: {message}")]
    Malformed { message: String },

    /// The input ended before the announced content did.
    #[error("truncated input at byte {at}")]
    Truncated { at: usize },

    /// An unrecognized value tag byte.
    #[error("unknown value tag {tag:#04x} at byte {at}")]
    UnknownTag { tag: u8, at: usize },

    /// The wire names a schema with no registered factory.
    #[error("no registered factory for schema '{schema}'")]
    UnknownSchema { schema: String },

    /// The wire's schema name is not the factory's.
    #[error("wire schema '{wire}' does not match factory schema '{factory}'")]
    SchemaMismatch { wire: String, factory: String },
}

impl CodecError {
    pub(crate) fn malformed(message: impl Into<String>) -> CodecError {
        CodecError::Malformed {
            message: message.into(),
        }
    }
}
