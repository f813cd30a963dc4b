//! Wire adapters for grains.
//!
//! Two bindings of the shared encoding protocol from
//! [`grain_core::codec`]:
//!
//! - [`json`]: grains as JSON object trees, nesting grain values as
//!   objects and decoding basis values by declared type.
//! - [`tuple`]: a compact binary stream of `(name, tagged value)` pairs
//!   with an embedded schema name.
//!
//! Both honor dense and sparse [`EncodeStyle`]s, restore
//! sparse-dropped properties from schema defaults, validate decoded
//! basis values through [`TransformFactory`] casts, and report failures
//! with the offending property key.

pub mod error;
pub mod json;
pub mod tuple;

pub use error::CodecError;
pub use json::JsonCodec;
pub use tuple::TupleCodec;

pub use grain_core::codec::{EncodeStyle, GrainCodec};
pub use grain_core::transform::TransformFactory;
