//! grain-core: the grain runtime library.
//!
//! Provides the immutable structural record model (grain + builder), the
//! const collections backing its views, the reflect type graph consumed
//! by the generator, and the validating-cast and codec protocol shared by
//! wire adapters.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`Grain`] / [`GrainBuilder`] -- the record and its mutable builder
//! - [`GrainSchema`] / [`GrainProperty`] -- per-schema basis descriptors
//! - [`GrainFactory`] / [`register_factory`] -- per-schema entry points
//! - [`Value`] -- runtime slot values
//! - [`Type`] / [`TypeUniverse`] -- the reflect type graph
//! - [`Transform`] / [`TransformFactory`] -- validating casts
//!
//! Module-level items (const collections, the codec protocol, error
//! types) stay under their modules.

pub mod codec;
pub mod collect;
pub mod error;
pub mod grain;
pub mod reflect;
pub mod transform;
pub mod value;

// ── Convenience re-exports: key types ────────────────────────────────

pub use error::{CastError, GrainError, ReflectError, TransformError};
pub use grain::{
    factory_for, factory_for_grain, register_factory, BasicGrainFactory, Grain, GrainBuilder,
    GrainFactory, GrainProperty, GrainSchema,
};
pub use reflect::{Type, TypeUniverse};
pub use transform::{Transform, TransformFactory};
pub use value::Value;
