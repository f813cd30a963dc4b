//! grain-generate: the schema-to-grain generator.
//!
//! Consumes schema interface declarations from a `grain_core`
//! [`TypeUniverse`], resolves their properties across the supertype
//! lattice, normalizes and immutabilizes each property type, and produces
//! one [`SchemaArtifact`] per schema: the ordered basis with immutable
//! types and default values, convertible to a runtime `GrainSchema` and
//! to a canonical JSON descriptor.
//!
//! The pipeline, in order: [`symbols`] (collection and resolution) →
//! [`cook`] (wildcard normalization) → [`immutify`] (immutable
//! substitution under a [`TypePolicy`]) → [`artifact`] (defaults and
//! descriptors). [`generate`] drives all of it and collects every error
//! in a batch before reporting.
//!
//! [`TypeUniverse`]: grain_core::TypeUniverse

pub mod artifact;
pub mod cook;
pub mod error;
pub mod generate;
pub mod immutify;
pub mod naming;
pub mod symbols;

pub use artifact::{default_value_for, PropertyArtifact, SchemaArtifact};
pub use cook::cook;
pub use error::{DescriptorError, ImmutifyError, PolicyError, SchemaError};
pub use generate::{generate, install};
pub use immutify::{Immutify, TypePolicy};
pub use symbols::{collect_declared, collect_levels, resolve_properties, ResolvedProperty};
