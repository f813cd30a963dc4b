//! The codec-facing construction and serialization protocol.
//!
//! Wire adapters live in their own crate; this module fixes the parts of
//! the protocol every adapter shares: which entries an encoding includes
//! under each style, and how decoded entries flow into a builder with
//! per-property validation.

use crate::error::CastError;
use crate::grain::{Grain, GrainBuilder, GrainFactory};
use crate::transform::{Transform, TransformFactory};
use crate::value::Value;

/// How much of a grain an encoding writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodeStyle {
    /// Every basis entry, plus non-null extensions.
    #[default]
    Dense,
    /// Basis entries differing from their schema default, plus non-null
    /// extensions. An all-default grain encodes to nothing.
    Sparse,
}

/// The entries an encoding of `grain` includes, in iteration order:
/// basis first, then extensions. Null-valued extensions never encode;
/// sparse style also drops basis entries equal to their schema default.
pub fn wire_entries(grain: &Grain, style: EncodeStyle) -> impl Iterator<Item = (&str, &Value)> {
    let basis_len = grain.schema().basis_len();
    grain.iter().enumerate().filter_map(move |(i, (k, v))| {
        if i < basis_len {
            match style {
                EncodeStyle::Dense => Some((k, v)),
                EncodeStyle::Sparse => {
                    // SAFETY: i < basis_len, so a default exists for the slot
                    let default = grain.schema().default_at(i).unwrap();
                    (v != default).then_some((k, v))
                }
            }
        } else {
            (!v.is_null()).then_some((k, v))
        }
    })
}

/// Assembles a grain from decoded key/value pairs.
///
/// The builder starts from the factory's default grain, so keys a sparse
/// encoding dropped come back at their defaults. Basis values run through
/// their property's validating transform; null extensions are dropped,
/// explicit basis nulls are kept.
pub struct GrainAssembler {
    builder: GrainBuilder,
    transforms: Vec<Option<Transform>>,
}

impl GrainAssembler {
    pub fn new(factory: &dyn GrainFactory) -> GrainAssembler {
        GrainAssembler::with_transforms(factory, &TransformFactory::new())
    }

    pub fn with_transforms(
        factory: &dyn GrainFactory,
        transforms: &TransformFactory,
    ) -> GrainAssembler {
        let builder = factory.builder_of(&factory.default_grain());
        let transforms = factory
            .schema()
            .properties()
            .iter()
            .map(|p| transforms.transform_for(p.ty()).ok())
            .collect();
        GrainAssembler {
            builder,
            transforms,
        }
    }

    pub fn schema(&self) -> &crate::grain::GrainSchema {
        self.builder.schema()
    }

    /// Whether `key` is a basis property of the schema being assembled.
    pub fn is_basis(&self, key: &str) -> bool {
        self.builder.schema().is_basis(key)
    }

    /// The declared immutable type display of a basis property, if any.
    pub fn basis_type(&self, key: &str) -> Option<String> {
        self.builder
            .schema()
            .property(key)
            .map(|p| p.ty().to_string())
    }

    /// Routes a decoded pair to the right partition. Basis values are
    /// validated against the property's transform and kept even when null;
    /// null extensions are dropped.
    pub fn put(&mut self, key: &str, value: Value) -> Result<(), CastError> {
        match self.builder.schema().slot(key) {
            Some(slot) => {
                let value = match &self.transforms[slot] {
                    Some(t) => t.apply(value)?,
                    None if value.is_null() => value,
                    None => {
                        return Err(CastError::Mismatch {
                            expected: self.builder.schema().properties()[slot].ty().to_string(),
                            actual: value.type_name().to_owned(),
                        })
                    }
                };
                self.builder.put(key.to_owned(), value);
                Ok(())
            }
            None => {
                self.put_extension(key, value);
                Ok(())
            }
        }
    }

    /// Stores a decoded extension pair; nulls are dropped.
    pub fn put_extension(&mut self, key: &str, value: Value) {
        if value.is_null() {
            return;
        }
        self.builder.put(key.to_owned(), value);
    }

    pub fn finish(self) -> Grain {
        self.builder.build()
    }
}

/// A wire format binding for grains.
pub trait GrainCodec {
    /// The encoded representation.
    type Wire;
    type Error;

    fn encode(&self, grain: &Grain, style: EncodeStyle) -> Self::Wire;

    fn decode(&self, factory: &dyn GrainFactory, wire: &Self::Wire) -> Result<Grain, Self::Error>;
}
