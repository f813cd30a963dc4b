use std::collections::HashMap;

use crate::error::GrainError;
use crate::reflect::Type;
use crate::value::Value;

/// Property flag bits.
pub mod flags {
    /// The accessor used the `isX` boolean form rather than `getX`.
    pub const IS_PROPERTY: u8 = 1 << 0;
}

/// One resolved basis property: its key, its immutable runtime type, and
/// the accessor flags recorded by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrainProperty {
    name: String,
    ty: Type,
    flags: u8,
}

impl GrainProperty {
    pub fn new(name: impl Into<String>, ty: Type) -> GrainProperty {
        GrainProperty {
            name: name.into(),
            ty,
            flags: 0,
        }
    }

    pub fn with_flags(mut self, flags: u8) -> GrainProperty {
        self.flags = flags;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn is_bool_property(&self) -> bool {
        self.flags & flags::IS_PROPERTY != 0
    }
}

/// The per-schema descriptor every grain and builder carries: the ordered
/// basis property list, the name→slot index, and the per-slot default
/// values used by factories and sparse encoders.
#[derive(Debug)]
pub struct GrainSchema {
    name: String,
    grain_name: String,
    properties: Vec<GrainProperty>,
    index: HashMap<String, usize>,
    defaults: Vec<Value>,
}

impl GrainSchema {
    /// Builds a schema descriptor. Property names must be unique and the
    /// default list must be slot-aligned with the property list.
    pub fn new(
        name: impl Into<String>,
        grain_name: impl Into<String>,
        properties: Vec<GrainProperty>,
        defaults: Vec<Value>,
    ) -> Result<GrainSchema, GrainError> {
        let name = name.into();
        if properties.len() != defaults.len() {
            return Err(GrainError::DefaultCountMismatch {
                schema: name,
                properties: properties.len(),
                defaults: defaults.len(),
            });
        }
        let mut index = HashMap::with_capacity(properties.len());
        for (slot, p) in properties.iter().enumerate() {
            if index.insert(p.name.clone(), slot).is_some() {
                return Err(GrainError::DuplicateProperty {
                    schema: name,
                    name: p.name.clone(),
                });
            }
        }
        Ok(GrainSchema {
            name,
            grain_name: grain_name.into(),
            properties,
            index,
            defaults,
        })
    }

    /// The source schema interface name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The conventional generated grain type name.
    pub fn grain_name(&self) -> &str {
        &self.grain_name
    }

    pub fn properties(&self) -> &[GrainProperty] {
        &self.properties
    }

    /// Number of basis slots.
    pub fn basis_len(&self) -> usize {
        self.properties.len()
    }

    /// The slot index of a basis property name.
    pub fn slot(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn is_basis(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn property(&self, name: &str) -> Option<&GrainProperty> {
        self.slot(name).map(|at| &self.properties[at])
    }

    /// The default value for a slot.
    pub fn default_at(&self, slot: usize) -> Option<&Value> {
        self.defaults.get(slot)
    }

    pub fn defaults(&self) -> &[Value] {
        &self.defaults
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::names;

    fn prop(name: &str, ty: &str) -> GrainProperty {
        GrainProperty::new(name, Type::named(ty))
    }

    #[test]
    fn schema_indexes_slots_in_order() {
        let s = GrainSchema::new(
            "Point",
            "PointGrain",
            vec![prop("x", names::INT64), prop("y", names::INT64)],
            vec![Value::Int(0), Value::Int(0)],
        )
        .unwrap();
        assert_eq!(s.slot("x"), Some(0));
        assert_eq!(s.slot("y"), Some(1));
        assert_eq!(s.slot("z"), None);
        assert_eq!(s.basis_len(), 2);
    }

    #[test]
    fn duplicate_property_rejected() {
        let err = GrainSchema::new(
            "Point",
            "PointGrain",
            vec![prop("x", names::INT64), prop("x", names::INT64)],
            vec![Value::Int(0), Value::Int(0)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            GrainError::DuplicateProperty {
                schema: "Point".into(),
                name: "x".into()
            }
        );
    }

    #[test]
    fn misaligned_defaults_rejected() {
        let err = GrainSchema::new(
            "Point",
            "PointGrain",
            vec![prop("x", names::INT64)],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, GrainError::DefaultCountMismatch { .. }));
    }
}
