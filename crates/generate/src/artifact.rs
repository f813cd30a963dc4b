//! Generator output model: one artifact per schema, convertible to the
//! runtime's `GrainSchema` and to a canonical JSON descriptor.
//!
//! The descriptor form is deterministic: object keys serialize sorted, so
//! two runs over the same universe produce byte-identical descriptors.
//! Types use their structural serde form, defaults the tagged value form.

use grain_core::error::GrainError;
use grain_core::grain::{GrainProperty, GrainSchema};
use grain_core::reflect::{names, Type};
use grain_core::Value;
use rust_decimal::Decimal;
use serde_json::json;

use crate::error::DescriptorError;
use crate::naming;

/// One resolved, cooked, immutified property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyArtifact {
    pub name: String,
    /// The declared type after cooking.
    pub declared: Type,
    /// The immutable runtime type.
    pub immutable: Type,
    /// The slot value a default grain carries.
    pub default: Value,
    pub flags: u8,
}

/// Everything the generator knows about one schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaArtifact {
    pub schema: String,
    pub grain_name: String,
    pub builder_name: String,
    pub factory_name: String,
    pub properties: Vec<PropertyArtifact>,
}

impl SchemaArtifact {
    /// An artifact with the conventional generated-type names.
    pub fn new(schema: impl Into<String>, properties: Vec<PropertyArtifact>) -> SchemaArtifact {
        let schema = schema.into();
        SchemaArtifact {
            grain_name: naming::grain_name(&schema),
            builder_name: naming::builder_name(&schema),
            factory_name: naming::factory_name(&schema),
            schema,
            properties,
        }
    }

    /// The canonical JSON descriptor.
    pub fn to_descriptor(&self) -> serde_json::Value {
        let properties: Vec<serde_json::Value> = self
            .properties
            .iter()
            .map(|p| {
                json!({
                    "name": p.name,
                    "declared": p.declared,
                    "immutable": p.immutable,
                    "default": p.default.to_tagged_json(),
                    "flags": p.flags,
                })
            })
            .collect();
        json!({
            "schema": self.schema,
            "grain": self.grain_name,
            "builder": self.builder_name,
            "factory": self.factory_name,
            "properties": properties,
        })
    }

    /// Parses a descriptor back into an artifact.
    pub fn from_descriptor(v: &serde_json::Value) -> Result<SchemaArtifact, DescriptorError> {
        let mut properties = Vec::new();
        for p in array_field(v, "properties")? {
            properties.push(PropertyArtifact {
                name: str_field(p, "name")?.to_owned(),
                declared: type_field(p, "declared")?,
                immutable: type_field(p, "immutable")?,
                default: Value::from_tagged_json(field(p, "default")?)?,
                flags: flags_field(p)?,
            });
        }
        Ok(SchemaArtifact {
            schema: str_field(v, "schema")?.to_owned(),
            grain_name: str_field(v, "grain")?.to_owned(),
            builder_name: str_field(v, "builder")?.to_owned(),
            factory_name: str_field(v, "factory")?.to_owned(),
            properties,
        })
    }

    /// The runtime schema descriptor this artifact denotes.
    pub fn to_grain_schema(&self) -> Result<GrainSchema, GrainError> {
        let properties = self
            .properties
            .iter()
            .map(|p| GrainProperty::new(&p.name, p.immutable.clone()).with_flags(p.flags))
            .collect();
        let defaults = self.properties.iter().map(|p| p.default.clone()).collect();
        GrainSchema::new(&self.schema, &self.grain_name, properties, defaults)
    }
}

/// The slot value a default grain carries for a property of type `t`:
/// zero for the numeric value types, `false` for `Bool`, `Null` for every
/// reference-like type.
pub fn default_value_for(t: &Type) -> Value {
    let Type::Named(name) = t else {
        return Value::Null;
    };
    match name.as_str() {
        names::INT32 | names::INT64 | names::BIG_INTEGER => Value::Int(0),
        names::FLOAT32 | names::FLOAT64 => Value::Float(0.0),
        names::DECIMAL => Value::Decimal(Decimal::ZERO),
        names::BOOL => Value::Bool(false),
        _ => Value::Null,
    }
}

// ── Descriptor field access ──────────────────────────────────────────

fn field<'a>(v: &'a serde_json::Value, key: &str) -> Result<&'a serde_json::Value, DescriptorError> {
    v.get(key).ok_or_else(|| DescriptorError {
        message: format!("missing '{key}'"),
    })
}

fn str_field<'a>(v: &'a serde_json::Value, key: &str) -> Result<&'a str, DescriptorError> {
    field(v, key)?.as_str().ok_or_else(|| DescriptorError {
        message: format!("'{key}' is not a string"),
    })
}

fn array_field<'a>(
    v: &'a serde_json::Value,
    key: &str,
) -> Result<&'a [serde_json::Value], DescriptorError> {
    field(v, key)?
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| DescriptorError {
            message: format!("'{key}' is not an array"),
        })
}

fn type_field(v: &serde_json::Value, key: &str) -> Result<Type, DescriptorError> {
    serde_json::from_value(field(v, key)?.clone()).map_err(|e| DescriptorError {
        message: format!("'{key}' is not a type: {e}"),
    })
}

fn flags_field(v: &serde_json::Value) -> Result<u8, DescriptorError> {
    let raw = field(v, "flags")?.as_u64().ok_or_else(|| DescriptorError {
        message: "'flags' is not an integer".into(),
    })?;
    u8::try_from(raw).map_err(|_| DescriptorError {
        message: format!("'flags' out of range: {raw}"),
    })
}
