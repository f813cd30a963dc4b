//! JSON tree codec.
//!
//! Encoding walks [`wire_entries`], so the two styles share one rule set:
//! dense writes every basis slot, sparse drops slots equal to their schema
//! default, and null extensions never encode. Decimals and non-finite
//! floats write as strings.
//!
//! Decoding is key-dispatched. Basis keys decode with their declared
//! immutable type driving number and string interpretation, then pass the
//! property's validating transform; unknown keys decode untyped by the
//! wire token actually present. An empty object decodes to the factory's
//! default grain.

use grain_core::codec::{wire_entries, EncodeStyle, GrainAssembler, GrainCodec};
use grain_core::collect::ConstList;
use grain_core::grain::{factory_for_grain, Grain, GrainFactory};
use grain_core::reflect::{names, Type};
use grain_core::transform::TransformFactory;
use grain_core::value::Value;
use rust_decimal::Decimal;
use serde_json::json;

use crate::error::CodecError;

/// The JSON tree adapter. Carries the transform factory used to validate
/// decoded basis values.
#[derive(Debug, Clone, Default)]
pub struct JsonCodec {
    transforms: TransformFactory,
}

impl JsonCodec {
    pub fn new() -> JsonCodec {
        JsonCodec::default()
    }

    pub fn with_transforms(transforms: TransformFactory) -> JsonCodec {
        JsonCodec { transforms }
    }

    /// Encodes a grain as a JSON object. Pair order in the tree is the
    /// library's canonical object order; decode dispatches by key.
    pub fn to_json(&self, grain: &Grain, style: EncodeStyle) -> serde_json::Value {
        grain_json(grain, style)
    }

    /// Decodes a JSON object into a grain built from `factory`'s default.
    pub fn from_json(
        &self,
        factory: &dyn GrainFactory,
        wire: &serde_json::Value,
    ) -> Result<Grain, CodecError> {
        let Some(fields) = wire.as_object() else {
            return Err(CodecError::malformed(format!(
                "expected an object, got {}",
                json_token(wire)
            )));
        };
        let mut assembler = GrainAssembler::with_transforms(factory, &self.transforms);
        for (key, jv) in fields {
            let declared = assembler.schema().property(key).map(|p| p.ty().clone());
            match declared {
                Some(ty) => {
                    let value = self.typed_value(&ty, jv)?;
                    assembler.put(key, value).map_err(|source| CodecError::Cast {
                        key: key.clone(),
                        source,
                    })?;
                }
                None => assembler.put_extension(key, untyped_value(jv)),
            }
        }
        Ok(assembler.finish())
    }

    /// Builds the closest [`Value`] for a declared type. Scalar text that
    /// does not parse keeps its wire shape, so the property transform
    /// reports the mismatch with the expected type. Fails only when a
    /// nested grain object does not decode.
    fn typed_value(&self, ty: &Type, jv: &serde_json::Value) -> Result<Value, CodecError> {
        use serde_json::Value as J;
        Ok(match jv {
            J::Null => Value::Null,
            J::Bool(b) => Value::Bool(*b),
            J::Number(n) => match ty.raw_name() {
                Some(names::INT32 | names::INT64 | names::BIG_INTEGER) => {
                    match n.as_i64() {
                        Some(i) => Value::Int(i),
                        None => untyped_number(n),
                    }
                }
                Some(names::FLOAT32 | names::FLOAT64) => match n.as_f64() {
                    Some(f) => Value::Float(f),
                    None => untyped_number(n),
                },
                Some(names::DECIMAL) => match n.to_string().parse::<Decimal>() {
                    Ok(d) => Value::Decimal(d),
                    Err(_) => untyped_number(n),
                },
                _ => untyped_number(n),
            },
            J::String(s) => match ty.raw_name() {
                Some(names::DECIMAL) => s
                    .parse::<Decimal>()
                    .map(Value::Decimal)
                    .unwrap_or_else(|_| Value::Str(s.clone())),
                Some(names::FLOAT32 | names::FLOAT64) => s
                    .parse::<f64>()
                    .map(Value::Float)
                    .unwrap_or_else(|_| Value::Str(s.clone())),
                _ => Value::Str(s.clone()),
            },
            J::Array(items) => {
                let elem = argument(ty, 0);
                let items: Result<Vec<Value>, CodecError> =
                    items.iter().map(|item| self.typed_value(&elem, item)).collect();
                Value::List(ConstList::from(items?))
            }
            J::Object(_) => {
                if let Some(factory) = grain_factory(ty) {
                    return self.from_json(factory.as_ref(), jv).map(Value::Grain);
                }
                let val_ty = argument(ty, 1);
                // SAFETY: the J::Object arm guarantees as_object
                let fields = jv.as_object().unwrap();
                let mut entries = Vec::with_capacity(fields.len());
                for (k, v) in fields {
                    entries.push((k.clone(), self.typed_value(&val_ty, v)?));
                }
                Value::Map(entries.into_iter().collect())
            }
        })
    }
}

impl GrainCodec for JsonCodec {
    type Wire = serde_json::Value;
    type Error = CodecError;

    fn encode(&self, grain: &Grain, style: EncodeStyle) -> serde_json::Value {
        self.to_json(grain, style)
    }

    fn decode(
        &self,
        factory: &dyn GrainFactory,
        wire: &serde_json::Value,
    ) -> Result<Grain, CodecError> {
        self.from_json(factory, wire)
    }
}

fn grain_json(grain: &Grain, style: EncodeStyle) -> serde_json::Value {
    let mut fields = serde_json::Map::new();
    for (key, value) in wire_entries(grain, style) {
        fields.insert(key.to_owned(), json_value(value, style));
    }
    serde_json::Value::Object(fields)
}

fn json_value(value: &Value, style: EncodeStyle) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => json!(*b),
        Value::Int(i) => json!(*i),
        Value::Float(f) if f.is_finite() => json!(*f),
        Value::Float(f) => json!(f.to_string()),
        Value::Decimal(d) => json!(d.to_string()),
        Value::Str(s) => json!(s),
        Value::List(items) => serde_json::Value::Array(
            items.iter().map(|item| json_value(item, style)).collect(),
        ),
        Value::Map(entries) => {
            let mut fields = serde_json::Map::new();
            for (k, v) in entries.iter() {
                fields.insert(k.clone(), json_value(v, style));
            }
            serde_json::Value::Object(fields)
        }
        Value::Grain(g) => grain_json(g, style),
    }
}

/// The type a container argument decodes with: sole-upper wildcards via
/// their bound, open or missing arguments untyped.
fn argument(ty: &Type, at: usize) -> Type {
    let Type::Parameterized { args, .. } = ty else {
        return Type::named(names::OBJECT);
    };
    match args.get(at) {
        Some(Type::Wildcard { upper, lower }) if lower.is_empty() && upper.len() == 1 => {
            upper[0].clone()
        }
        Some(Type::Wildcard { .. }) | None => Type::named(names::OBJECT),
        Some(t) => t.clone(),
    }
}

/// The registered factory behind a grain-typed declaration, if any.
fn grain_factory(ty: &Type) -> Option<std::sync::Arc<dyn GrainFactory>> {
    let Type::Named(name) = ty else { return None };
    factory_for_grain(name)
}

fn untyped_value(jv: &serde_json::Value) -> Value {
    use serde_json::Value as J;
    match jv {
        J::Null => Value::Null,
        J::Bool(b) => Value::Bool(*b),
        J::Number(n) => untyped_number(n),
        J::String(s) => Value::Str(s.clone()),
        J::Array(items) => Value::List(ConstList::from(
            items.iter().map(untyped_value).collect::<Vec<Value>>(),
        )),
        J::Object(fields) => Value::Map(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), untyped_value(v)))
                .collect(),
        ),
    }
}

fn untyped_number(n: &serde_json::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Int(i)
    } else if let Some(f) = n.as_f64() {
        Value::Float(f)
    } else {
        // a number beyond every native range keeps its text
        Value::Str(n.to_string())
    }
}

fn json_token(v: &serde_json::Value) -> &'static str {
    use serde_json::Value as J;
    match v {
        J::Null => "null",
        J::Bool(_) => "a bool",
        J::Number(_) => "a number",
        J::String(_) => "a string",
        J::Array(_) => "an array",
        J::Object(_) => "an object",
    }
}
