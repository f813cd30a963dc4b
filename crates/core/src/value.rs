//! Runtime values held by grains, plus the tagged JSON helpers used by
//! the descriptor format.

use rust_decimal::Decimal;
use serde_json::json;

use crate::collect::{ConstList, ConstMap};
use crate::error::ValueParseError;
use crate::grain::{factory_for, Grain};

// ──────────────────────────────────────────────
// Runtime values
// ──────────────────────────────────────────────

/// A runtime value in a grain slot. Numeric schema types share `Int` and
/// `Float` at runtime; exact decimals keep `rust_decimal::Decimal`.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Str(String),
    List(ConstList<Value>),
    Map(ConstMap<String, Value>),
    Grain(Grain),
}

impl Value {
    /// Returns a human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Decimal(_) => "Decimal",
            Value::Str(_) => "String",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::Grain(_) => "Grain",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ConstList<Value>> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ConstMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_grain(&self) -> Option<&Grain> {
        match self {
            Value::Grain(g) => Some(g),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Value {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Value {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Value {
        Value::Float(f)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Value {
        Value::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Str(s)
    }
}

impl From<ConstList<Value>> for Value {
    fn from(l: ConstList<Value>) -> Value {
        Value::List(l)
    }
}

impl From<ConstMap<String, Value>> for Value {
    fn from(m: ConstMap<String, Value>) -> Value {
        Value::Map(m)
    }
}

impl From<Grain> for Value {
    fn from(g: Grain) -> Value {
        Value::Grain(g)
    }
}

/// Floats compare bitwise so that equality is total: `NaN == NaN`, and
/// `0.0 != -0.0`. Everything else is structural.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Grain(a), Value::Grain(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

// ──────────────────────────────────────────────
// Tagged JSON form
// ──────────────────────────────────────────────

impl Value {
    /// The kind-tagged JSON form used by schema descriptors. Unlike the
    /// wire codecs this form is self-describing: every value carries its
    /// kind, floats survive as bit-exact strings when non-finite, and
    /// nested grains are recorded by schema name.
    pub fn to_tagged_json(&self) -> serde_json::Value {
        match self {
            Value::Null => json!({ "kind": "null" }),
            Value::Bool(b) => json!({ "kind": "bool", "value": b }),
            Value::Int(i) => json!({ "kind": "int", "value": i }),
            Value::Float(f) => {
                if f.is_finite() {
                    json!({ "kind": "float", "value": f })
                } else {
                    json!({ "kind": "float", "value": f.to_string() })
                }
            }
            Value::Decimal(d) => json!({ "kind": "decimal", "value": d.to_string() }),
            Value::Str(s) => json!({ "kind": "string", "value": s }),
            Value::List(items) => {
                let items: Vec<serde_json::Value> =
                    items.iter().map(Value::to_tagged_json).collect();
                json!({ "kind": "list", "items": items })
            }
            Value::Map(entries) => {
                let entries: Vec<serde_json::Value> = entries
                    .iter()
                    .map(|(k, v)| json!({ "key": k, "value": v.to_tagged_json() }))
                    .collect();
                json!({ "kind": "map", "entries": entries })
            }
            Value::Grain(g) => {
                let entries: Vec<serde_json::Value> = g
                    .iter()
                    .map(|(k, v)| json!({ "key": k, "value": v.to_tagged_json() }))
                    .collect();
                json!({ "kind": "grain", "schema": g.schema().name(), "entries": entries })
            }
        }
    }

    /// Parses the tagged form back. Grain values resolve their factory
    /// through the process-wide registry, so the schema must have been
    /// registered first.
    pub fn from_tagged_json(v: &serde_json::Value) -> Result<Value, ValueParseError> {
        let kind = v
            .get("kind")
            .and_then(|k| k.as_str())
            .ok_or_else(|| malformed("missing 'kind'"))?;
        match kind {
            "null" => Ok(Value::Null),
            "bool" => {
                let b = v
                    .get("value")
                    .and_then(|b| b.as_bool())
                    .ok_or_else(|| malformed("bool missing 'value'"))?;
                Ok(Value::Bool(b))
            }
            "int" => {
                let i = v
                    .get("value")
                    .and_then(|i| i.as_i64())
                    .ok_or_else(|| malformed("int missing 'value'"))?;
                Ok(Value::Int(i))
            }
            "float" => match v.get("value") {
                Some(num) if num.is_number() => {
                    // SAFETY: is_number guarantees as_f64 on a non-arbitrary-precision number
                    Ok(Value::Float(num.as_f64().unwrap()))
                }
                Some(serde_json::Value::String(s)) => {
                    let f = s
                        .parse::<f64>()
                        .map_err(|e| malformed(&format!("invalid float: {e}")))?;
                    Ok(Value::Float(f))
                }
                _ => Err(malformed("float missing 'value'")),
            },
            "decimal" => {
                let s = v
                    .get("value")
                    .and_then(|s| s.as_str())
                    .ok_or_else(|| malformed("decimal missing 'value'"))?;
                let d = s
                    .parse::<Decimal>()
                    .map_err(|e| malformed(&format!("invalid decimal: {e}")))?;
                Ok(Value::Decimal(d))
            }
            "string" => {
                let s = v
                    .get("value")
                    .and_then(|s| s.as_str())
                    .ok_or_else(|| malformed("string missing 'value'"))?;
                Ok(Value::Str(s.to_owned()))
            }
            "list" => {
                let items = v
                    .get("items")
                    .and_then(|i| i.as_array())
                    .ok_or_else(|| malformed("list missing 'items'"))?;
                let items: Result<Vec<Value>, ValueParseError> =
                    items.iter().map(Value::from_tagged_json).collect();
                Ok(Value::List(ConstList::from(items?)))
            }
            "map" => {
                let entries = parse_entries(v)?;
                Ok(Value::Map(entries.into_iter().collect()))
            }
            "grain" => {
                let schema = v
                    .get("schema")
                    .and_then(|s| s.as_str())
                    .ok_or_else(|| malformed("grain missing 'schema'"))?;
                let factory = factory_for(schema).ok_or_else(|| {
                    malformed(&format!("no registered factory for schema '{schema}'"))
                })?;
                let mut builder = factory.new_builder();
                for (key, value) in parse_entries(v)? {
                    builder.put(key, value);
                }
                Ok(Value::Grain(builder.build()))
            }
            other => Err(malformed(&format!("unknown kind '{other}'"))),
        }
    }
}

fn malformed(message: &str) -> ValueParseError {
    ValueParseError {
        message: message.to_owned(),
    }
}

fn parse_entries(v: &serde_json::Value) -> Result<Vec<(String, Value)>, ValueParseError> {
    let entries = v
        .get("entries")
        .and_then(|e| e.as_array())
        .ok_or_else(|| malformed("missing 'entries'"))?;
    entries
        .iter()
        .map(|entry| {
            let key = entry
                .get("key")
                .and_then(|k| k.as_str())
                .ok_or_else(|| malformed("entry missing 'key'"))?;
            let value = entry
                .get("value")
                .ok_or_else(|| malformed("entry missing 'value'"))?;
            Ok((key.to_owned(), Value::from_tagged_json(value)?))
        })
        .collect()
}
