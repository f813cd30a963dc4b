//! Validating casts from runtime values to immutable target types.
//!
//! A [`Transform`] checks that a [`Value`] can inhabit a target
//! [`Type`] and passes it through unchanged. Codecs run decoded basis
//! values through the property's transform before `put`ting them.

use crate::error::{CastError, TransformError};
use crate::grain::factory_for_grain;
use crate::reflect::{names, Type};
use crate::value::Value;

/// Builds [`Transform`]s. Deep checking descends into container elements;
/// it defaults on in debug builds and off in release builds.
#[derive(Debug, Clone)]
pub struct TransformFactory {
    deep: bool,
}

impl Default for TransformFactory {
    fn default() -> TransformFactory {
        TransformFactory {
            deep: cfg!(debug_assertions),
        }
    }
}

impl TransformFactory {
    pub fn new() -> TransformFactory {
        TransformFactory::default()
    }

    pub fn with_deep_checks(deep: bool) -> TransformFactory {
        TransformFactory { deep }
    }

    /// The validating cast for a target type. Fails only for targets with
    /// no runtime representation (arrays).
    pub fn transform_for(&self, target: &Type) -> Result<Transform, TransformError> {
        let shape = self.shape_for(target)?;
        Ok(Transform {
            target: target.to_string(),
            shape,
            deep: self.deep,
        })
    }

    fn shape_for(&self, target: &Type) -> Result<Shape, TransformError> {
        match target {
            Type::Named(name) => Ok(self.shape_for_name(name, &[])),
            Type::Parameterized { raw, args, .. } => Ok(self.shape_for_name(raw, args)),
            Type::Array(_) => Err(TransformError::Uninhabited {
                type_display: target.to_string(),
            }),
            Type::Wildcard { upper, lower } => {
                if !lower.is_empty() || upper.is_empty() {
                    // super-wildcards and unbounded wildcards admit anything
                    Ok(Shape::Any)
                } else {
                    self.shape_for(&upper[0])
                }
            }
            // type variables are erased at runtime
            Type::Var { .. } => Ok(Shape::Any),
        }
    }

    fn shape_for_name(&self, name: &str, args: &[Type]) -> Shape {
        match name {
            names::OBJECT => Shape::Any,
            names::BOOL => Shape::Bool,
            names::INT32 | names::INT64 | names::BIG_INTEGER => Shape::Int,
            names::FLOAT32 | names::FLOAT64 => Shape::Float,
            names::DECIMAL => Shape::Decimal,
            names::NUMBER => Shape::Number,
            names::STRING | names::UUID | names::URI | names::CURRENCY => Shape::Str,
            names::COLLECTION
            | names::LIST
            | names::SET
            | names::SORTED_SET
            | names::ENUM_SET
            | names::CONST_COLLECTION
            | names::CONST_LIST
            | names::CONST_SET
            | names::CONST_SORTED_SET
            | names::BASIC_CONST_LIST
            | names::BASIC_CONST_SET
            | names::BASIC_CONST_SORTED_SET => Shape::List(Box::new(self.element(args, 0))),
            names::MAP
            | names::SORTED_MAP
            | names::CONST_MAP
            | names::CONST_SORTED_MAP
            | names::BASIC_CONST_MAP
            | names::BASIC_CONST_SORTED_MAP => Shape::Map(
                Box::new(self.element(args, 0)),
                Box::new(self.element(args, 1)),
            ),
            other => {
                // a registered grain type is checked by schema identity;
                // anything else (enum constants, custom immutables) is
                // carried opaquely
                if factory_for_grain(other).is_some() {
                    Shape::Grain(other.to_owned())
                } else {
                    Shape::Any
                }
            }
        }
    }

    fn element(&self, args: &[Type], at: usize) -> Transform {
        let target = args.get(at);
        let shape = target
            .map(|t| self.shape_for(t))
            .unwrap_or(Ok(Shape::Any))
            // an uninhabitable element type can hold no elements; the
            // check reports it per element instead of refusing the
            // container outright
            .unwrap_or(Shape::Nothing);
        Transform {
            target: target.map(Type::to_string).unwrap_or_else(|| "?".to_owned()),
            shape,
            deep: self.deep,
        }
    }
}

#[derive(Debug, Clone)]
enum Shape {
    Any,
    Nothing,
    Bool,
    Int,
    Float,
    Decimal,
    Number,
    Str,
    List(Box<Transform>),
    Map(Box<Transform>, Box<Transform>),
    Grain(String),
}

/// A validating cast to one target type.
#[derive(Debug, Clone)]
pub struct Transform {
    target: String,
    shape: Shape,
    deep: bool,
}

impl Transform {
    /// The target type's printable form.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Checks `value` and passes it through.
    pub fn apply(&self, value: Value) -> Result<Value, CastError> {
        self.check(&value)?;
        Ok(value)
    }

    /// Checks that `value` can inhabit the target type. `Null` inhabits
    /// every target.
    pub fn check(&self, value: &Value) -> Result<(), CastError> {
        if value.is_null() {
            return Ok(());
        }
        let ok = match &self.shape {
            Shape::Any => true,
            Shape::Nothing => false,
            Shape::Bool => matches!(value, Value::Bool(_)),
            Shape::Int => matches!(value, Value::Int(_)),
            Shape::Float => matches!(value, Value::Float(_)),
            Shape::Decimal => matches!(value, Value::Decimal(_)),
            Shape::Number => matches!(value, Value::Int(_) | Value::Float(_) | Value::Decimal(_)),
            Shape::Str => matches!(value, Value::Str(_)),
            Shape::List(elem) => {
                let Value::List(items) = value else {
                    return Err(self.mismatch(value));
                };
                if self.deep {
                    for (i, item) in items.iter().enumerate() {
                        elem.check(item).map_err(|e| nest(format!("[{i}]"), e))?;
                    }
                }
                true
            }
            Shape::Map(key, val) => {
                let Value::Map(entries) = value else {
                    return Err(self.mismatch(value));
                };
                if self.deep {
                    for (k, v) in entries.iter() {
                        key.check(&Value::Str(k.clone()))
                            .map_err(|e| nest(format!("[{k:?}] key"), e))?;
                        val.check(v).map_err(|e| nest(format!("[{k:?}]"), e))?;
                    }
                }
                true
            }
            Shape::Grain(name) => match value {
                Value::Grain(g) => {
                    g.schema().grain_name() == name || g.schema().name() == name
                }
                _ => false,
            },
        };
        if ok {
            Ok(())
        } else {
            Err(self.mismatch(value))
        }
    }

    fn mismatch(&self, value: &Value) -> CastError {
        CastError::Mismatch {
            expected: self.target.clone(),
            actual: value.type_name().to_owned(),
        }
    }
}

fn nest(at: String, err: CastError) -> CastError {
    match err {
        CastError::Mismatch { expected, actual } => CastError::Element {
            at,
            expected,
            actual,
        },
        CastError::Element {
            at: inner,
            expected,
            actual,
        } => CastError::Element {
            at: format!("{at}{inner}"),
            expected,
            actual,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::ConstList;

    fn deep() -> TransformFactory {
        TransformFactory::with_deep_checks(true)
    }

    #[test]
    fn scalar_targets_check_the_tag() {
        let t = deep().transform_for(&Type::named(names::INT64)).unwrap();
        assert!(t.check(&Value::Int(7)).is_ok());
        assert!(t.check(&Value::Null).is_ok());
        let err = t.check(&Value::Str("7".into())).unwrap_err();
        assert_eq!(
            err,
            CastError::Mismatch {
                expected: "Int64".into(),
                actual: "String".into()
            }
        );
    }

    #[test]
    fn deep_list_check_reports_element_position() {
        let target = Type::parameterized(names::CONST_LIST, vec![Type::named(names::STRING)]);
        let t = deep().transform_for(&target).unwrap();
        let ok = Value::List(ConstList::from(vec![Value::Str("a".into()), Value::Null]));
        assert!(t.check(&ok).is_ok());

        let bad = Value::List(ConstList::from(vec![Value::Str("a".into()), Value::Int(3)]));
        let err = t.check(&bad).unwrap_err();
        assert_eq!(
            err,
            CastError::Element {
                at: "[1]".into(),
                expected: "String".into(),
                actual: "Int".into()
            }
        );
    }

    #[test]
    fn shallow_mode_checks_outer_shape_only() {
        let target = Type::parameterized(names::CONST_LIST, vec![Type::named(names::STRING)]);
        let t = TransformFactory::with_deep_checks(false)
            .transform_for(&target)
            .unwrap();
        let bad_elems = Value::List(ConstList::from(vec![Value::Int(3)]));
        assert!(t.check(&bad_elems).is_ok());
        assert!(t.check(&Value::Int(3)).is_err());
    }

    #[test]
    fn wildcard_validates_via_upper_bound() {
        let target = Type::parameterized(
            names::CONST_LIST,
            vec![Type::extends_wildcard(Type::named(names::NUMBER))],
        );
        let t = deep().transform_for(&target).unwrap();
        let mixed = Value::List(ConstList::from(vec![
            Value::Int(1),
            Value::Float(2.0),
            Value::Decimal("3".parse().unwrap()),
        ]));
        assert!(t.check(&mixed).is_ok());
        let bad = Value::List(ConstList::from(vec![Value::Bool(true)]));
        assert!(t.check(&bad).is_err());
    }

    #[test]
    fn arrays_are_uninhabited() {
        let err = deep()
            .transform_for(&Type::array(Type::named(names::STRING)))
            .unwrap_err();
        assert_eq!(
            err,
            TransformError::Uninhabited {
                type_display: "String[]".into()
            }
        );
    }
}
