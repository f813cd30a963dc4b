//! The tagged-union type graph.
//!
//! `Type` models declared property types the way a reflective type system
//! would: plain named types, parameterized types (with an optional enclosing
//! owner for inner types), arrays, wildcards with upper/lower bounds, and
//! type-variable references. A `Var` is a leaf naming a declaration's type
//! parameter; its bounds live on the declaration in the [`TypeUniverse`],
//! which is what keeps self-referential bounds (`Enum<E extends Enum<E>>`)
//! from producing infinite trees.
//!
//! [`TypeUniverse`]: super::TypeUniverse

use serde::{Deserialize, Serialize};
use std::fmt;

/// A declared type, as a structural tree.
///
/// Equality and hashing are structural. `Display` prints the familiar
/// generic syntax (`Map<String, ? extends Number>`, `Int32[]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// A plain named type: a class, interface, primitive, enum, or schema.
    /// A generic declaration used without arguments (a *raw* use) is also a
    /// `Named`; cooking rewrites it to a `Parameterized`.
    Named(String),
    /// A generic declaration applied to arguments.
    Parameterized {
        raw: String,
        args: Vec<Type>,
        /// The enclosing type's parameterization, for inner (non-static
        /// nested) generic types. `None` for top-level types.
        owner: Option<Box<Type>>,
    },
    /// An array of some component type.
    Array(Box<Type>),
    /// A wildcard argument. An unbounded wildcard has empty bounds; at most
    /// one of `upper`/`lower` is non-empty in well-formed types.
    Wildcard { upper: Vec<Type>, lower: Vec<Type> },
    /// A reference to the type parameter `name` of declaration `decl`.
    Var { decl: String, name: String },
}

impl Type {
    pub fn named(name: impl Into<String>) -> Type {
        Type::Named(name.into())
    }

    pub fn parameterized(raw: impl Into<String>, args: Vec<Type>) -> Type {
        Type::Parameterized {
            raw: raw.into(),
            args,
            owner: None,
        }
    }

    pub fn inner(owner: Type, raw: impl Into<String>, args: Vec<Type>) -> Type {
        Type::Parameterized {
            raw: raw.into(),
            args,
            owner: Some(Box::new(owner)),
        }
    }

    pub fn array(component: Type) -> Type {
        Type::Array(Box::new(component))
    }

    /// `? extends bound`
    pub fn extends_wildcard(bound: Type) -> Type {
        Type::Wildcard {
            upper: vec![bound],
            lower: Vec::new(),
        }
    }

    /// `? super bound`
    pub fn super_wildcard(bound: Type) -> Type {
        Type::Wildcard {
            upper: Vec::new(),
            lower: vec![bound],
        }
    }

    /// `?`
    pub fn wildcard() -> Type {
        Type::Wildcard {
            upper: Vec::new(),
            lower: Vec::new(),
        }
    }

    pub fn var(decl: impl Into<String>, name: impl Into<String>) -> Type {
        Type::Var {
            decl: decl.into(),
            name: name.into(),
        }
    }

    /// The declaration name behind this type, for types that have one
    /// (`Named` and `Parameterized`).
    pub fn raw_name(&self) -> Option<&str> {
        match self {
            Type::Named(n) => Some(n),
            Type::Parameterized { raw, .. } => Some(raw),
            _ => None,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Type::Wildcard { .. })
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Named(n) => write!(f, "{}", n),
            Type::Parameterized { raw, args, owner } => {
                if let Some(o) = owner {
                    write!(f, "{}.", o)?;
                }
                write!(f, "{}<", raw)?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, ">")
            }
            Type::Array(c) => write!(f, "{}[]", c),
            Type::Wildcard { upper, lower } => {
                if !lower.is_empty() {
                    write!(f, "? super ")?;
                    return write_bounds(f, lower);
                }
                // An Object upper bound prints as a bare "?", matching the
                // conventional wildcard rendering.
                if upper.is_empty() || (upper.len() == 1 && upper[0] == Type::Named("Object".into()))
                {
                    return write!(f, "?");
                }
                write!(f, "? extends ")?;
                write_bounds(f, upper)
            }
            Type::Var { name, .. } => write!(f, "{}", name),
        }
    }
}

fn write_bounds(f: &mut fmt::Formatter<'_>, bounds: &[Type]) -> fmt::Result {
    for (i, b) in bounds.iter().enumerate() {
        if i > 0 {
            write!(f, " & ")?;
        }
        write!(f, "{}", b)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_parameterized() {
        let t = Type::parameterized(
            "Map",
            vec![
                Type::named("String"),
                Type::extends_wildcard(Type::named("Number")),
            ],
        );
        assert_eq!(t.to_string(), "Map<String, ? extends Number>");
    }

    #[test]
    fn display_array_and_unbounded_wildcard() {
        assert_eq!(Type::array(Type::named("Int32")).to_string(), "Int32[]");
        assert_eq!(Type::wildcard().to_string(), "?");
        assert_eq!(
            Type::extends_wildcard(Type::named("Object")).to_string(),
            "?"
        );
    }

    #[test]
    fn display_inner_type() {
        let t = Type::inner(
            Type::parameterized("Outer", vec![Type::named("String")]),
            "Inner",
            vec![Type::named("Int64")],
        );
        assert_eq!(t.to_string(), "Outer<String>.Inner<Int64>");
    }

    #[test]
    fn structural_equality() {
        let a = Type::parameterized("List", vec![Type::named("Int32")]);
        let b = Type::parameterized("List", vec![Type::named("Int32")]);
        assert_eq!(a, b);
        assert_ne!(a, Type::named("List"));
    }
}
