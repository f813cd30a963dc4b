//! Wildcard normalization of declared types ("cooking").
//!
//! Cooking rewrites every raw use of a generic declaration into a
//! parameterized type whose arguments are upper-bounded wildcards derived
//! from the declared parameter bounds. Self-referential bounds (direct,
//! like `Enum<E extends Enum<E>>`, or mutual between two parameters) are
//! detected with a per-invocation visited set; the bound nearest the
//! detected cycle collapses to its erasure instead of recursing forever.
//! Already-wildcard arguments pass through untouched, which makes cooking
//! idempotent.

use std::collections::HashSet;

use grain_core::error::ReflectError;
use grain_core::reflect::{names, Type, TypeUniverse};

type Visited = HashSet<(String, String)>;

/// Normalizes a declared type. Fails only on a malformed type graph:
/// unknown declaration names or argument-count mismatches.
pub fn cook(universe: &TypeUniverse, t: &Type) -> Result<Type, ReflectError> {
    match t {
        Type::Named(name) => {
            let decl = universe.require(name)?;
            if decl.params.is_empty() {
                Ok(t.clone())
            } else {
                let mut visited = Visited::new();
                expand_raw(universe, name, &mut visited)
            }
        }
        Type::Parameterized { raw, args, owner } => {
            check_arity(universe, raw, args.len())?;
            let args = args
                .iter()
                .map(|a| match a {
                    // wildcards are not re-bounded; bare variables stay
                    Type::Wildcard { .. } | Type::Var { .. } => Ok(a.clone()),
                    other => cook(universe, other),
                })
                .collect::<Result<Vec<Type>, ReflectError>>()?;
            let owner = match owner {
                Some(o) => Some(Box::new(cook(universe, o)?)),
                None => None,
            };
            Ok(Type::Parameterized {
                raw: raw.clone(),
                args,
                owner,
            })
        }
        Type::Array(component) => Ok(Type::array(cook(universe, component)?)),
        Type::Wildcard { .. } | Type::Var { .. } => Ok(t.clone()),
    }
}

fn check_arity(universe: &TypeUniverse, raw: &str, actual: usize) -> Result<(), ReflectError> {
    let decl = universe.require(raw)?;
    if decl.params.len() != actual {
        return Err(ReflectError::ArityMismatch {
            name: raw.to_owned(),
            expected: decl.params.len(),
            actual,
        });
    }
    Ok(())
}

/// Expands a raw generic into `Raw<? extends B1, ...>`, deriving each
/// wildcard from the parameter's declared bound within the shared walk.
fn expand_raw(
    universe: &TypeUniverse,
    name: &str,
    visited: &mut Visited,
) -> Result<Type, ReflectError> {
    let decl = universe.require(name)?;
    let param_names: Vec<String> = decl.params.iter().map(|p| p.name.clone()).collect();
    let enclosing = decl.enclosing.clone();

    let mut args = Vec::with_capacity(param_names.len());
    for param in &param_names {
        args.push(wildcard_for(universe, name, param, visited)?);
    }
    let owner = match enclosing {
        Some(outer) => Some(Box::new(cook(universe, &Type::named(outer))?)),
        None => None,
    };
    Ok(Type::Parameterized {
        raw: name.to_owned(),
        args,
        owner,
    })
}

/// The upper-bounded wildcard standing in for one type parameter. A cycle
/// detected anywhere under the declared bound collapses *this* bound to
/// its erasure.
fn wildcard_for(
    universe: &TypeUniverse,
    decl: &str,
    param: &str,
    visited: &mut Visited,
) -> Result<Type, ReflectError> {
    let bound = universe
        .param_bounds(decl, param)
        .and_then(|b| b.first())
        .cloned();
    let Some(bound) = bound else {
        return Ok(Type::wildcard());
    };
    let key = (decl.to_owned(), param.to_owned());
    visited.insert(key.clone());
    let cooked = cook_bound(universe, &bound, visited)?;
    visited.remove(&key);
    Ok(Type::extends_wildcard(
        cooked.unwrap_or_else(|| universe.erasure(&bound)),
    ))
}

/// Cooks a type appearing inside a parameter bound. `Ok(None)` signals a
/// visited-variable hit bubbling up to the nearest enclosing bound.
fn cook_bound(
    universe: &TypeUniverse,
    t: &Type,
    visited: &mut Visited,
) -> Result<Option<Type>, ReflectError> {
    match t {
        Type::Var { decl, name } => {
            if visited.contains(&(decl.clone(), name.clone())) {
                return Ok(None);
            }
            // a variable at the top of a bound resolves through its own
            // declared bound transparently
            let bound = universe
                .param_bounds(decl, name)
                .and_then(|b| b.first())
                .cloned();
            let Some(bound) = bound else {
                return Ok(Some(Type::named(names::OBJECT)));
            };
            let key = (decl.clone(), name.clone());
            visited.insert(key.clone());
            let cooked = cook_bound(universe, &bound, visited)?;
            visited.remove(&key);
            Ok(Some(cooked.unwrap_or_else(|| universe.erasure(&bound))))
        }
        Type::Named(name) => {
            let decl = universe.require(name)?;
            if decl.params.is_empty() {
                Ok(Some(t.clone()))
            } else {
                expand_raw(universe, name, visited).map(Some)
            }
        }
        Type::Parameterized { raw, args, owner } => {
            check_arity(universe, raw, args.len())?;
            let mut cooked_args = Vec::with_capacity(args.len());
            for arg in args {
                match arg {
                    Type::Wildcard { .. } => cooked_args.push(arg.clone()),
                    Type::Var { decl, name } => {
                        if visited.contains(&(decl.clone(), name.clone())) {
                            return Ok(None);
                        }
                        // a variable in argument position becomes an
                        // upper-bounded wildcard over its resolved bound
                        cooked_args.push(wildcard_for(universe, decl, name, visited)?);
                    }
                    other => match cook_bound(universe, other, visited)? {
                        Some(c) => cooked_args.push(c),
                        None => return Ok(None),
                    },
                }
            }
            let owner = match owner {
                Some(o) => match cook_bound(universe, o, visited)? {
                    Some(c) => Some(Box::new(c)),
                    None => return Ok(None),
                },
                None => None,
            };
            Ok(Some(Type::Parameterized {
                raw: raw.clone(),
                args: cooked_args,
                owner,
            }))
        }
        Type::Array(component) => Ok(cook_bound(universe, component, visited)?.map(Type::array)),
        Type::Wildcard { .. } => Ok(Some(t.clone())),
    }
}
