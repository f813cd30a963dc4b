//! Property collection over the schema supertype lattice.
//!
//! A property is a public, non-static, zero-argument accessor named
//! `getX`, or `isX` with a `Bool` return. Collection proceeds level by
//! level outward from the schema: each declaration contributes only the
//! accessors it declares directly, with type arguments substituted along
//! the parameterized supertype chain. Diamond ancestors are visited once,
//! at their shallowest level. Resolution then picks one type per property
//! name: the narrowest among the occurrences at the shallowest declaring
//! level, which shadows every deeper declaration of the same name.

use std::collections::{HashMap, HashSet, VecDeque};

use grain_core::grain::flags;
use grain_core::reflect::{names, Decl, MethodSig, Type, TypeUniverse};

use crate::error::SchemaError;
use crate::naming::accessor_name;

/// The type-argument substitution in effect at one lattice node, keyed by
/// `(declaration, parameter)`.
type Subst = HashMap<(String, String), Type>;

/// One collected property occurrence: its key, its substituted declared
/// type, its accessor flags, and the declaration it was found on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProperty {
    pub name: String,
    pub declared: Type,
    pub flags: u8,
    pub declared_by: String,
}

// ── Single-level collection ──────────────────────────────────────────

/// Gathers the properties declared directly on `type_name`, ignoring
/// everything inherited.
pub fn collect_declared(
    universe: &TypeUniverse,
    type_name: &str,
) -> Result<Vec<ResolvedProperty>, SchemaError> {
    let decl = universe
        .decl(type_name)
        .ok_or_else(|| SchemaError::UnknownSchema {
            name: type_name.to_owned(),
        })?;
    declared_on(universe, decl, &Subst::new(), type_name)
}

fn declared_on(
    universe: &TypeUniverse,
    decl: &Decl,
    subst: &Subst,
    root: &str,
) -> Result<Vec<ResolvedProperty>, SchemaError> {
    let mut out = Vec::new();
    for method in &decl.methods {
        if let Some(property) = property_of(universe, decl, method, subst, root)? {
            out.push(property);
        }
    }
    Ok(out)
}

/// Classifies one method signature. `Ok(None)` means the method is not an
/// accessor; unknown type names inside a conforming accessor's return type
/// are collection errors, not silent exclusions.
fn property_of(
    universe: &TypeUniverse,
    decl: &Decl,
    method: &MethodSig,
    subst: &Subst,
    root: &str,
) -> Result<Option<ResolvedProperty>, SchemaError> {
    if !method.is_public || method.is_static || !method.params.is_empty() {
        return Ok(None);
    }
    let Some(returns) = &method.returns else {
        return Ok(None);
    };
    let Some(accessor) = accessor_name(&method.name) else {
        return Ok(None);
    };
    let declared = substitute(returns, subst);
    if accessor.is_form && declared != Type::named(names::BOOL) {
        return Ok(None);
    }
    check_signature(universe, &declared, root, &method.name)?;
    Ok(Some(ResolvedProperty {
        name: accessor.property,
        declared,
        flags: if accessor.is_form { flags::IS_PROPERTY } else { 0 },
        declared_by: decl.name.clone(),
    }))
}

/// Every name inside an accessor's return type must be declared, and every
/// variable must reference an existing parameter of its declaration.
fn check_signature(
    universe: &TypeUniverse,
    t: &Type,
    root: &str,
    method: &str,
) -> Result<(), SchemaError> {
    let unknown = |type_name: String| SchemaError::UnknownTypeInSignature {
        schema: root.to_owned(),
        method: method.to_owned(),
        type_name,
    };
    match t {
        Type::Named(name) => {
            if !universe.is_declared(name) {
                return Err(unknown(name.clone()));
            }
        }
        Type::Parameterized { raw, args, owner } => {
            if !universe.is_declared(raw) {
                return Err(unknown(raw.clone()));
            }
            for arg in args {
                check_signature(universe, arg, root, method)?;
            }
            if let Some(o) = owner {
                check_signature(universe, o, root, method)?;
            }
        }
        Type::Array(component) => check_signature(universe, component, root, method)?,
        Type::Wildcard { upper, lower } => {
            for bound in upper.iter().chain(lower) {
                check_signature(universe, bound, root, method)?;
            }
        }
        Type::Var { decl, name } => {
            if universe.param_bounds(decl, name).is_none() {
                return Err(unknown(format!("{decl}::{name}")));
            }
        }
    }
    Ok(())
}

fn substitute(t: &Type, subst: &Subst) -> Type {
    if subst.is_empty() {
        return t.clone();
    }
    match t {
        Type::Named(_) => t.clone(),
        Type::Parameterized { raw, args, owner } => Type::Parameterized {
            raw: raw.clone(),
            args: args.iter().map(|a| substitute(a, subst)).collect(),
            owner: owner.as_ref().map(|o| Box::new(substitute(o, subst))),
        },
        Type::Array(component) => Type::array(substitute(component, subst)),
        Type::Wildcard { upper, lower } => Type::Wildcard {
            upper: upper.iter().map(|b| substitute(b, subst)).collect(),
            lower: lower.iter().map(|b| substitute(b, subst)).collect(),
        },
        Type::Var { decl, name } => subst
            .get(&(decl.clone(), name.clone()))
            .cloned()
            .unwrap_or_else(|| t.clone()),
    }
}

// ── Multi-level collection ───────────────────────────────────────────

/// Walks `type_name`'s supertype lattice breadth-first and returns one
/// property list per level, most-derived first. A declaration reachable
/// along several paths contributes once, at its shallowest level.
pub fn collect_levels(
    universe: &TypeUniverse,
    type_name: &str,
) -> Result<Vec<Vec<ResolvedProperty>>, SchemaError> {
    if !universe.is_declared(type_name) {
        return Err(SchemaError::UnknownSchema {
            name: type_name.to_owned(),
        });
    }

    let mut levels: Vec<Vec<ResolvedProperty>> = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut frontier: VecDeque<(String, Subst)> = VecDeque::new();
    visited.insert(type_name.to_owned());
    frontier.push_back((type_name.to_owned(), Subst::new()));

    while !frontier.is_empty() {
        let mut level = Vec::new();
        let mut next: VecDeque<(String, Subst)> = VecDeque::new();
        for (name, subst) in frontier.drain(..) {
            // SAFETY: only declared names are ever enqueued
            let decl = universe.decl(&name).unwrap();
            level.extend(declared_on(universe, decl, &subst, type_name)?);
            for sup in &decl.supers {
                let sup = substitute(sup, &subst);
                let Some(raw) = sup.raw_name() else { continue };
                if !visited.insert(raw.to_owned()) {
                    continue;
                }
                if !universe.is_declared(raw) {
                    return Err(SchemaError::UnknownTypeInSignature {
                        schema: type_name.to_owned(),
                        method: format!("extends {raw}"),
                        type_name: raw.to_owned(),
                    });
                }
                next.push_back((raw.to_owned(), super_subst(universe, &sup)));
            }
        }
        levels.push(level);
        frontier = next;
    }
    Ok(levels)
}

/// The substitution a supertype use establishes for the supertype's own
/// parameters. Raw supertype uses establish none, leaving the parent's
/// variables free.
fn super_subst(universe: &TypeUniverse, sup: &Type) -> Subst {
    let mut subst = Subst::new();
    if let Type::Parameterized { raw, args, .. } = sup {
        if let Some(decl) = universe.decl(raw) {
            for (param, arg) in decl.params.iter().zip(args) {
                subst.insert((raw.clone(), param.name.clone()), arg.clone());
            }
        }
    }
    subst
}

// ── Resolution ───────────────────────────────────────────────────────

/// Resolves one type per property name across the collected levels.
///
/// Within the shallowest level declaring a name, the chosen occurrence
/// must be assignable to every other occurrence of that name there;
/// unrelated same-level types make the schema ill-formed. Deeper
/// declarations of an already-resolved name are shadowed outright. The
/// result preserves first-discovery order.
pub fn resolve_properties(
    universe: &TypeUniverse,
    type_name: &str,
) -> Result<Vec<ResolvedProperty>, SchemaError> {
    let levels = collect_levels(universe, type_name)?;
    let mut resolved: Vec<ResolvedProperty> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for level in levels {
        let mut order: Vec<String> = Vec::new();
        let mut candidates: HashMap<String, Vec<ResolvedProperty>> = HashMap::new();
        for prop in level {
            if seen.contains(&prop.name) {
                continue;
            }
            if !candidates.contains_key(&prop.name) {
                order.push(prop.name.clone());
            }
            candidates.entry(prop.name.clone()).or_default().push(prop);
        }
        for name in order {
            // SAFETY: every name in `order` was inserted into `candidates`
            let mut group = candidates.remove(&name).unwrap();
            let narrowest = group.iter().position(|c| {
                group
                    .iter()
                    .all(|o| universe.is_assignable(&c.declared, &o.declared))
            });
            let Some(pick) = narrowest else {
                return Err(SchemaError::AmbiguousProperty {
                    schema: type_name.to_owned(),
                    name,
                    types: group.iter().map(|c| c.declared.to_string()).collect(),
                });
            };
            seen.insert(name);
            resolved.push(group.swap_remove(pick));
        }
    }
    Ok(resolved)
}
