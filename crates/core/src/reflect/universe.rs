//! The declaration universe: the arena of type declarations that gives
//! meaning to the names inside a [`Type`] tree.
//!
//! Every `Named`/`Parameterized` raw name and every `Var` resolves against a
//! [`Decl`] registered here. The universe also answers the two questions the
//! generator keeps asking: what does a name erase to, and is one type
//! assignable to another (erasure-level lattice reachability).

use super::types::Type;
use crate::error::ReflectError;
use std::collections::{HashMap, HashSet, VecDeque};

/// Well-known declaration names seeded by [`TypeUniverse::with_standard`].
pub mod names {
    pub const OBJECT: &str = "Object";
    pub const NUMBER: &str = "Number";
    pub const BOOL: &str = "Bool";
    pub const INT32: &str = "Int32";
    pub const INT64: &str = "Int64";
    pub const FLOAT32: &str = "Float32";
    pub const FLOAT64: &str = "Float64";
    pub const DECIMAL: &str = "Decimal";
    pub const BIG_INTEGER: &str = "BigInteger";
    pub const STRING: &str = "String";
    pub const UUID: &str = "UUID";
    pub const URI: &str = "URI";
    pub const CURRENCY: &str = "Currency";
    pub const ENUM: &str = "Enum";
    pub const ENUM_SET: &str = "EnumSet";

    pub const COLLECTION: &str = "Collection";
    pub const LIST: &str = "List";
    pub const SET: &str = "Set";
    pub const SORTED_SET: &str = "SortedSet";
    pub const MAP: &str = "Map";
    pub const SORTED_MAP: &str = "SortedMap";

    pub const CONST_COLLECTION: &str = "ConstCollection";
    pub const CONST_LIST: &str = "ConstList";
    pub const CONST_SET: &str = "ConstSet";
    pub const CONST_SORTED_SET: &str = "ConstSortedSet";
    pub const CONST_MAP: &str = "ConstMap";
    pub const CONST_SORTED_MAP: &str = "ConstSortedMap";

    pub const BASIC_CONST_LIST: &str = "BasicConstList";
    pub const BASIC_CONST_SET: &str = "BasicConstSet";
    pub const BASIC_CONST_SORTED_SET: &str = "BasicConstSortedSet";
    pub const BASIC_CONST_MAP: &str = "BasicConstMap";
    pub const BASIC_CONST_SORTED_MAP: &str = "BasicConstSortedMap";
}

/// What kind of declaration a name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    /// A built-in immutable value type (Bool, Int64, String, UUID, ...).
    Value,
    Class,
    Interface,
    /// An enumeration type. Enums are immutable by construction.
    Enum,
    /// A schema interface declared by the user; the generator derives a
    /// grain type from it.
    Schema,
}

/// A declared type parameter with its declared bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParam {
    pub name: String,
    /// Declared upper bounds; empty means `Object`.
    pub bounds: Vec<Type>,
}

/// A method signature on a schema declaration. The property resolver
/// inspects these for accessor shape; everything else ignores them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSig {
    pub name: String,
    /// `None` means void.
    pub returns: Option<Type>,
    pub params: Vec<Type>,
    pub is_static: bool,
    pub is_public: bool,
}

impl MethodSig {
    /// A public zero-argument accessor returning `ty`.
    pub fn accessor(name: impl Into<String>, ty: Type) -> MethodSig {
        MethodSig {
            name: name.into(),
            returns: Some(ty),
            params: Vec::new(),
            is_static: false,
            is_public: true,
        }
    }
}

/// A single type declaration.
#[derive(Debug, Clone)]
pub struct Decl {
    pub name: String,
    pub kind: DeclKind,
    pub params: Vec<TypeParam>,
    /// Declared supertypes, possibly parameterized in this decl's own
    /// type parameters.
    pub supers: Vec<Type>,
    /// Declared methods; populated for schema interfaces.
    pub methods: Vec<MethodSig>,
    /// The enclosing declaration for inner (non-static nested) types.
    pub enclosing: Option<String>,
}

impl Decl {
    fn new(name: impl Into<String>, kind: DeclKind) -> Decl {
        Decl {
            name: name.into(),
            kind,
            params: Vec::new(),
            supers: Vec::new(),
            methods: Vec::new(),
            enclosing: None,
        }
    }

    pub fn value(name: impl Into<String>) -> Decl {
        Decl::new(name, DeclKind::Value)
    }

    pub fn class(name: impl Into<String>) -> Decl {
        Decl::new(name, DeclKind::Class)
    }

    pub fn interface(name: impl Into<String>) -> Decl {
        Decl::new(name, DeclKind::Interface)
    }

    pub fn enumeration(name: impl Into<String>) -> Decl {
        Decl::new(name, DeclKind::Enum)
    }

    pub fn schema(name: impl Into<String>) -> Decl {
        Decl::new(name, DeclKind::Schema)
    }

    pub fn with_param(mut self, name: impl Into<String>, bounds: Vec<Type>) -> Decl {
        self.params.push(TypeParam {
            name: name.into(),
            bounds,
        });
        self
    }

    pub fn extending(mut self, supertype: Type) -> Decl {
        self.supers.push(supertype);
        self
    }

    pub fn with_method(mut self, method: MethodSig) -> Decl {
        self.methods.push(method);
        self
    }

    pub fn enclosed_by(mut self, outer: impl Into<String>) -> Decl {
        self.enclosing = Some(outer.into());
        self
    }
}

/// The arena of declarations, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct TypeUniverse {
    decls: HashMap<String, Decl>,
}

impl TypeUniverse {
    pub fn new() -> TypeUniverse {
        TypeUniverse::default()
    }

    /// A universe pre-seeded with the standard declarations: `Object`, the
    /// numeric and value types, `Enum`/`EnumSet`, the mutable container
    /// interfaces, and the const containers with their `Basic*` classes.
    pub fn with_standard() -> TypeUniverse {
        use names::*;
        let mut u = TypeUniverse::new();
        let mut seed = |d: Decl| {
            // SAFETY: seeding inserts each standard name exactly once
            u.declare(d).unwrap();
        };

        seed(Decl::class(OBJECT));
        seed(Decl::class(NUMBER).extending(Type::named(OBJECT)));
        for n in [BOOL, STRING, UUID, URI, CURRENCY] {
            seed(Decl::value(n).extending(Type::named(OBJECT)));
        }
        for n in [INT32, INT64, FLOAT32, FLOAT64, DECIMAL, BIG_INTEGER] {
            seed(Decl::value(n).extending(Type::named(NUMBER)));
        }

        // Enum<E extends Enum<E>> and EnumSet<E extends Enum<E>> carry the
        // classic self-referential parameter bound.
        seed(
            Decl::enumeration(ENUM)
                .with_param(
                    "E",
                    vec![Type::parameterized(ENUM, vec![Type::var(ENUM, "E")])],
                )
                .extending(Type::named(OBJECT)),
        );
        seed(
            Decl::class(ENUM_SET)
                .with_param(
                    "E",
                    vec![Type::parameterized(ENUM, vec![Type::var(ENUM_SET, "E")])],
                )
                .extending(Type::parameterized(SET, vec![Type::var(ENUM_SET, "E")])),
        );

        seed(Decl::interface(COLLECTION).with_param("E", vec![]));
        seed(
            Decl::interface(LIST)
                .with_param("E", vec![])
                .extending(Type::parameterized(COLLECTION, vec![Type::var(LIST, "E")])),
        );
        seed(
            Decl::interface(SET)
                .with_param("E", vec![])
                .extending(Type::parameterized(COLLECTION, vec![Type::var(SET, "E")])),
        );
        seed(
            Decl::interface(SORTED_SET)
                .with_param("E", vec![])
                .extending(Type::parameterized(SET, vec![Type::var(SORTED_SET, "E")])),
        );
        seed(Decl::interface(MAP).with_param("K", vec![]).with_param("V", vec![]));
        seed(
            Decl::interface(SORTED_MAP)
                .with_param("K", vec![])
                .with_param("V", vec![])
                .extending(Type::parameterized(
                    MAP,
                    vec![Type::var(SORTED_MAP, "K"), Type::var(SORTED_MAP, "V")],
                )),
        );

        seed(
            Decl::interface(CONST_COLLECTION)
                .with_param("E", vec![])
                .extending(Type::parameterized(
                    COLLECTION,
                    vec![Type::var(CONST_COLLECTION, "E")],
                )),
        );
        for (konst, mutable) in [(CONST_LIST, LIST), (CONST_SET, SET)] {
            seed(
                Decl::interface(konst)
                    .with_param("E", vec![])
                    .extending(Type::parameterized(mutable, vec![Type::var(konst, "E")]))
                    .extending(Type::parameterized(
                        CONST_COLLECTION,
                        vec![Type::var(konst, "E")],
                    )),
            );
        }
        seed(
            Decl::interface(CONST_SORTED_SET)
                .with_param("E", vec![])
                .extending(Type::parameterized(
                    SORTED_SET,
                    vec![Type::var(CONST_SORTED_SET, "E")],
                ))
                .extending(Type::parameterized(
                    CONST_SET,
                    vec![Type::var(CONST_SORTED_SET, "E")],
                )),
        );
        seed(
            Decl::interface(CONST_MAP)
                .with_param("K", vec![])
                .with_param("V", vec![])
                .extending(Type::parameterized(
                    MAP,
                    vec![Type::var(CONST_MAP, "K"), Type::var(CONST_MAP, "V")],
                )),
        );
        seed(
            Decl::interface(CONST_SORTED_MAP)
                .with_param("K", vec![])
                .with_param("V", vec![])
                .extending(Type::parameterized(
                    SORTED_MAP,
                    vec![
                        Type::var(CONST_SORTED_MAP, "K"),
                        Type::var(CONST_SORTED_MAP, "V"),
                    ],
                ))
                .extending(Type::parameterized(
                    CONST_MAP,
                    vec![
                        Type::var(CONST_SORTED_MAP, "K"),
                        Type::var(CONST_SORTED_MAP, "V"),
                    ],
                )),
        );

        for (basic, iface) in [
            (BASIC_CONST_LIST, CONST_LIST),
            (BASIC_CONST_SET, CONST_SET),
            (BASIC_CONST_SORTED_SET, CONST_SORTED_SET),
        ] {
            seed(
                Decl::class(basic)
                    .with_param("E", vec![])
                    .extending(Type::parameterized(iface, vec![Type::var(basic, "E")])),
            );
        }
        for (basic, iface) in [
            (BASIC_CONST_MAP, CONST_MAP),
            (BASIC_CONST_SORTED_MAP, CONST_SORTED_MAP),
        ] {
            seed(
                Decl::class(basic)
                    .with_param("K", vec![])
                    .with_param("V", vec![])
                    .extending(Type::parameterized(
                        iface,
                        vec![Type::var(basic, "K"), Type::var(basic, "V")],
                    )),
            );
        }

        u
    }

    /// Register a declaration. Names are unique.
    pub fn declare(&mut self, decl: Decl) -> Result<(), ReflectError> {
        if self.decls.contains_key(&decl.name) {
            return Err(ReflectError::DuplicateDeclaration { name: decl.name });
        }
        self.decls.insert(decl.name.clone(), decl);
        Ok(())
    }

    pub fn decl(&self, name: &str) -> Option<&Decl> {
        self.decls.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&Decl, ReflectError> {
        self.decls
            .get(name)
            .ok_or_else(|| ReflectError::UnknownDeclaration {
                name: name.to_owned(),
            })
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.decls.contains_key(name)
    }

    pub fn is_schema(&self, name: &str) -> bool {
        matches!(self.decl(name), Some(d) if d.kind == DeclKind::Schema)
    }

    /// The declared bounds of `decl`'s parameter `param`, if both exist.
    pub fn param_bounds(&self, decl: &str, param: &str) -> Option<&[Type]> {
        self.decl(decl)?
            .params
            .iter()
            .find(|p| p.name == param)
            .map(|p| p.bounds.as_slice())
    }

    /// The erasure of a type: parameterized types drop their arguments,
    /// wildcards and vars erase to their first upper bound. Cyclic var
    /// bounds bottom out at `Object`.
    pub fn erasure(&self, t: &Type) -> Type {
        let mut visited = HashSet::new();
        self.erasure_guarded(t, &mut visited)
    }

    fn erasure_guarded(&self, t: &Type, visited: &mut HashSet<(String, String)>) -> Type {
        match t {
            Type::Named(_) => t.clone(),
            Type::Parameterized { raw, .. } => Type::Named(raw.clone()),
            Type::Array(c) => Type::array(self.erasure_guarded(c, visited)),
            Type::Wildcard { upper, .. } => match upper.first() {
                Some(b) => self.erasure_guarded(b, visited),
                None => Type::named(names::OBJECT),
            },
            Type::Var { decl, name } => {
                if !visited.insert((decl.clone(), name.clone())) {
                    return Type::named(names::OBJECT);
                }
                match self.param_bounds(decl, name).and_then(|b| b.first()) {
                    Some(bound) => self.erasure_guarded(bound, visited),
                    None => Type::named(names::OBJECT),
                }
            }
        }
    }

    /// Erasure-level assignability: can a value of type `sub` stand where
    /// `sup` is expected. Everything is assignable to `Object`; named types
    /// check reachability through the declared supertype lattice.
    pub fn is_assignable(&self, sub: &Type, sup: &Type) -> bool {
        let sub_e = self.erasure(sub);
        let sup_e = self.erasure(sup);
        self.erased_assignable(&sub_e, &sup_e)
    }

    fn erased_assignable(&self, sub: &Type, sup: &Type) -> bool {
        if let Type::Named(s) = sup {
            if s == names::OBJECT {
                return true;
            }
        }
        match (sub, sup) {
            (Type::Array(a), Type::Array(b)) => self.erased_assignable(a, b),
            (Type::Named(a), Type::Named(b)) => a == b || self.reaches(a, b),
            _ => false,
        }
    }

    /// Breadth-first walk of `from`'s supertype lattice looking for `to`.
    /// Diamond ancestors are visited once.
    fn reaches(&self, from: &str, to: &str) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(from);
        while let Some(name) = queue.pop_front() {
            if !visited.insert(name) {
                continue;
            }
            if name == to {
                return true;
            }
            if let Some(decl) = self.decl(name) {
                for s in &decl.supers {
                    if let Some(raw) = s.raw_name() {
                        queue.push_back(raw);
                    }
                }
            }
        }
        false
    }
}
