//! Immutabilization: rewriting cooked property types into their immutable
//! counterparts under a registration policy.

use std::collections::{HashMap, HashSet};

use grain_core::reflect::{names, DeclKind, Type, TypeUniverse};

use crate::error::{ImmutifyError, PolicyError};
use crate::naming;

/// The immutability registration table: names known to be immutable
/// outright, plus narrowing mappings from mutable container interfaces to
/// their immutable counterparts.
#[derive(Debug, Clone, Default)]
pub struct TypePolicy {
    immutable: HashSet<String>,
    mappings: HashMap<String, String>,
}

impl TypePolicy {
    pub fn new() -> TypePolicy {
        TypePolicy::default()
    }

    /// The standard policy: const containers map to themselves, the
    /// mutable container interfaces map to their const counterparts.
    /// Value types and enums need no registration; they are recognized by
    /// declaration kind.
    pub fn standard(universe: &TypeUniverse) -> TypePolicy {
        let mut policy = TypePolicy::new();
        let pairs = [
            (names::COLLECTION, names::CONST_COLLECTION),
            (names::LIST, names::CONST_LIST),
            (names::SET, names::CONST_SET),
            (names::SORTED_SET, names::CONST_SORTED_SET),
            (names::MAP, names::CONST_MAP),
            (names::SORTED_MAP, names::CONST_SORTED_MAP),
            (names::CONST_COLLECTION, names::CONST_COLLECTION),
            (names::CONST_LIST, names::CONST_LIST),
            (names::CONST_SET, names::CONST_SET),
            (names::CONST_SORTED_SET, names::CONST_SORTED_SET),
            (names::CONST_MAP, names::CONST_MAP),
            (names::CONST_SORTED_MAP, names::CONST_SORTED_MAP),
            (names::BASIC_CONST_LIST, names::BASIC_CONST_LIST),
            (names::BASIC_CONST_SET, names::BASIC_CONST_SET),
            (names::BASIC_CONST_SORTED_SET, names::BASIC_CONST_SORTED_SET),
            (names::BASIC_CONST_MAP, names::BASIC_CONST_MAP),
            (names::BASIC_CONST_SORTED_MAP, names::BASIC_CONST_SORTED_MAP),
        ];
        for (source, target) in pairs {
            // SAFETY: standard pairs are declared and properly narrowing
            policy.register_mapping(universe, source, target).unwrap();
        }
        policy
    }

    /// Registers a type name as immutable outright.
    pub fn register_immutable(&mut self, name: impl Into<String>) {
        self.immutable.insert(name.into());
    }

    /// Registers (or re-registers, last wins) a narrowing mapping. The
    /// target must be a declared subtype of the source.
    pub fn register_mapping(
        &mut self,
        universe: &TypeUniverse,
        source: &str,
        target: &str,
    ) -> Result<(), PolicyError> {
        for name in [source, target] {
            if !universe.is_declared(name) {
                return Err(PolicyError::UnknownDeclaration {
                    name: name.to_owned(),
                });
            }
        }
        if !universe.is_assignable(&Type::named(target), &Type::named(source)) {
            return Err(PolicyError::NotNarrowing {
                source: source.to_owned(),
                target: target.to_owned(),
            });
        }
        self.mappings.insert(source.to_owned(), target.to_owned());
        Ok(())
    }

    /// The registered immutable counterpart for a container raw name.
    pub fn mapping_for(&self, raw: &str) -> Option<&str> {
        self.mappings.get(raw).map(String::as_str)
    }

    /// A raw name that maps to itself is a const container.
    pub fn is_const_container(&self, raw: &str) -> bool {
        self.mapping_for(raw) == Some(raw)
    }

    /// Whether a type is already fully immutable: registered names, value
    /// and enum declarations, and const containers whose arguments are all
    /// themselves immutable. Wildcard arguments count via their sole upper
    /// bound.
    pub fn is_immutable(&self, universe: &TypeUniverse, t: &Type) -> bool {
        match t {
            Type::Named(name) => {
                self.immutable.contains(name)
                    || matches!(
                        universe.decl(name).map(|d| d.kind),
                        Some(DeclKind::Value) | Some(DeclKind::Enum)
                    )
            }
            Type::Parameterized { raw, args, .. } => {
                self.is_const_container(raw) && args.iter().all(|a| self.is_immutable(universe, a))
            }
            Type::Wildcard { upper, lower } => {
                lower.is_empty()
                    && upper.len() == 1
                    && self.is_immutable(universe, &upper[0])
            }
            Type::Array(_) | Type::Var { .. } => false,
        }
    }
}

#[derive(Debug, Clone)]
enum MemoEntry {
    InProgress,
    Done(Type),
}

/// One immutabilization run: universe + policy + the run-scoped memo.
pub struct Immutify<'a> {
    universe: &'a TypeUniverse,
    policy: &'a TypePolicy,
    memo: HashMap<Type, MemoEntry>,
}

impl<'a> Immutify<'a> {
    pub fn new(universe: &'a TypeUniverse, policy: &'a TypePolicy) -> Immutify<'a> {
        Immutify {
            universe,
            policy,
            memo: HashMap::new(),
        }
    }

    /// The immutable form of a cooked type, or why none exists.
    pub fn immutify(&mut self, t: &Type) -> Result<Type, ImmutifyError> {
        match self.memo.get(t) {
            Some(MemoEntry::Done(done)) => return Ok(done.clone()),
            Some(MemoEntry::InProgress) => return Ok(t.clone()),
            None => {}
        }
        // the in-flight placeholder goes in before recursing into
        // type arguments
        self.memo.insert(t.clone(), MemoEntry::InProgress);
        let resolved = self.resolve(t);
        match &resolved {
            Ok(done) => {
                self.memo.insert(t.clone(), MemoEntry::Done(done.clone()));
            }
            Err(_) => {
                self.memo.remove(t);
            }
        }
        resolved
    }

    fn resolve(&mut self, t: &Type) -> Result<Type, ImmutifyError> {
        // 1. already immutable under the policy
        if self.policy.is_immutable(self.universe, t) {
            return Ok(t.clone());
        }
        match t {
            // 2. raw const containers hide an unbounded element type
            Type::Named(name) if self.policy.is_const_container(name) => {
                Err(ImmutifyError::RawConstContainer {
                    type_display: t.to_string(),
                })
            }
            // 3. schema interfaces become their generated grain type
            Type::Named(name) if self.universe.is_schema(name) => {
                Ok(Type::named(naming::grain_name(name)))
            }
            // 4. mapped containers: substitute and immutify the arguments
            Type::Parameterized { raw, args, .. }
                if self.policy.mapping_for(raw).is_some() =>
            {
                // SAFETY: guard above checked the mapping exists
                let target = self.policy.mapping_for(raw).unwrap().to_owned();
                let args = args
                    .iter()
                    .map(|a| self.resolve_argument(a))
                    .collect::<Result<Vec<Type>, ImmutifyError>>()?;
                Ok(Type::Parameterized {
                    raw: target,
                    args,
                    owner: None,
                })
            }
            // 5. arrays are never immutable
            Type::Array(_) => Err(ImmutifyError::Array {
                type_display: t.to_string(),
            }),
            Type::Wildcard { .. } => Err(ImmutifyError::OpenWildcard {
                type_display: t.to_string(),
            }),
            Type::Var { .. } => Err(ImmutifyError::TypeVariable {
                type_display: t.to_string(),
            }),
            // 6. plain classes, raw mutable containers, unregistered types
            _ => Err(ImmutifyError::Unregistered {
                type_display: t.to_string(),
            }),
        }
    }

    /// A container type argument. Wildcards immutify via their sole upper
    /// bound and stay wildcards; open wildcards and bare variables have no
    /// immutable form.
    fn resolve_argument(&mut self, arg: &Type) -> Result<Type, ImmutifyError> {
        match arg {
            Type::Wildcard { upper, lower } if lower.is_empty() && upper.len() == 1 => {
                Ok(Type::extends_wildcard(self.immutify(&upper[0])?))
            }
            Type::Wildcard { .. } => Err(ImmutifyError::OpenWildcard {
                type_display: arg.to_string(),
            }),
            Type::Var { .. } => Err(ImmutifyError::TypeVariable {
                type_display: arg.to_string(),
            }),
            other => self.immutify(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grain_core::reflect::Decl;

    fn setup() -> (TypeUniverse, TypePolicy) {
        let mut u = TypeUniverse::with_standard();
        u.declare(Decl::schema("Order")).unwrap();
        u.declare(Decl::enumeration("Color").extending(Type::parameterized(
            names::ENUM,
            vec![Type::named("Color")],
        )))
        .unwrap();
        u.declare(Decl::class("Gadget")).unwrap();
        let policy = TypePolicy::standard(&u);
        (u, policy)
    }

    #[test]
    fn value_types_and_enums_are_already_immutable() {
        let (u, p) = setup();
        let mut im = Immutify::new(&u, &p);
        for name in [names::INT64, names::STRING, names::DECIMAL, "Color"] {
            let t = Type::named(name);
            assert_eq!(im.immutify(&t).unwrap(), t);
        }
    }

    #[test]
    fn containers_map_to_const_counterparts() {
        let (u, p) = setup();
        let mut im = Immutify::new(&u, &p);
        let t = Type::parameterized(names::LIST, vec![Type::named(names::INT32)]);
        assert_eq!(im.immutify(&t).unwrap().to_string(), "ConstList<Int32>");

        let nested = Type::parameterized(
            names::MAP,
            vec![
                Type::named(names::STRING),
                Type::parameterized(names::SET, vec![Type::named("Color")]),
            ],
        );
        assert_eq!(
            im.immutify(&nested).unwrap().to_string(),
            "ConstMap<String, ConstSet<Color>>"
        );
    }

    #[test]
    fn schema_types_become_grain_types() {
        let (u, p) = setup();
        let mut im = Immutify::new(&u, &p);
        assert_eq!(
            im.immutify(&Type::named("Order")).unwrap(),
            Type::named("OrderGrain")
        );
        let t = Type::parameterized(names::LIST, vec![Type::named("Order")]);
        assert_eq!(im.immutify(&t).unwrap().to_string(), "ConstList<OrderGrain>");
    }

    #[test]
    fn failure_set_matches_the_contract() {
        let (u, p) = setup();
        let mut im = Immutify::new(&u, &p);
        assert!(matches!(
            im.immutify(&Type::named(names::OBJECT)).unwrap_err(),
            ImmutifyError::Unregistered { .. }
        ));
        assert!(matches!(
            im.immutify(&Type::named(names::LIST)).unwrap_err(),
            ImmutifyError::Unregistered { .. }
        ));
        assert!(matches!(
            im.immutify(&Type::array(Type::named(names::STRING))).unwrap_err(),
            ImmutifyError::Array { .. }
        ));
        assert!(matches!(
            im.immutify(&Type::named(names::CONST_LIST)).unwrap_err(),
            ImmutifyError::RawConstContainer { .. }
        ));
        assert!(matches!(
            im.immutify(&Type::named("Gadget")).unwrap_err(),
            ImmutifyError::Unregistered { .. }
        ));
    }

    #[test]
    fn wildcard_arguments_immutify_via_upper_bound() {
        let (u, p) = setup();
        let mut im = Immutify::new(&u, &p);
        let t = Type::parameterized(
            names::SET,
            vec![Type::extends_wildcard(Type::parameterized(
                names::LIST,
                vec![Type::named(names::INT64)],
            ))],
        );
        assert_eq!(
            im.immutify(&t).unwrap().to_string(),
            "ConstSet<? extends ConstList<Int64>>"
        );

        let unbounded = Type::parameterized(names::LIST, vec![Type::wildcard()]);
        assert!(matches!(
            im.immutify(&unbounded).unwrap_err(),
            ImmutifyError::OpenWildcard { .. }
        ));
        let lower = Type::parameterized(
            names::LIST,
            vec![Type::super_wildcard(Type::named(names::INT64))],
        );
        assert!(matches!(
            im.immutify(&lower).unwrap_err(),
            ImmutifyError::OpenWildcard { .. }
        ));
    }

    #[test]
    fn immutify_reaches_a_fixpoint() {
        let (u, mut p) = setup();
        p.register_immutable(naming::grain_name("Order"));
        let mut im = Immutify::new(&u, &p);
        let cases = [
            Type::parameterized(names::LIST, vec![Type::named(names::INT32)]),
            Type::parameterized(names::LIST, vec![Type::named("Order")]),
            Type::parameterized(
                names::SORTED_MAP,
                vec![Type::named(names::STRING), Type::named("Color")],
            ),
        ];
        for t in cases {
            let once = im.immutify(&t).unwrap();
            let twice = im.immutify(&once).unwrap();
            assert_eq!(twice, once, "no fixpoint for {t}");
        }
    }

    #[test]
    fn memo_reuses_resolved_types_within_a_run() {
        let (u, p) = setup();
        let mut im = Immutify::new(&u, &p);
        let t = Type::parameterized(names::LIST, vec![Type::named(names::INT32)]);
        let first = im.immutify(&t).unwrap();
        let second = im.immutify(&t).unwrap();
        assert_eq!(first, second);
        // failures are not cached as results
        let bad = Type::named(names::LIST);
        assert!(im.immutify(&bad).is_err());
        assert!(im.immutify(&bad).is_err());
    }

    #[test]
    fn narrowing_validation_rejects_bad_mappings() {
        let (u, mut p) = setup();
        assert_eq!(
            p.register_mapping(&u, names::LIST, names::CONST_SET),
            Err(PolicyError::NotNarrowing {
                source: "List".into(),
                target: "ConstSet".into()
            })
        );
        assert_eq!(
            p.register_mapping(&u, names::SET, "Phantom"),
            Err(PolicyError::UnknownDeclaration {
                name: "Phantom".into()
            })
        );
        // last registration wins
        p.register_mapping(&u, names::SET, names::BASIC_CONST_SET)
            .unwrap();
        assert_eq!(p.mapping_for(names::SET), Some(names::BASIC_CONST_SET));
    }
}
