//! A structural model of the source type system: type trees, declarations,
//! and the queries the generator runs over them.

mod types;
mod universe;

pub use types::Type;
pub use universe::{names, Decl, DeclKind, MethodSig, TypeParam, TypeUniverse};
