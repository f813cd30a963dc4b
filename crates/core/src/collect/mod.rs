//! Const collections: immutable, structurally shared collections with a
//! `with`/`without` algebra.
//!
//! Every operation returns a new collection; operations that would not
//! change the contents return a handle to the *same* underlying storage,
//! observable through `same_storage`. Grain views and [`Value`](crate::Value)
//! containers are built from these.

mod list;
mod map;
mod set;
mod sorted;

pub use list::ConstList;
pub use map::ConstMap;
pub use set::ConstSet;
pub use sorted::{ConstSortedMap, ConstSortedSet};
