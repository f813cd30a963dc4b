//! The grain data model: immutable structural records with a fixed basis
//! and open extensions, their builders, cursors, and factories.

mod builder;
mod factory;
#[allow(clippy::module_inception)]
mod grain;
mod iter;
mod schema;

pub use builder::{BuilderCursor, GrainBuilder};
pub use factory::{
    factory_for, factory_for_grain, register_factory, BasicGrainFactory, GrainFactory,
};
pub use grain::Grain;
pub use iter::{GrainCursor, GrainIter};
pub use schema::{flags, GrainProperty, GrainSchema};
