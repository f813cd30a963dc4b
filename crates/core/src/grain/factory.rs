use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use lazy_static::lazy_static;

use crate::collect::ConstMap;
use crate::value::Value;

use super::builder::GrainBuilder;
use super::grain::Grain;
use super::schema::GrainSchema;

/// The per-schema entry point: hands out the schema descriptor, the
/// all-default grain, and builders. One factory per generated grain type,
/// created at registration time and read-only afterwards.
pub trait GrainFactory: Send + Sync {
    fn schema(&self) -> &Arc<GrainSchema>;

    /// The grain with every basis slot at its schema default and no
    /// extensions.
    fn default_grain(&self) -> Grain;

    /// A fresh builder: all basis slots `Null`.
    fn new_builder(&self) -> GrainBuilder;

    /// A builder pre-populated from `grain`.
    fn builder_of(&self, grain: &Grain) -> GrainBuilder;
}

/// The standard factory over a generated [`GrainSchema`]. The default
/// grain is built once, at construction.
pub struct BasicGrainFactory {
    schema: Arc<GrainSchema>,
    default: Grain,
}

impl BasicGrainFactory {
    pub fn new(schema: Arc<GrainSchema>) -> BasicGrainFactory {
        let basis: Arc<[Value]> = schema.defaults().to_vec().into();
        let default = Grain::from_parts(Arc::clone(&schema), basis, ConstMap::empty());
        BasicGrainFactory { schema, default }
    }
}

impl GrainFactory for BasicGrainFactory {
    fn schema(&self) -> &Arc<GrainSchema> {
        &self.schema
    }

    fn default_grain(&self) -> Grain {
        self.default.clone()
    }

    fn new_builder(&self) -> GrainBuilder {
        GrainBuilder::new(Arc::clone(&self.schema))
    }

    fn builder_of(&self, grain: &Grain) -> GrainBuilder {
        GrainBuilder::of(grain)
    }
}

lazy_static! {
    static ref REGISTRY: RwLock<HashMap<String, Arc<dyn GrainFactory>>> =
        RwLock::new(HashMap::new());
}

/// Registers a factory under its schema name, exactly once per process.
/// When two registrations race, the first one in wins and the loser gets
/// the winner's instance back; callers should keep the returned factory.
pub fn register_factory(factory: Arc<dyn GrainFactory>) -> Arc<dyn GrainFactory> {
    let name = factory.schema().name().to_owned();
    // SAFETY: registry lock cannot be poisoned, no code panics while holding it
    let mut registry = REGISTRY.write().unwrap();
    match registry.entry(name) {
        std::collections::hash_map::Entry::Occupied(winner) => Arc::clone(winner.get()),
        std::collections::hash_map::Entry::Vacant(slot) => {
            slot.insert(Arc::clone(&factory));
            factory
        }
    }
}

/// Looks a factory up by schema name.
pub fn factory_for(schema_name: &str) -> Option<Arc<dyn GrainFactory>> {
    // SAFETY: registry lock cannot be poisoned, no code panics while holding it
    let registry = REGISTRY.read().unwrap();
    registry.get(schema_name).map(Arc::clone)
}

/// Looks a factory up by its generated grain type name.
pub fn factory_for_grain(grain_name: &str) -> Option<Arc<dyn GrainFactory>> {
    // SAFETY: registry lock cannot be poisoned, no code panics while holding it
    let registry = REGISTRY.read().unwrap();
    registry
        .values()
        .find(|f| f.schema().grain_name() == grain_name)
        .map(Arc::clone)
}
