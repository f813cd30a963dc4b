//! The generation pipeline: resolve properties, cook their declared
//! types, immutify, attach defaults.
//!
//! One run handles a batch of schemas and reports every problem it found
//! across the whole batch, instead of stopping at the first. A run that
//! produced any error yields no artifacts.

use std::collections::HashSet;
use std::sync::Arc;

use grain_core::error::GrainError;
use grain_core::grain::{register_factory, BasicGrainFactory, GrainFactory};
use grain_core::reflect::TypeUniverse;
use tracing::debug;

use crate::artifact::{default_value_for, PropertyArtifact, SchemaArtifact};
use crate::cook::cook;
use crate::error::SchemaError;
use crate::immutify::{Immutify, TypePolicy};
use crate::naming;
use crate::symbols;

/// Generates one artifact per requested schema.
///
/// The run sees the given policy extended with the batch's own grain type
/// names registered as immutable, so schemas may refer to each other (and
/// to themselves) through container properties.
pub fn generate(
    universe: &TypeUniverse,
    schemas: &[&str],
    policy: &TypePolicy,
) -> Result<Vec<SchemaArtifact>, Vec<SchemaError>> {
    let mut errors: Vec<SchemaError> = Vec::new();
    let mut requested: Vec<&str> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for &name in schemas {
        if !seen.insert(name) {
            errors.push(SchemaError::DuplicateSchema {
                name: name.to_owned(),
            });
            continue;
        }
        if !universe.is_schema(name) {
            errors.push(SchemaError::UnknownSchema {
                name: name.to_owned(),
            });
            continue;
        }
        requested.push(name);
    }

    let mut run_policy = policy.clone();
    for name in &requested {
        run_policy.register_immutable(naming::grain_name(name));
    }
    let mut immutify = Immutify::new(universe, &run_policy);

    let mut artifacts = Vec::new();
    for name in requested {
        if let Some(artifact) = generate_schema(universe, name, &mut immutify, &mut errors) {
            artifacts.push(artifact);
        }
    }
    if errors.is_empty() {
        Ok(artifacts)
    } else {
        Err(errors)
    }
}

/// One schema through the pipeline. Property-level failures are recorded
/// and the remaining properties still run, so one pass reports them all.
fn generate_schema(
    universe: &TypeUniverse,
    schema: &str,
    immutify: &mut Immutify<'_>,
    errors: &mut Vec<SchemaError>,
) -> Option<SchemaArtifact> {
    let resolved = match symbols::resolve_properties(universe, schema) {
        Ok(resolved) => resolved,
        Err(e) => {
            errors.push(e);
            return None;
        }
    };

    let before = errors.len();
    let mut properties = Vec::with_capacity(resolved.len());
    for property in resolved {
        let cooked = match cook(universe, &property.declared) {
            Ok(cooked) => cooked,
            Err(source) => {
                errors.push(SchemaError::Cook {
                    schema: schema.to_owned(),
                    property: property.name,
                    source,
                });
                continue;
            }
        };
        let immutable = match immutify.immutify(&cooked) {
            Ok(immutable) => immutable,
            Err(source) => {
                errors.push(SchemaError::Immutify {
                    schema: schema.to_owned(),
                    property: property.name,
                    source,
                });
                continue;
            }
        };
        let default = default_value_for(&immutable);
        properties.push(PropertyArtifact {
            name: property.name,
            declared: cooked,
            immutable,
            default,
            flags: property.flags,
        });
    }
    if errors.len() > before {
        return None;
    }
    debug!(schema, properties = properties.len(), "generated schema artifact");
    Some(SchemaArtifact::new(schema, properties))
}

/// Converts artifacts into runtime schemas and registers a factory for
/// each, returning the factories in artifact order. A name already
/// registered keeps its first factory.
pub fn install(artifacts: &[SchemaArtifact]) -> Result<Vec<Arc<dyn GrainFactory>>, GrainError> {
    let mut factories = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let schema = Arc::new(artifact.to_grain_schema()?);
        factories.push(register_factory(Arc::new(BasicGrainFactory::new(schema))));
    }
    Ok(factories)
}
