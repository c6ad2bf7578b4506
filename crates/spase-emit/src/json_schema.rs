//! JSON Schema emitter
//!
//! Builds a draft-07 schema for one class from its frame. Referenced classes
//! are fetched through a [`ClassFrameResolver`] and pooled once under
//! `definitions`, so cyclic and diamond-shaped class graphs stay finite.

use std::collections::HashSet;

use serde_json::{json, Map, Value};
use tracing::{debug, trace};

use spase_model::ScalarType;

use crate::frame::{ClassFrame, ClassFrameResolver, FrameType};
use crate::Result;

/// JSON Schema fragment for a scalar type
pub fn scalar_fragment(scalar: ScalarType) -> Value {
    match scalar {
        ScalarType::String => json!({"type": "string"}),
        ScalarType::Timestamp => json!({"type": "string", "format": "date-time"}),
        ScalarType::Float => json!({"type": "number"}),
        ScalarType::Duration => json!({"type": "string", "format": "duration"}),
        ScalarType::Integer => json!({"type": "integer"}),
    }
}

/// Definitions accumulated during one schema build.
///
/// A class is either finished (its schema is in `definitions`) or in
/// progress (somewhere up the current recursion). Either way it is never
/// resolved again.
#[derive(Debug, Default)]
pub struct DefinitionPool {
    definitions: Map<String, Value>,
    in_progress: HashSet<String>,
    referenced: HashSet<String>,
    resolved: usize,
}

impl DefinitionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finished or in progress
    pub fn is_known(&self, class: &str) -> bool {
        self.definitions.contains_key(class) || self.in_progress.contains(class)
    }

    pub fn get(&self, class: &str) -> Option<&Value> {
        self.definitions.get(class)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// How many frames were fetched from the resolver
    pub fn resolved(&self) -> usize {
        self.resolved
    }

    pub fn into_definitions(self) -> Map<String, Value> {
        self.definitions
    }

    fn reference(&mut self, class: &str) -> Value {
        self.referenced.insert(class.to_string());
        json!({"$ref": format!("#/definitions/{class}")})
    }
}

/// Build the JSON Schema for `frame`, resolving referenced classes through
/// `resolver`.
///
/// # Errors
///
/// Resolver failures (typically [`crate::Error::NotFound`]) propagate
/// unchanged.
pub fn convert_frame_to_schema(frame: &ClassFrame, resolver: &dyn ClassFrameResolver) -> Result<Value> {
    let mut pool = DefinitionPool::new();
    pool.in_progress.insert(frame.class.clone());
    let body = object_schema(frame, resolver, &mut pool)?;
    pool.in_progress.remove(&frame.class);

    // A class that refers back to itself needs its own definition too
    if pool.referenced.contains(&frame.class) {
        pool.definitions.insert(frame.class.clone(), body.clone());
    }

    debug!(
        class = %frame.class,
        definitions = pool.len(),
        resolved = pool.resolved(),
        "Built JSON Schema"
    );

    let mut schema = Map::new();
    schema.insert("definitions".into(), Value::Object(pool.into_definitions()));
    if let Value::Object(fields) = body {
        schema.extend(fields);
    }
    Ok(Value::Object(schema))
}

/// Resolve `class` and build its JSON Schema
///
/// # Errors
///
/// See [`convert_frame_to_schema`].
pub fn schema_for_class(resolver: &dyn ClassFrameResolver, class: &str) -> Result<Value> {
    let frame = resolver.class_frame(class)?;
    convert_frame_to_schema(&frame, resolver)
}

fn object_schema(
    frame: &ClassFrame,
    resolver: &dyn ClassFrameResolver,
    pool: &mut DefinitionPool,
) -> Result<Value> {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in &frame.fields {
        let fragment = match &field.frame_type {
            FrameType::Scalar(scalar) => scalar_fragment(*scalar),
            FrameType::Enum { values, .. } => json!({"type": "string", "enum": values}),
            FrameType::Class(class) => {
                define(class, resolver, pool)?;
                pool.reference(class)
            }
        };
        let fragment = if field.cardinality.is_array() {
            json!({"type": "array", "items": fragment})
        } else {
            fragment
        };
        if field.cardinality.is_required() {
            required.push(Value::String(field.name.clone()));
        }
        properties.insert(field.name.clone(), fragment);
    }

    Ok(json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    }))
}

fn define(class: &str, resolver: &dyn ClassFrameResolver, pool: &mut DefinitionPool) -> Result<()> {
    if pool.is_known(class) {
        trace!(class, "Definition already pooled");
        return Ok(());
    }

    pool.in_progress.insert(class.to_string());
    let frame = resolver.class_frame(class)?;
    pool.resolved += 1;
    let body = object_schema(&frame, resolver, pool)?;
    pool.in_progress.remove(class);
    pool.definitions.insert(class.to_string(), body);
    Ok(())
}
