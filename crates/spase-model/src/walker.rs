//! Ontology walker
//!
//! Turns a dictionary plus ontology into flat per-container field tables.
//! Subclass references are recorded by name and never expanded here; the
//! JSON Schema emitter expands them on demand through class frames.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::model::{Dictionary, Ontology, TypeDefinition, TypeTag};
use crate::types::{map_cardinality, map_primitive, Cardinality, TargetType};
use crate::{Error, Result};

/// One resolved field of one container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntermediateField {
    pub name: String,
    pub target_type: TargetType,
    pub cardinality: Cardinality,
    /// True when `target_type` names another Container
    pub is_subclass_reference: bool,
    pub description: String,
}

/// Field table for one container, fields in `subElements` order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerTable {
    pub name: String,
    pub definition: String,
    pub fields: Vec<IntermediateField>,
}

impl ContainerTable {
    pub fn field(&self, name: &str) -> Option<&IntermediateField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Names of containers this one depends on, first-seen order, deduplicated
    pub fn subclass_references(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.fields
            .iter()
            .filter(|f| f.is_subclass_reference)
            .filter_map(|f| f.target_type.as_reference())
            .filter(|name| seen.insert(*name))
            .collect()
    }
}

/// An enumeration and its literals, in source order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumTable {
    pub name: String,
    pub definition: String,
    pub values: Vec<String>,
}

/// Everything the emitters need, derived from one model
#[derive(Debug, Clone, PartialEq)]
pub struct WalkedModel {
    /// Containers in dictionary order
    pub containers: Vec<ContainerTable>,
    /// Enumerations in dictionary order
    pub enums: Vec<EnumTable>,
    /// Every dictionary name → its definition text
    pub documentation: IndexMap<String, String>,
    /// Every dictionary name → its resolved type
    pub types: IndexMap<String, TargetType>,
}

impl WalkedModel {
    pub fn container(&self, name: &str) -> Option<&ContainerTable> {
        self.containers.iter().find(|c| c.name == name)
    }

    pub fn enumeration(&self, name: &str) -> Option<&EnumTable> {
        self.enums.iter().find(|e| e.name == name)
    }
}

/// Walk a dictionary and ontology into field tables.
///
/// All cross references are checked before anything is returned, so a model
/// that is internally inconsistent yields an error and no partial output.
///
/// # Errors
///
/// * [`Error::UnresolvedReference`] when an entry's type is neither a
///   primitive nor a dictionary Container/Enumeration
/// * [`Error::NotAContainer`], [`Error::UnknownObject`],
///   [`Error::UndeclaredField`] for ontology entries that do not line up
///   with the dictionary
/// * [`Error::UndefinedElement`], [`Error::MissingOccurrence`],
///   [`Error::UnknownCardinalityMarker`] while resolving container fields
pub fn build_schema(dictionary: &Dictionary, ontology: &Ontology) -> Result<WalkedModel> {
    let mut documentation = IndexMap::with_capacity(dictionary.len());
    let mut types = IndexMap::with_capacity(dictionary.len());
    for (name, definition) in dictionary {
        documentation.insert(name.clone(), definition.definition.clone());
        types.insert(name.clone(), resolve_type(dictionary, name, definition)?);
    }

    check_ontology(dictionary, ontology)?;

    let mut containers = Vec::new();
    let mut enums = Vec::new();
    for (name, definition) in dictionary {
        match definition.tag {
            TypeTag::Container => {
                containers.push(walk_container(dictionary, ontology, &types, name, definition)?);
            }
            TypeTag::Enumeration => enums.push(EnumTable {
                name: name.to_string(),
                definition: definition.definition.clone(),
                values: definition.allowed_values.clone(),
            }),
            TypeTag::Named(_) => {}
        }
    }

    info!(
        containers = containers.len(),
        enums = enums.len(),
        entries = dictionary.len(),
        "Walked SPASE model"
    );

    Ok(WalkedModel {
        containers,
        enums,
        documentation,
        types,
    })
}

fn resolve_type(dictionary: &Dictionary, name: &str, definition: &TypeDefinition) -> Result<TargetType> {
    match &definition.tag {
        TypeTag::Container | TypeTag::Enumeration => Ok(TargetType::Reference(name.to_string())),
        TypeTag::Named(tag) => match map_primitive(tag) {
            scalar @ TargetType::Scalar(_) => Ok(scalar),
            TargetType::Reference(target) => match dictionary.get(&target) {
                Some(def) if def.is_container() || def.is_enumeration() => {
                    trace!(element = name, target = %target, "Resolved forward reference");
                    Ok(TargetType::Reference(target))
                }
                _ => Err(Error::UnresolvedReference {
                    element: name.to_string(),
                    target,
                }),
            },
        },
    }
}

fn check_ontology(dictionary: &Dictionary, ontology: &Ontology) -> Result<()> {
    for (container, fields) in ontology {
        let definition = dictionary
            .get(container)
            .filter(|def| def.is_container())
            .ok_or_else(|| Error::NotAContainer(container.to_string()))?;

        for (field, descriptor) in fields {
            if !dictionary.contains_key(&descriptor.object) {
                return Err(Error::UnknownObject {
                    container: container.to_string(),
                    field: field.to_string(),
                    object: descriptor.object.clone(),
                });
            }
            if !definition.sub_elements.iter().any(|e| e == field) {
                return Err(Error::UndeclaredField {
                    container: container.to_string(),
                    field: field.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn walk_container(
    dictionary: &Dictionary,
    ontology: &Ontology,
    types: &IndexMap<String, TargetType>,
    name: &str,
    definition: &TypeDefinition,
) -> Result<ContainerTable> {
    let occurrences = ontology.get(name);
    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(definition.sub_elements.len());

    for element in &definition.sub_elements {
        if !seen.insert(element.as_str()) {
            return Err(Error::InvalidFormat(format!(
                "container '{name}' lists subElement '{element}' more than once"
            )));
        }

        let element_def = dictionary
            .get(element)
            .ok_or_else(|| Error::UndefinedElement {
                container: name.to_string(),
                element: element.clone(),
            })?;
        let target_type = types
            .get(element)
            .cloned()
            .ok_or_else(|| Error::UndefinedElement {
                container: name.to_string(),
                element: element.clone(),
            })?;

        let descriptor = occurrences
            .and_then(|fields| fields.get(element))
            .ok_or_else(|| Error::MissingOccurrence {
                container: name.to_string(),
                field: element.clone(),
            })?;
        let cardinality =
            map_cardinality(&descriptor.occurrence).map_err(|e| e.at(name, element))?;

        let is_subclass_reference = target_type
            .as_reference()
            .and_then(|target| dictionary.get(target))
            .is_some_and(TypeDefinition::is_container);

        fields.push(IntermediateField {
            name: element.clone(),
            target_type,
            cardinality,
            is_subclass_reference,
            description: element_def.definition.clone(),
        });
    }

    debug!(
        container = name,
        fields = fields.len(),
        "Resolved container fields"
    );

    Ok(ContainerTable {
        name: name.to_string(),
        definition: definition.definition.clone(),
        fields,
    })
}
