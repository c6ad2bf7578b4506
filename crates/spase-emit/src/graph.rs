//! Graph-database schema emitter
//!
//! The schema is a JSON array: a context record, then one `Enum` document per
//! enumeration, then one `Class` document per container. Classes reference
//! other classes and enums by name only, so no recursion is needed here.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use spase_model::{build_schema, Cardinality, ScalarType, SpaseModel, TargetType, WalkedModel};

use crate::{Error, Result};

pub const DEFAULT_BASE: &str = "https://spase-group.org/data/";
pub const DEFAULT_SCHEMA: &str = "http://www.spase-group.org/data/schema";

/// The `@context` record heading every graph schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphContext {
    pub base: String,
    pub schema: String,
}

impl Default for GraphContext {
    fn default() -> Self {
        Self {
            base: DEFAULT_BASE.to_string(),
            schema: DEFAULT_SCHEMA.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumEntry {
    pub id: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassField {
    pub name: String,
    pub target: TargetType,
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassEntry {
    pub id: String,
    pub comment: String,
    /// Field name → field description, in field order
    pub properties: Vec<(String, String)>,
    pub fields: Vec<ClassField>,
}

impl ClassEntry {
    pub fn field(&self, name: &str) -> Option<&ClassField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaEntry {
    Enum(EnumEntry),
    Class(ClassEntry),
}

impl SchemaEntry {
    pub fn id(&self) -> &str {
        match self {
            Self::Enum(e) => &e.id,
            Self::Class(c) => &c.id,
        }
    }
}

/// A complete graph schema. Ids are unique across classes and enums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSchema {
    pub context: GraphContext,
    entries: Vec<SchemaEntry>,
    ids: HashSet<String>,
}

impl GraphSchema {
    pub fn new(context: GraphContext) -> Self {
        Self {
            context,
            entries: Vec::new(),
            ids: HashSet::new(),
        }
    }

    /// Walk a model and emit its graph schema in one step
    ///
    /// # Errors
    ///
    /// Propagates walker errors as [`Error::Model`].
    pub fn from_model(model: &SpaseModel, context: GraphContext) -> Result<Self> {
        let walked = build_schema(&model.dictionary, &model.ontology)?;
        emit_graph_schema(&walked, context)
    }

    /// Append an entry
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateId`] if an entry with the same id exists.
    pub fn push(&mut self, entry: SchemaEntry) -> Result<()> {
        if !self.ids.insert(entry.id().to_string()) {
            return Err(Error::DuplicateId(entry.id().to_string()));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn class(&self, id: &str) -> Option<&ClassEntry> {
        self.entries.iter().find_map(|entry| match entry {
            SchemaEntry::Class(c) if c.id == id => Some(c),
            _ => None,
        })
    }

    pub fn enumeration(&self, id: &str) -> Option<&EnumEntry> {
        self.entries.iter().find_map(|entry| match entry {
            SchemaEntry::Enum(e) if e.id == id => Some(e),
            _ => None,
        })
    }

    /// Render as the JSON array the graph database accepts
    pub fn to_json(&self) -> Value {
        let mut documents = Vec::with_capacity(self.entries.len() + 1);
        documents.push(json!({
            "@type": "@context",
            "@base": self.context.base,
            "@schema": self.context.schema,
        }));
        for entry in &self.entries {
            documents.push(match entry {
                SchemaEntry::Enum(e) => json!({
                    "@type": "Enum",
                    "@id": e.id,
                    "@value": e.values,
                }),
                SchemaEntry::Class(c) => class_to_json(c),
            });
        }
        Value::Array(documents)
    }

    /// Read a schema previously produced by [`GraphSchema::to_json`].
    ///
    /// A missing context record falls back to [`GraphContext::default`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFrame`] for documents that do not have the
    /// expected shape and [`Error::DuplicateId`] for repeated ids.
    pub fn from_json(value: &Value) -> Result<Self> {
        let documents = value
            .as_array()
            .ok_or_else(|| Error::InvalidFrame("graph schema must be a JSON array".to_string()))?;

        let mut schema = Self::new(GraphContext::default());
        for document in documents {
            let kind = document.get("@type").and_then(Value::as_str).unwrap_or_default();
            match kind {
                "@context" => {
                    if let Some(base) = document.get("@base").and_then(Value::as_str) {
                        schema.context.base = base.to_string();
                    }
                    if let Some(s) = document.get("@schema").and_then(Value::as_str) {
                        schema.context.schema = s.to_string();
                    }
                }
                "Enum" => schema.push(SchemaEntry::Enum(EnumEntry {
                    id: document_id(document)?,
                    values: string_list(document.get("@value"))?,
                }))?,
                "Class" => schema.push(SchemaEntry::Class(class_from_json(document)?))?,
                other => {
                    return Err(Error::InvalidFrame(format!(
                        "unsupported schema document type '{other}'"
                    )))
                }
            }
        }
        Ok(schema)
    }
}

impl Default for GraphSchema {
    fn default() -> Self {
        Self::new(GraphContext::default())
    }
}

/// Emit the graph schema for a walked model: enums first, then classes,
/// each in dictionary order, fields in `subElements` order.
///
/// # Errors
///
/// Returns [`Error::DuplicateId`] if two entries share a name.
pub fn emit_graph_schema(walked: &WalkedModel, context: GraphContext) -> Result<GraphSchema> {
    let mut schema = GraphSchema::new(context);

    for table in &walked.enums {
        schema.push(SchemaEntry::Enum(EnumEntry {
            id: table.name.clone(),
            values: table.values.clone(),
        }))?;
    }

    for table in &walked.containers {
        let entry = ClassEntry {
            id: table.name.clone(),
            comment: table.definition.clone(),
            properties: table
                .fields
                .iter()
                .map(|f| (f.name.clone(), f.description.clone()))
                .collect(),
            fields: table
                .fields
                .iter()
                .map(|f| ClassField {
                    name: f.name.clone(),
                    target: f.target_type.clone(),
                    cardinality: f.cardinality,
                })
                .collect(),
        };
        debug!(class = %entry.id, fields = entry.fields.len(), "Emitted class");
        schema.push(SchemaEntry::Class(entry))?;
    }

    info!(
        enums = walked.enums.len(),
        classes = walked.containers.len(),
        "Emitted graph schema"
    );
    Ok(schema)
}

fn class_to_json(class: &ClassEntry) -> Value {
    let properties: Map<String, Value> = class
        .properties
        .iter()
        .map(|(name, doc)| (name.clone(), Value::String(doc.clone())))
        .collect();

    let mut document = Map::new();
    document.insert("@type".into(), json!("Class"));
    document.insert("@id".into(), json!(class.id));
    document.insert(
        "@documentation".into(),
        json!({"@comment": class.comment, "@properties": properties}),
    );
    for field in &class.fields {
        let target = Value::String(field.target.graph_name().to_string());
        let value = match field.cardinality.graph_wrapper() {
            None => target,
            Some(wrapper) => json!({"@type": wrapper, "@class": target}),
        };
        document.insert(field.name.clone(), value);
    }
    Value::Object(document)
}

fn class_from_json(document: &Value) -> Result<ClassEntry> {
    let id = document_id(document)?;
    let object = document
        .as_object()
        .ok_or_else(|| Error::InvalidFrame(format!("class '{id}' is not an object")))?;

    let documentation = object.get("@documentation");
    let comment = documentation
        .and_then(|d| d.get("@comment"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let properties = documentation
        .and_then(|d| d.get("@properties"))
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(k, v)| (k.clone(), v.as_str().unwrap_or_default().to_string()))
                .collect()
        })
        .unwrap_or_default();

    let mut fields = Vec::new();
    for (name, value) in object.iter().filter(|(k, _)| !k.starts_with('@')) {
        let (target, cardinality) = match value {
            Value::String(type_name) => (parse_target(type_name), Cardinality::Required),
            Value::Object(wrapped) => {
                let wrapper = wrapped.get("@type").and_then(Value::as_str).unwrap_or_default();
                let cardinality = Cardinality::from_graph_wrapper(wrapper).ok_or_else(|| {
                    Error::InvalidFrame(format!(
                        "field '{id}.{name}' has unknown wrapper '{wrapper}'"
                    ))
                })?;
                let class = wrapped.get("@class").and_then(Value::as_str).ok_or_else(|| {
                    Error::InvalidFrame(format!("field '{id}.{name}' has no @class"))
                })?;
                (parse_target(class), cardinality)
            }
            _ => {
                return Err(Error::InvalidFrame(format!(
                    "field '{id}.{name}' is neither a type name nor a wrapper"
                )))
            }
        };
        fields.push(ClassField {
            name: name.clone(),
            target,
            cardinality,
        });
    }

    Ok(ClassEntry {
        id,
        comment,
        properties,
        fields,
    })
}

pub(crate) fn parse_target(type_name: &str) -> TargetType {
    ScalarType::from_xsd(type_name)
        .map_or_else(|| TargetType::Reference(type_name.to_string()), TargetType::Scalar)
}

pub(crate) fn document_id(document: &Value) -> Result<String> {
    document
        .get("@id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidFrame("schema document without @id".to_string()))
}

pub(crate) fn string_list(value: Option<&Value>) -> Result<Vec<String>> {
    value
        .and_then(Value::as_array)
        .ok_or_else(|| Error::InvalidFrame("expected an array of values".to_string()))?
        .iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| Error::InvalidFrame(format!("enum value {v} is not a string")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use spase_model::{Dictionary, FieldDescriptor, FieldMap, Ontology, TypeDefinition};

    fn model() -> SpaseModel {
        let dictionary: Dictionary = [
            (
                "TimeSpan",
                TypeDefinition::container("A span", ["StopDate", "StartDate", "Note"]),
            ),
            ("StartDate", TypeDefinition::primitive("DateTime", "Start")),
            ("StopDate", TypeDefinition::primitive("DateTime", "Stop")),
            ("Note", TypeDefinition::primitive("Text", "A note")),
            ("Role", TypeDefinition::enumeration("A role", ["PI", "Contributor"])),
        ]
        .into_iter()
        .map(|(name, def)| (name.to_string(), def))
        .collect();
        let span: FieldMap = [("StartDate", "1"), ("StopDate", "0"), ("Note", "*")]
            .into_iter()
            .map(|(field, occurrence)| (field.to_string(), FieldDescriptor::new("TimeSpan", occurrence)))
            .collect();
        let ontology = Ontology::from([("TimeSpan".to_string(), span)]);
        SpaseModel::new(dictionary, ontology)
    }

    #[test]
    fn test_emit_layout() {
        let schema = GraphSchema::from_model(&model(), GraphContext::default()).unwrap();
        let json = schema.to_json();
        let docs = json.as_array().unwrap();

        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0]["@type"], "@context");
        assert_eq!(docs[0]["@base"], DEFAULT_BASE);
        assert_eq!(
            docs[1],
            json!({"@type": "Enum", "@id": "Role", "@value": ["PI", "Contributor"]})
        );
        assert_eq!(docs[2]["@id"], "TimeSpan");
        assert_eq!(docs[2]["@documentation"]["@comment"], "A span");
    }

    #[test]
    fn test_class_fields_follow_sub_elements() {
        let schema = GraphSchema::from_model(&model(), GraphContext::default()).unwrap();
        let json = schema.to_json();
        let class = json[2].as_object().unwrap();

        let fields: Vec<&str> = class
            .keys()
            .map(String::as_str)
            .filter(|k| !k.starts_with('@'))
            .collect();
        assert_eq!(fields, vec!["StopDate", "StartDate", "Note"]);

        assert_eq!(class["StartDate"], json!("xsd:dateTime"));
        assert_eq!(
            class["StopDate"],
            json!({"@type": "Optional", "@class": "xsd:dateTime"})
        );
        assert_eq!(class["Note"], json!({"@type": "Set", "@class": "xsd:string"}));

        let props: Vec<&str> = class["@documentation"]["@properties"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(props, vec!["StopDate", "StartDate", "Note"]);
    }

    #[test]
    fn test_json_round_trip() {
        let schema = GraphSchema::from_model(&model(), GraphContext::default()).unwrap();
        let again = GraphSchema::from_json(&schema.to_json()).unwrap();
        assert_eq!(schema, again);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut schema = GraphSchema::default();
        let entry = SchemaEntry::Enum(EnumEntry {
            id: "Role".to_string(),
            values: vec![],
        });
        schema.push(entry.clone()).unwrap();
        assert!(matches!(schema.push(entry), Err(Error::DuplicateId(id)) if id == "Role"));
    }

    #[test]
    fn test_from_json_rejects_unknown_wrapper() {
        let json = json!([
            {"@type": "Class", "@id": "A", "x": {"@type": "Array", "@class": "xsd:string"}}
        ]);
        assert!(matches!(
            GraphSchema::from_json(&json),
            Err(Error::InvalidFrame(_))
        ));
    }

    #[test]
    fn test_custom_context() {
        let context = GraphContext {
            base: "terminusdb:///data/".to_string(),
            schema: "terminusdb:///schema#".to_string(),
        };
        let schema = GraphSchema::from_model(&model(), context.clone()).unwrap();
        assert_eq!(schema.context, context);
        assert_eq!(schema.to_json()[0]["@schema"], "terminusdb:///schema#");
    }
}
