//! Class frames and the resolver that serves them
//!
//! A frame is what a schema store returns when asked about one class: its
//! documentation and its fields in declaration order. Unlike the graph
//! schema, enums are inlined so a consumer never needs a second lookup for
//! them. Class references are still by name.

use serde_json::{Map, Value};

use spase_model::{Cardinality, ScalarType, TargetType};

use crate::graph::{document_id, parse_target, string_list, GraphSchema};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameType {
    Scalar(ScalarType),
    Class(String),
    Enum { id: String, values: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameField {
    pub name: String,
    pub frame_type: FrameType,
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFrame {
    pub class: String,
    pub comment: String,
    pub properties: Vec<(String, String)>,
    pub fields: Vec<FrameField>,
}

impl ClassFrame {
    pub fn field(&self, name: &str) -> Option<&FrameField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Parse a frame in the JSON shape a schema store serves:
    ///
    /// ```json
    /// {"@type": "Class",
    ///  "@documentation": {"@comment": "...", "@properties": {"StartDate": "..."}},
    ///  "StartDate": "xsd:dateTime",
    ///  "Role": {"@type": "List", "@class": {"@type": "Enum", "@id": "Role", "@values": ["PI"]}},
    ///  "TimeSpan": {"@type": "Optional", "@class": "TimeSpan"}}
    /// ```
    ///
    /// `@documentation` may also be a list of per-language records; the
    /// first one is used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFrame`] for any field that is not a type
    /// name, an inline enum, or a known cardinality wrapper around one.
    pub fn from_json(class: &str, value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::InvalidFrame(format!("frame for '{class}' is not an object")))?;

        let documentation = match object.get("@documentation") {
            Some(Value::Array(records)) => records.first(),
            other => other,
        };
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

        let fields = object
            .iter()
            .filter(|(name, _)| !name.starts_with('@'))
            .map(|(name, value)| parse_field(class, name, value))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            class: class.to_string(),
            comment,
            properties,
            fields,
        })
    }
}

fn parse_field(class: &str, name: &str, value: &Value) -> Result<FrameField> {
    let (frame_type, cardinality) = match value {
        Value::Object(wrapped) if is_wrapper(wrapped) => {
            let wrapper = wrapped.get("@type").and_then(Value::as_str).unwrap_or_default();
            let cardinality = Cardinality::from_graph_wrapper(wrapper).ok_or_else(|| {
                Error::InvalidFrame(format!("field '{class}.{name}' has unknown wrapper '{wrapper}'"))
            })?;
            let inner = wrapped.get("@class").ok_or_else(|| {
                Error::InvalidFrame(format!("field '{class}.{name}' has no @class"))
            })?;
            (parse_base(class, name, inner)?, cardinality)
        }
        other => (parse_base(class, name, other)?, Cardinality::Required),
    };
    Ok(FrameField {
        name: name.to_string(),
        frame_type,
        cardinality,
    })
}

fn is_wrapper(object: &Map<String, Value>) -> bool {
    object.get("@type").and_then(Value::as_str) != Some("Enum")
}

fn parse_base(class: &str, name: &str, value: &Value) -> Result<FrameType> {
    match value {
        Value::String(type_name) => Ok(match parse_target(type_name) {
            TargetType::Scalar(scalar) => FrameType::Scalar(scalar),
            TargetType::Reference(target) => FrameType::Class(target),
        }),
        Value::Object(inline) if inline.get("@type").and_then(Value::as_str) == Some("Enum") => {
            Ok(FrameType::Enum {
                id: document_id(value)?,
                values: string_list(inline.get("@values").or_else(|| inline.get("@value")))?,
            })
        }
        _ => Err(Error::InvalidFrame(format!(
            "field '{class}.{name}' has an unrecognised type"
        ))),
    }
}

/// Source of class frames, by class name
pub trait ClassFrameResolver {
    /// Fetch the frame for `class`
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no such class exists.
    fn class_frame(&self, class: &str) -> Result<ClassFrame>;
}

impl<R: ClassFrameResolver + ?Sized> ClassFrameResolver for &R {
    fn class_frame(&self, class: &str) -> Result<ClassFrame> {
        (**self).class_frame(class)
    }
}

impl ClassFrameResolver for GraphSchema {
    fn class_frame(&self, class: &str) -> Result<ClassFrame> {
        let entry = self
            .class(class)
            .ok_or_else(|| Error::NotFound(class.to_string()))?;

        let fields = entry
            .fields
            .iter()
            .map(|field| {
                let frame_type = match &field.target {
                    TargetType::Scalar(scalar) => FrameType::Scalar(*scalar),
                    TargetType::Reference(target) => {
                        if let Some(enumeration) = self.enumeration(target) {
                            FrameType::Enum {
                                id: enumeration.id.clone(),
                                values: enumeration.values.clone(),
                            }
                        } else if self.class(target).is_some() {
                            FrameType::Class(target.clone())
                        } else {
                            return Err(Error::InvalidFrame(format!(
                                "field '{class}.{}' references unknown type '{target}'",
                                field.name
                            )));
                        }
                    }
                };
                Ok(FrameField {
                    name: field.name.clone(),
                    frame_type,
                    cardinality: field.cardinality,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ClassFrame {
            class: entry.id.clone(),
            comment: entry.comment.clone(),
            properties: entry.properties.clone(),
            fields,
        })
    }
}
