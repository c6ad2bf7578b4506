//! Type mapping: SPASE primitive names and occurrence markers

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The SPASE primitive type names this mapper knows
pub const PRIMITIVE_TYPES: [&str; 9] = [
    "Text", "URL", "DateTime", "Numeric", "Duration", "Count", "ID", "Item", "Sequence",
];

/// Scalar target types shared by the graph and JSON Schema emitters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    String,
    Timestamp,
    Float,
    Duration,
    Integer,
}

impl ScalarType {
    /// XSD datatype name used by the graph database
    pub fn xsd_name(self) -> &'static str {
        match self {
            Self::String => "xsd:string",
            Self::Timestamp => "xsd:dateTime",
            Self::Float => "xsd:float",
            Self::Duration => "xsd:duration",
            Self::Integer => "xsd:integer",
        }
    }

    /// Reverse of [`ScalarType::xsd_name`]
    pub fn from_xsd(name: &str) -> Option<Self> {
        match name {
            "xsd:string" => Some(Self::String),
            "xsd:dateTime" => Some(Self::Timestamp),
            "xsd:float" => Some(Self::Float),
            "xsd:duration" => Some(Self::Duration),
            "xsd:integer" => Some(Self::Integer),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.xsd_name())
    }
}

/// Resolved type of a field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetType {
    Scalar(ScalarType),
    /// Another Container or Enumeration, by name
    Reference(String),
}

impl TargetType {
    /// Name as the graph schema spells it
    pub fn graph_name(&self) -> &str {
        match self {
            Self::Scalar(scalar) => scalar.xsd_name(),
            Self::Reference(name) => name,
        }
    }

    pub fn as_reference(&self) -> Option<&str> {
        match self {
            Self::Reference(name) => Some(name),
            Self::Scalar(_) => None,
        }
    }
}

/// Map a SPASE type name to a target type.
///
/// Total: names outside [`PRIMITIVE_TYPES`] come back as
/// [`TargetType::Reference`] for the walker to resolve. `Sequence` has no
/// structured form in either target and is carried as a string.
pub fn map_primitive(type_name: &str) -> TargetType {
    let scalar = match type_name {
        "Text" | "URL" | "ID" | "Item" | "Sequence" => ScalarType::String,
        "DateTime" => ScalarType::Timestamp,
        "Numeric" => ScalarType::Float,
        "Duration" => ScalarType::Duration,
        "Count" => ScalarType::Integer,
        other => return TargetType::Reference(other.to_string()),
    };
    TargetType::Scalar(scalar)
}

/// How many times a field may appear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    /// Exactly one
    Required,
    /// Zero or one
    Optional,
    /// One or more, ordered
    List,
    /// Zero or more, unordered, deduplicated by value
    Set,
}

impl Cardinality {
    /// Wrapper tag in the graph schema; `None` means a bare type reference
    pub fn graph_wrapper(self) -> Option<&'static str> {
        match self {
            Self::Required => None,
            Self::Optional => Some("Optional"),
            Self::List => Some("List"),
            Self::Set => Some("Set"),
        }
    }

    /// Reverse of [`Cardinality::graph_wrapper`] for wrapped fields
    pub fn from_graph_wrapper(tag: &str) -> Option<Self> {
        match tag {
            "Optional" => Some(Self::Optional),
            "List" => Some(Self::List),
            "Set" => Some(Self::Set),
            _ => None,
        }
    }

    pub fn is_array(self) -> bool {
        matches!(self, Self::List | Self::Set)
    }

    /// Whether a JSON Schema must list the field under `required`
    pub fn is_required(self) -> bool {
        matches!(self, Self::Required | Self::List)
    }
}

/// Map an occurrence marker to a cardinality.
///
/// `r` is treated exactly like `0`.
///
/// # Errors
///
/// Returns [`Error::UnknownCardinalityMarker`] for any marker outside
/// `0 1 * + r`.
pub fn map_cardinality(marker: &str) -> Result<Cardinality> {
    match marker {
        "0" | "r" => Ok(Cardinality::Optional),
        "1" => Ok(Cardinality::Required),
        "*" => Ok(Cardinality::Set),
        "+" => Ok(Cardinality::List),
        other => Err(Error::UnknownCardinalityMarker {
            marker: other.to_string(),
            field: None,
        }),
    }
}
