//! Model definitions
//!
//! The published model is JSON of the shape
//! `{"dictionary": {name: {type, definition, subElements?, allowedValues?}},
//!   "ontology": {container: {field: {object, occurrence}}}}`.
//! Member order in both maps is meaningful (it becomes declaration order in
//! every emitted schema), so maps are read into an [`IndexMap`]. Duplicate keys
//! are rejected rather than silently overwritten.

use std::fmt;
use std::marker::PhantomData;

use indexmap::IndexMap;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Classification carried in a dictionary entry's `type` attribute
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TypeTag {
    /// Composite type with named fields
    Container,
    /// Closed set of literal values
    Enumeration,
    /// Anything else: a primitive name (`Text`, `DateTime`, ...) or a named type
    Named(String),
}

impl TypeTag {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Container => "Container",
            Self::Enumeration => "Enumeration",
            Self::Named(name) => name,
        }
    }
}

impl From<String> for TypeTag {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Container" => Self::Container,
            "Enumeration" => Self::Enumeration,
            _ => Self::Named(value),
        }
    }
}

impl From<TypeTag> for String {
    fn from(tag: TypeTag) -> Self {
        tag.as_str().to_string()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One dictionary entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    #[serde(rename = "type")]
    pub tag: TypeTag,

    #[serde(default)]
    pub definition: String,

    /// Field names, in declaration order (containers only)
    #[serde(default, rename = "subElements", skip_serializing_if = "Vec::is_empty")]
    pub sub_elements: Vec<String>,

    /// Literal values (enumerations only)
    #[serde(default, rename = "allowedValues", skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<String>,
}

impl TypeDefinition {
    /// A primitive-typed element such as `Text` or `DateTime`
    pub fn primitive(tag: &str, definition: impl Into<String>) -> Self {
        Self {
            tag: TypeTag::from(tag.to_string()),
            definition: definition.into(),
            sub_elements: Vec::new(),
            allowed_values: Vec::new(),
        }
    }

    pub fn container<S: Into<String>>(
        definition: impl Into<String>,
        sub_elements: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            tag: TypeTag::Container,
            definition: definition.into(),
            sub_elements: sub_elements.into_iter().map(Into::into).collect(),
            allowed_values: Vec::new(),
        }
    }

    pub fn enumeration<S: Into<String>>(
        definition: impl Into<String>,
        allowed_values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            tag: TypeTag::Enumeration,
            definition: definition.into(),
            sub_elements: Vec::new(),
            allowed_values: allowed_values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_container(&self) -> bool {
        self.tag == TypeTag::Container
    }

    pub fn is_enumeration(&self) -> bool {
        self.tag == TypeTag::Enumeration
    }
}

/// Occurrence of one field inside one container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Name the ontology files this field under
    pub object: String,

    /// Occurrence marker (`0`, `1`, `*`, `+`, `r`)
    pub occurrence: String,
}

impl FieldDescriptor {
    pub fn new(object: impl Into<String>, occurrence: impl Into<String>) -> Self {
        Self {
            object: object.into(),
            occurrence: occurrence.into(),
        }
    }
}

/// Type name → definition
pub type Dictionary = IndexMap<String, TypeDefinition>;

/// Field → occurrence, for one container
pub type FieldMap = IndexMap<String, FieldDescriptor>;

/// Container → field → occurrence
pub type Ontology = IndexMap<String, FieldMap>;

/// Read a map, failing on a repeated key
fn unique_keys<'de, D, V>(deserializer: D) -> Result<IndexMap<String, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct UniqueKeys<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for UniqueKeys<V> {
        type Value = IndexMap<String, V>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map with unique string keys")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut map = IndexMap::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((key, value)) = access.next_entry::<String, V>()? {
                if map.contains_key(&key) {
                    return Err(serde::de::Error::custom(format!("duplicate key '{key}'")));
                }
                map.insert(key, value);
            }
            Ok(map)
        }
    }

    deserializer.deserialize_map(UniqueKeys(PhantomData))
}

fn unique_ontology<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Ontology, D::Error> {
    #[derive(Deserialize)]
    #[serde(transparent)]
    struct Fields(#[serde(deserialize_with = "unique_keys")] FieldMap);

    let containers: IndexMap<String, Fields> = unique_keys(deserializer)?;
    Ok(containers
        .into_iter()
        .map(|(container, Fields(fields))| (container, fields))
        .collect())
}

/// A complete, versioned SPASE model document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaseModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(deserialize_with = "unique_keys")]
    pub dictionary: Dictionary,
    #[serde(deserialize_with = "unique_ontology")]
    pub ontology: Ontology,
}

impl SpaseModel {
    pub fn new(dictionary: Dictionary, ontology: Ontology) -> Self {
        Self {
            version: None,
            dictionary,
            ontology,
        }
    }

    /// Container entries in dictionary order
    pub fn containers(&self) -> impl Iterator<Item = (&str, &TypeDefinition)> {
        self.dictionary
            .iter()
            .filter(|(_, def)| def.is_container())
            .map(|(name, def)| (name.as_str(), def))
    }

    /// Enumeration entries in dictionary order
    pub fn enumerations(&self) -> impl Iterator<Item = (&str, &TypeDefinition)> {
        self.dictionary
            .iter()
            .filter(|(_, def)| def.is_enumeration())
            .map(|(name, def)| (name.as_str(), def))
    }
}
