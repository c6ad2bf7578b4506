#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # spase-model
//!
//! Model definitions, loader, type mapping and ontology walking for SPASE.
//!
//! The SPASE model is published as a single self-describing document with a
//! `dictionary` (every type name and its definition) and an `ontology` (the
//! occurrence of every field inside every container). This crate loads that
//! document, maps its primitive types and occurrence markers, and walks it
//! into per-container field tables that the emitters consume.

pub mod loader;
pub mod model;
pub mod registry;
pub mod types;
pub mod walker;

pub use loader::{parse_version, ModelLoader, ModelVersion};
pub use model::{Dictionary, FieldDescriptor, FieldMap, Ontology, SpaseModel, TypeDefinition, TypeTag};
pub use registry::ModelRegistry;
pub use types::{map_cardinality, map_primitive, Cardinality, ScalarType, TargetType};
pub use walker::{build_schema, ContainerTable, EnumTable, IntermediateField, WalkedModel};

use thiserror::Error;

/// Errors that can occur when loading or walking a model
#[derive(Error, Debug)]
pub enum Error {
    #[error("Model not found: {0}")]
    NotFound(String),

    #[error("Invalid model format: {0}")]
    InvalidFormat(String),

    #[error("Unknown cardinality marker '{marker}'{}", at_field(.field))]
    UnknownCardinalityMarker {
        marker: String,
        field: Option<String>,
    },

    #[error("Element '{element}' of container '{container}' is not defined in the dictionary")]
    UndefinedElement { container: String, element: String },

    #[error("Ontology field '{container}.{field}' names object '{object}', which is not in the dictionary")]
    UnknownObject {
        container: String,
        field: String,
        object: String,
    },

    #[error("Element '{element}' has type '{target}', which is neither a primitive nor a dictionary Container/Enumeration")]
    UnresolvedReference { element: String, target: String },

    #[error("Field '{container}.{field}' has no occurrence in the ontology")]
    MissingOccurrence { container: String, field: String },

    #[error("Ontology declares '{container}.{field}', which is not a subElement of '{container}'")]
    UndeclaredField { container: String, field: String },

    #[error("Ontology container '{0}' is not a Container in the dictionary")]
    NotAContainer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn at_field(field: &Option<String>) -> String {
    field
        .as_ref()
        .map(|f| format!(" on field '{f}'"))
        .unwrap_or_default()
}

impl Error {
    /// Attach the container/field location to a cardinality error
    #[must_use]
    pub fn at(self, container: &str, field: &str) -> Self {
        match self {
            Self::UnknownCardinalityMarker { marker, .. } => Self::UnknownCardinalityMarker {
                marker,
                field: Some(format!("{container}.{field}")),
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
