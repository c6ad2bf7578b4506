#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # spase-emit
//!
//! Schema emitters for walked SPASE models.
//!
//! Two targets are produced from the same field tables: a graph-database
//! schema (class and enum documents that reference each other by name) and a
//! JSON Schema, which is built from class frames served by a
//! [`ClassFrameResolver`] so the same code works against an in-memory
//! [`GraphSchema`] or a live schema store.

pub mod frame;
pub mod graph;
pub mod json_schema;

pub use frame::{ClassFrame, ClassFrameResolver, FrameField, FrameType};
pub use graph::{
    emit_graph_schema, ClassEntry, ClassField, EnumEntry, GraphContext, GraphSchema, SchemaEntry,
};
pub use json_schema::{convert_frame_to_schema, scalar_fragment, schema_for_class, DefinitionPool};

use thiserror::Error;

/// Errors that can occur while emitting schemas
#[derive(Error, Debug)]
pub enum Error {
    #[error("Class not found: {0}")]
    NotFound(String),

    #[error("Duplicate schema id: {0}")]
    DuplicateId(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Model error: {0}")]
    Model(#[from] spase_model::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
