//! Document store
//!
//! [`DocumentStore`] is the seam to the downstream document database.
//! [`InMemoryStore`] is the reference implementation used by the CLI and the
//! tests.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};

use crate::annotate::TYPE_KEY;

const ID_KEY: &str = "@id";

/// Errors a store can report on insert
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unreachable: {0}")]
    Connectivity(String),

    #[error("Document type '{found}' does not match '{expected}'")]
    SchemaMismatch { expected: String, found: String },

    #[error("Duplicate document id: {0}")]
    Duplicate(String),
}

/// Something that accepts typed documents
pub trait DocumentStore {
    /// Insert `document` as an instance of `type_tag` and return its id
    ///
    /// # Errors
    ///
    /// Implementations report connectivity failures, type mismatches and
    /// duplicate ids through [`StoreError`].
    fn insert(&mut self, document: Value, type_tag: &str) -> Result<String, StoreError>;
}

/// A document as held by [`InMemoryStore`]
#[derive(Debug, Clone, Serialize)]
pub struct StoredDocument {
    pub id: String,
    pub type_tag: String,
    pub document: Value,
    pub inserted_at: DateTime<Utc>,
}

/// Store that keeps documents in insertion order
#[derive(Debug, Default)]
pub struct InMemoryStore {
    documents: Vec<StoredDocument>,
    ids: HashSet<String>,
    counters: HashMap<String, usize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&StoredDocument> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Documents of one type, in insertion order
    pub fn of_type<'a>(&'a self, type_tag: &'a str) -> impl Iterator<Item = &'a StoredDocument> + 'a {
        self.documents.iter().filter(move |d| d.type_tag == type_tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoredDocument> {
        self.documents.iter()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentStore for InMemoryStore {
    /// Documents must be objects whose `@type` equals `type_tag`. An explicit
    /// `@id` is kept (and must be new); otherwise `<Type>/<n>` is assigned.
    fn insert(&mut self, document: Value, type_tag: &str) -> Result<String, StoreError> {
        let found = match document.get(TYPE_KEY) {
            Some(Value::String(tag)) => tag.as_str(),
            Some(_) => "<non-string>",
            None => "<none>",
        };
        if found != type_tag {
            return Err(StoreError::SchemaMismatch {
                expected: type_tag.to_string(),
                found: found.to_string(),
            });
        }

        let id = match document.get(ID_KEY).and_then(Value::as_str) {
            Some(explicit) => explicit.to_string(),
            None => {
                let counter = self.counters.entry(type_tag.to_string()).or_insert(0);
                *counter += 1;
                format!("{type_tag}/{counter}")
            }
        };
        if !self.ids.insert(id.clone()) {
            return Err(StoreError::Duplicate(id));
        }

        trace!(id = %id, "Inserting document");
        self.documents.push(StoredDocument {
            id: id.clone(),
            type_tag: type_tag.to_string(),
            document,
            inserted_at: Utc::now(),
        });
        debug!(id = %id, total = self.documents.len(), "Stored document");
        Ok(id)
    }
}
