//! The slice of a vector store the prober relies on.
//!
//! Embedding and indexing stay inside the backend. Callers only see
//! collections with `count`, `upsert` and point `get` by id.

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("vector store backend unavailable: {0}")]
    Backend(String),

    #[error("collection '{0}': {1}")]
    Collection(String, String),

    #[error("unexpected response from vector store: {0}")]
    Response(String),
}

/// Connection parameters for a persistent store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub path: PathBuf,
    pub tenant: String,
    pub database: String,
    pub anonymized_telemetry: bool,
}

impl StoreSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tenant: "default_tenant".to_string(),
            database: "default_database".to_string(),
            anonymized_telemetry: false,
        }
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = tenant.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub metadata: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetResult {
    pub ids: Vec<String>,
    pub documents: Vec<Option<String>>,
}

impl GetResult {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|found| found == id)
    }
}

pub trait VectorCollection {
    fn count(&self) -> Result<usize, StoreError>;

    /// Insert or replace documents by id
    fn upsert(&self, documents: &[Document]) -> Result<(), StoreError>;

    /// Point lookup. Unknown ids are simply absent from the result.
    fn get(&self, ids: &[String]) -> Result<GetResult, StoreError>;
}

pub trait VectorStore {
    type Collection: VectorCollection;

    fn get_or_create_collection(&self, name: &str) -> Result<Self::Collection, StoreError>;
}

/// Process-local store, used for dry runs and tests
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<RwLock<BTreeMap<String, InMemoryCollection>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VectorStore for InMemoryStore {
    type Collection = InMemoryCollection;

    fn get_or_create_collection(&self, name: &str) -> Result<InMemoryCollection, StoreError> {
        let mut collections = self.collections.write();
        Ok(collections.entry(name.to_string()).or_default().clone())
    }
}

/// Cloning shares the underlying documents
#[derive(Debug, Clone, Default)]
pub struct InMemoryCollection {
    documents: Arc<RwLock<BTreeMap<String, Document>>>,
}

impl VectorCollection for InMemoryCollection {
    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.documents.read().len())
    }

    fn upsert(&self, documents: &[Document]) -> Result<(), StoreError> {
        let mut stored = self.documents.write();
        for doc in documents {
            stored.insert(doc.id.clone(), doc.clone());
        }
        Ok(())
    }

    fn get(&self, ids: &[String]) -> Result<GetResult, StoreError> {
        let stored = self.documents.read();
        let mut result = GetResult::default();
        for doc in ids.iter().filter_map(|id| stored.get(id)) {
            result.ids.push(doc.id.clone());
            result.documents.push(Some(doc.text.clone()));
        }
        Ok(result)
    }
}
