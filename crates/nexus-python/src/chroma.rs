//! Chroma persistent client behind the `nexus-memory` traits.

use crate::initialization::Interpreter;
use crate::utils::json_to_py;
use nexus_logger as logger;
use nexus_memory::{Document, GetResult, StoreError, StoreSettings, VectorCollection, VectorStore};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList, PyModule};
use serde_json::Value;

fn backend_error(err: PyErr) -> StoreError {
    StoreError::Backend(format!("{}", err))
}

pub struct ChromaStore {
    client: Py<PyAny>,
}

impl ChromaStore {
    /// `chromadb.PersistentClient(path, settings, tenant, database)`
    pub fn connect(
        _interpreter: &'static Interpreter,
        settings: &StoreSettings,
    ) -> Result<Self, StoreError> {
        logger::debug(&format!(
            "Opening Chroma store at {} ({}/{})",
            settings.path.display(),
            settings.tenant,
            settings.database
        ));

        Python::attach(|py| {
            let chromadb = PyModule::import(py, "chromadb")?;
            let settings_cls = PyModule::import(py, "chromadb.config")?.getattr("Settings")?;

            let settings_kwargs = PyDict::new(py);
            settings_kwargs.set_item("anonymized_telemetry", settings.anonymized_telemetry)?;
            let chroma_settings = settings_cls.call((), Some(&settings_kwargs))?;

            let kwargs = PyDict::new(py);
            kwargs.set_item("path", settings.path.to_string_lossy().as_ref())?;
            kwargs.set_item("settings", chroma_settings)?;
            kwargs.set_item("tenant", &settings.tenant)?;
            kwargs.set_item("database", &settings.database)?;
            let client = chromadb
                .getattr("PersistentClient")?
                .call((), Some(&kwargs))?;

            Ok(ChromaStore {
                client: client.unbind(),
            })
        })
        .map_err(backend_error)
    }
}

impl VectorStore for ChromaStore {
    type Collection = ChromaCollection;

    fn get_or_create_collection(&self, name: &str) -> Result<ChromaCollection, StoreError> {
        Python::attach(|py| {
            let collection = self
                .client
                .bind(py)
                .call_method1("get_or_create_collection", (name,))?;
            Ok(ChromaCollection {
                name: name.to_string(),
                collection: collection.unbind(),
            })
        })
        .map_err(|e: PyErr| StoreError::Collection(name.to_string(), format!("{}", e)))
    }
}

pub struct ChromaCollection {
    name: String,
    collection: Py<PyAny>,
}

impl ChromaCollection {
    fn collection_error(&self, err: PyErr) -> StoreError {
        StoreError::Collection(self.name.clone(), format!("{}", err))
    }
}

impl VectorCollection for ChromaCollection {
    fn count(&self) -> Result<usize, StoreError> {
        Python::attach(|py| {
            self.collection
                .bind(py)
                .call_method0("count")?
                .extract::<usize>()
        })
        .map_err(|e| self.collection_error(e))
    }

    fn upsert(&self, documents: &[Document]) -> Result<(), StoreError> {
        let metadatas: Vec<Value> = documents
            .iter()
            .map(|d| Value::Object(d.metadata.clone()))
            .collect();

        Python::attach(|py| {
            let kwargs = PyDict::new(py);
            kwargs.set_item("ids", PyList::new(py, documents.iter().map(|d| d.id.as_str()))?)?;
            kwargs.set_item(
                "documents",
                PyList::new(py, documents.iter().map(|d| d.text.as_str()))?,
            )?;
            kwargs.set_item("metadatas", json_to_py(py, &Value::Array(metadatas))?)?;
            self.collection
                .bind(py)
                .call_method("upsert", (), Some(&kwargs))?;
            Ok(())
        })
        .map_err(|e| self.collection_error(e))
    }

    fn get(&self, ids: &[String]) -> Result<GetResult, StoreError> {
        Python::attach(|py| {
            let kwargs = PyDict::new(py);
            kwargs.set_item("ids", PyList::new(py, ids)?)?;
            let result = self
                .collection
                .bind(py)
                .call_method("get", (), Some(&kwargs))?;

            let found_ids: Option<Vec<String>> = result.get_item("ids")?.extract()?;
            let documents: Option<Vec<Option<String>>> = result.get_item("documents")?.extract()?;
            Ok(GetResult {
                ids: found_ids.unwrap_or_default(),
                documents: documents.unwrap_or_default(),
            })
        })
        .map_err(|e| self.collection_error(e))
    }
}
