//! Write-then-read visibility check against a vector collection.

use crate::store::{Document, StoreError, VectorCollection};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

pub const EXIT_VISIBLE: i32 = 0;
pub const EXIT_NOT_VISIBLE: i32 = 2;

/// The uniquely identified document written by one probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeDocument {
    pub doc_id: String,
    pub marker: String,
}

impl ProbeDocument {
    pub fn new(doc_id: impl Into<String>, marker: impl Into<String>) -> Self {
        Self {
            doc_id: doc_id.into(),
            marker: marker.into(),
        }
    }

    /// `e2e:<12 hex>` id and `e2e-marker:<unix seconds>:<8 hex>` marker
    pub fn generate() -> Self {
        let id_hex = Uuid::new_v4().simple().to_string();
        let marker_hex = Uuid::new_v4().simple().to_string();
        Self {
            doc_id: format!("e2e:{}", &id_hex[..12]),
            marker: format!(
                "e2e-marker:{}:{}",
                chrono::Utc::now().timestamp(),
                &marker_hex[..8]
            ),
        }
    }

    pub fn to_document(&self) -> Document {
        let mut metadata = Map::new();
        metadata.insert("kind".to_string(), Value::from("e2e"));
        metadata.insert("marker".to_string(), Value::from(self.marker.clone()));
        Document {
            id: self.doc_id.clone(),
            text: format!("Shared memory smoke test {}", self.marker),
            metadata,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsistencyCheckResult {
    /// The written id came back from a point lookup
    pub ok: bool,
    pub count_before: usize,
    pub count_after: usize,
    pub marker: String,
    pub doc_id: String,
}

/// What the smoke binary prints: the check plus where it ran
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthRecord {
    pub ok: bool,
    pub vector_db: String,
    pub collection: String,
    pub count_before: usize,
    pub count_after: usize,
    pub marker: String,
    pub doc_id: String,
}

impl HealthRecord {
    pub fn new(
        result: ConsistencyCheckResult,
        vector_db: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            ok: result.ok,
            vector_db: vector_db.into(),
            collection: collection.into(),
            count_before: result.count_before,
            count_after: result.count_after,
            marker: result.marker,
            doc_id: result.doc_id,
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.ok {
            EXIT_VISIBLE
        } else {
            EXIT_NOT_VISIBLE
        }
    }
}

pub struct ConsistencyProber<'a, C> {
    collection: &'a C,
}

impl<'a, C: VectorCollection> ConsistencyProber<'a, C> {
    pub fn new(collection: &'a C) -> Self {
        Self { collection }
    }

    /// Count, upsert `probe`, read it back by id, count again.
    ///
    /// Counts are informational; only the read-back decides `ok`.
    pub fn probe(&self, probe: &ProbeDocument) -> Result<ConsistencyCheckResult, StoreError> {
        let count_before = self.collection.count()?;
        debug!(count_before, doc_id = %probe.doc_id, "writing probe document");

        self.collection.upsert(&[probe.to_document()])?;
        let found = self.collection.get(std::slice::from_ref(&probe.doc_id))?;
        let ok = !found.ids.is_empty() && found.contains(&probe.doc_id);

        let count_after = self.collection.count()?;
        info!(ok, count_before, count_after, "probe finished");

        Ok(ConsistencyCheckResult {
            ok,
            count_before,
            count_after,
            marker: probe.marker.clone(),
            doc_id: probe.doc_id.clone(),
        })
    }
}
