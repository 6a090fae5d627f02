//! Shared-memory vector store contract and the consistency prober.

pub mod prober;
pub mod store;

pub use prober::{ConsistencyCheckResult, ConsistencyProber, HealthRecord, ProbeDocument};
pub use store::{
    Document, GetResult, InMemoryCollection, InMemoryStore, StoreError, StoreSettings,
    VectorCollection, VectorStore,
};
