use nexus_memory::StoreError;
use nexus_python::PythonError;
use thiserror::Error;

/// Errors of the smoke test that abort it before a health record exists
#[derive(Error, Debug)]
pub enum SmokeError {
    #[error("Missing NEXUS_VECTOR_DB or NEXUS_COLLECTION")]
    MissingEnv,

    #[error(transparent)]
    Python(#[from] PythonError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to render health record: {0}")]
    Render(#[from] serde_json::Error),

    #[error("Failed to write health record: {0}")]
    Io(#[from] std::io::Error),
}
