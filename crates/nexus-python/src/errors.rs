use nexus_config::VenvPathError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from bootstrapping or calling into the embedded interpreter
#[derive(Error, Debug)]
pub enum PythonError {
    #[error("Python error: {0}")]
    Python(String),

    #[error("Failed to import module '{0}': {1}")]
    Import(String, String),

    #[error("venv at {0} is unusable: {1}")]
    Venv(PathBuf, #[source] VenvPathError),

    /// A cached bootstrap failure, replayed to later callers
    #[error("Python interpreter unavailable: {0}")]
    Initialization(String),
}

/// Keeps `ExceptionType: message` for the logs; tracebacks are not carried over.
impl From<pyo3::PyErr> for PythonError {
    fn from(err: pyo3::PyErr) -> Self {
        PythonError::Python(format!("{}", err))
    }
}
