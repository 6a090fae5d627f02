use pyo3::prelude::*;
use pyo3::types::PyModule;
use serde_json::Value;

/// Convert a JSON value into the equivalent Python object via `json.loads`.
pub(crate) fn json_to_py<'py>(py: Python<'py>, value: &Value) -> PyResult<Bound<'py, PyAny>> {
    let text = value.to_string();
    let json = PyModule::import(py, "json")?;
    json.getattr("loads")?.call1((text,))
}

/// `str(e)` of the raised exception, without its type name or traceback.
pub(crate) fn exception_message(py: Python<'_>, err: &PyErr) -> String {
    err.value(py).to_string()
}
