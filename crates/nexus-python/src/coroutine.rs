//! Driving a Python awaitable from a thread with no event loop.
//!
//! Each awaitable gets its own `asyncio` loop through `asyncio.run`, which
//! also shuts down async generators and closes the loop before returning.
//! Callers run this on a tokio blocking thread, where no Python loop is
//! active, so `asyncio.run` never collides with an outer loop.
//!
//! A package may ship its own runner as `compat_async.run_coro_sync`; when
//! it does, that runner replaces `asyncio.run` for the package's coroutines.

use pyo3::exceptions::PyTypeError;
use pyo3::prelude::*;
use pyo3::types::PyModule;

pub(crate) const COMPAT_MODULE: &str = "compat_async";
pub(crate) const PACKAGE_RUNNER: &str = "run_coro_sync";

const DRIVER_SOURCE: &std::ffi::CStr = c"import asyncio

async def _await(awaitable):
    return await awaitable

def drive(awaitable):
    return asyncio.run(_await(awaitable))
";

fn driver(py: Python<'_>) -> PyResult<Bound<'_, PyModule>> {
    PyModule::from_code(
        py,
        DRIVER_SOURCE,
        c"nexus_coroutine_driver.py",
        c"nexus_coroutine_driver",
    )
}

/// Check that the driver can be built (`asyncio` importable).
pub(crate) fn prepare(py: Python<'_>) -> PyResult<()> {
    driver(py).map(|_| ())
}

/// `<namespace>.compat_async.run_coro_sync`, or `None` when the package has
/// no `compat_async` module.
///
/// A `compat_async` that fails to import, or lacks a callable runner, is an
/// error: the package asked for its own runner and it is unusable.
pub(crate) fn package_runner<'py>(
    py: Python<'py>,
    namespace: &str,
) -> PyResult<Option<Bound<'py, PyAny>>> {
    let name = format!("{}.{}", namespace, COMPAT_MODULE);
    let util = PyModule::import(py, "importlib.util")?;
    if util.call_method1("find_spec", (&name,))?.is_none() {
        return Ok(None);
    }

    let module = PyModule::import(py, "importlib")?.call_method1("import_module", (&name,))?;
    let runner = module.getattr(PACKAGE_RUNNER)?;
    if !runner.is_callable() {
        return Err(PyTypeError::new_err(format!(
            "{}.{} is not callable",
            name, PACKAGE_RUNNER
        )));
    }
    Ok(Some(runner))
}

/// Drive `value` to completion if it is awaitable, else return it unchanged.
///
/// `runner` replaces the built-in `asyncio.run` driver when given.
pub(crate) fn drive<'py>(
    value: Bound<'py, PyAny>,
    runner: Option<&Bound<'py, PyAny>>,
) -> PyResult<Bound<'py, PyAny>> {
    let py = value.py();
    let inspect = PyModule::import(py, "inspect")?;
    if !inspect
        .call_method1("isawaitable", (&value,))?
        .is_truthy()?
    {
        return Ok(value);
    }
    match runner {
        Some(runner) => runner.call1((value,)),
        None => driver(py)?.getattr("drive")?.call1((value,)),
    }
}
