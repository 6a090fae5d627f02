//! Materializing a plugin package from a directory.
//!
//! The package does not need to be installed. Its `__init__.py` is executed
//! into a fresh module registered in `sys.modules` under the requested
//! namespace, with `__package__` and `__path__` pointing at the directory, so
//! the package's own relative imports resolve against its own tree.

use crate::component::PyComponent;
use crate::initialization::Interpreter;
use crate::utils::exception_message;
use nexus_logger as logger;
use nexus_plugin::{ComponentLoader, LoadError, PluginLocation};
use pyo3::exceptions::PyImportError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList, PyModule};
use std::fs::File;
use std::path::Path;

pub const ENTRY_FILE: &str = "__init__.py";

pub struct PackageLoader {
    interpreter: &'static Interpreter,
}

impl PackageLoader {
    pub fn new(interpreter: &'static Interpreter) -> Self {
        Self { interpreter }
    }
}

impl ComponentLoader for PackageLoader {
    type Component = PyComponent;

    fn load(&self, location: &PluginLocation) -> Result<PyComponent, LoadError> {
        let dir = location.dir();
        if !dir.is_dir() {
            return Err(LoadError::DirectoryNotFound(dir.to_path_buf()));
        }
        let entry = dir.join(ENTRY_FILE);
        if !entry.is_file() {
            return Err(LoadError::EntryNotFound(entry));
        }
        File::open(&entry).map_err(|e| LoadError::Unreadable(entry.clone(), e))?;

        logger::debug(&format!(
            "Loading {} as '{}' on Python {}",
            entry.display(),
            location.namespace,
            self.interpreter.version()
        ));

        Python::attach(|py| {
            let module = exec_package(py, &location.namespace, dir, &entry)
                .map_err(|e| LoadError::Execution(exception_message(py, &e)))?;
            Ok(PyComponent::new(location.namespace.clone(), module.unbind()))
        })
    }
}

/// Register and execute the package.
///
/// Every module of the namespace from an earlier load is dropped first, so
/// sibling imports re-execute from disk. A failed execution drops the whole
/// namespace again, including submodules it imported before raising.
fn exec_package<'py>(
    py: Python<'py>,
    namespace: &str,
    dir: &Path,
    entry: &Path,
) -> PyResult<Bound<'py, PyAny>> {
    let importlib = PyModule::import(py, "importlib")?;
    let util = PyModule::import(py, "importlib.util")?;
    let sys_modules = PyModule::import(py, "sys")?.getattr("modules")?;
    let sys_modules = sys_modules.cast::<PyDict>()?;
    let dir_str = dir.to_string_lossy().into_owned();

    let kwargs = PyDict::new(py);
    kwargs.set_item("submodule_search_locations", PyList::new(py, [&dir_str])?)?;
    let spec = util.call_method(
        "spec_from_file_location",
        (namespace, entry.to_string_lossy().as_ref()),
        Some(&kwargs),
    )?;
    if spec.is_none() {
        return Err(PyImportError::new_err(format!(
            "cannot build module spec for {}",
            entry.display()
        )));
    }
    let loader = spec.getattr("loader")?;
    if loader.is_none() {
        return Err(PyImportError::new_err(format!(
            "no loader for {}",
            entry.display()
        )));
    }

    let module = util.call_method1("module_from_spec", (&spec,))?;
    module.setattr("__package__", namespace)?;
    module.setattr("__path__", PyList::new(py, [&dir_str])?)?;

    purge_namespace(sys_modules, namespace)?;
    importlib.call_method0("invalidate_caches")?;
    sys_modules.set_item(namespace, &module)?;
    if let Err(err) = loader.call_method1("exec_module", (&module,)) {
        let _ = purge_namespace(sys_modules, namespace);
        return Err(err);
    }
    Ok(module)
}

/// Remove `namespace` and every `namespace.*` entry from `sys.modules`.
fn purge_namespace(modules: &Bound<'_, PyDict>, namespace: &str) -> PyResult<()> {
    let prefix = format!("{}.", namespace);
    // `keys()` is a snapshot list, so deleting while iterating is safe
    for key in modules.keys() {
        let Ok(name) = key.extract::<String>() else {
            continue;
        };
        if name == namespace || name.starts_with(&prefix) {
            modules.del_item(&key)?;
        }
    }
    Ok(())
}
