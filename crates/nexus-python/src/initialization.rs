//! One-time bootstrap of the embedded interpreter.
//!
//! PyO3 is initialized once per process. When a venv is configured its
//! site-packages is added with `site.addsitedir`, so that `chromadb` and the
//! plugin's own dependencies import without the venv being activated.

use crate::errors::PythonError;
use nexus_config::{resolve_site_packages, Config};
use nexus_logger as logger;
use once_cell::sync::OnceCell;
use pyo3::prelude::*;
use pyo3::types::PyModule;
use std::time::Instant;

pub struct Interpreter {
    version: String,
}

static INTERPRETER: OnceCell<Result<Interpreter, PythonError>> = OnceCell::new();

impl Interpreter {
    /// Get or initialize the interpreter singleton.
    ///
    /// The first caller's config wins; later calls reuse that interpreter.
    pub fn get(config: &Config) -> Result<&'static Interpreter, PythonError> {
        match INTERPRETER.get_or_init(|| Interpreter::initialize(config)) {
            Ok(interpreter) => Ok(interpreter),
            Err(e) => Err(PythonError::Initialization(format!("{}", e))),
        }
    }

    fn initialize(config: &Config) -> Result<Interpreter, PythonError> {
        let start_time = Instant::now();

        let site_packages = match config.get_venv_path() {
            Some(venv_path) => {
                let path = resolve_site_packages(&venv_path)
                    .map_err(|e| PythonError::Venv(venv_path.clone(), e))?;
                Some(path)
            }
            None => None,
        };

        pyo3::Python::initialize();

        let version = pyo3::Python::attach(|py| {
            if let Some(ref site_packages) = site_packages {
                let site = PyModule::import(py, "site")
                    .map_err(|e| PythonError::Import("site".to_string(), format!("{}", e)))?;
                site.call_method1("addsitedir", (site_packages.to_string_lossy().as_ref(),))
                    .map_err(|e| {
                        PythonError::Python(format!("Failed to add site directory: {}", e))
                    })?;
                logger::debug(&format!(
                    "Added site-packages: {}",
                    site_packages.display()
                ));
            }

            let version_info = PyModule::import(py, "sys")?.getattr("version_info")?;
            let major: u8 = version_info.getattr("major")?.extract()?;
            let minor: u8 = version_info.getattr("minor")?.extract()?;
            Ok::<String, PythonError>(format!("{}.{}", major, minor))
        })?;

        logger::debug(&format!(
            "Python {} initialized in {:?}",
            version,
            start_time.elapsed()
        ));

        Ok(Interpreter { version })
    }

    /// `major.minor` of the embedded interpreter
    pub fn version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpreter_is_a_singleton() {
        let first = Interpreter::get(&Config::default()).unwrap();
        let second = Interpreter::get(&Config::default()).unwrap();
        assert!(std::ptr::eq(first, second));
        assert!(first.version().starts_with("3."));
    }
}
