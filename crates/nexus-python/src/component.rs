//! The Python side of the plugin contract.

use crate::coroutine;
use crate::utils::{exception_message, json_to_py};
use futures::future::BoxFuture;
use futures::FutureExt;
use nexus_plugin::{
    ContextPlugin, LoadedComponent, Lookup, PluginError, PluginFactory, ProcessInitializer,
};
use pyo3::prelude::*;
use pyo3::types::PyType;
use serde_json::{Map, Value};
use std::sync::{Arc, OnceLock};

fn plugin_error(err: PyErr) -> PluginError {
    PluginError::new(Python::attach(|py| exception_message(py, &err)))
}

/// The package's own coroutine runner, filled by `ensure_async_support`.
/// Shared with every plugin type and instance taken from the component.
type RunnerSlot = Arc<OnceLock<Py<PyAny>>>;

/// A package namespace produced by [`crate::PackageLoader`]
#[derive(Debug)]
pub struct PyComponent {
    namespace: String,
    module: Py<PyAny>,
    runner: RunnerSlot,
}

impl PyComponent {
    pub(crate) fn new(namespace: String, module: Py<PyAny>) -> Self {
        Self {
            namespace,
            module,
            runner: RunnerSlot::default(),
        }
    }

    fn lookup<T>(
        &self,
        name: &str,
        accept: impl for<'py> Fn(&Bound<'py, PyAny>) -> bool,
        wrap: impl FnOnce(Py<PyAny>) -> T,
    ) -> Lookup<T> {
        Python::attach(|py| match self.module.bind(py).getattr(name) {
            Ok(attr) if accept(&attr) => Lookup::Found(wrap(attr.unbind())),
            Ok(_) => Lookup::WrongKind,
            Err(_) => Lookup::Missing,
        })
    }
}

impl LoadedComponent for PyComponent {
    type Initializer = PyInitializer;
    type Factory = PyPluginType;

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn initializer(&self, name: &str) -> Lookup<PyInitializer> {
        self.lookup(name, |attr| attr.is_callable(), |func| PyInitializer { func })
    }

    fn plugin_type(&self, name: &str) -> Lookup<PyPluginType> {
        self.lookup(
            name,
            |attr| attr.is_instance_of::<PyType>(),
            |class| PyPluginType {
                class,
                runner: Arc::clone(&self.runner),
            },
        )
    }

    /// A package shipping `compat_async` must expose a callable
    /// `run_coro_sync`, which then drives `initialize`. Other packages use
    /// the built-in `asyncio.run` driver.
    fn ensure_async_support(&self) -> Result<(), PluginError> {
        Python::attach(|py| {
            coroutine::prepare(py)?;
            if let Some(runner) = coroutine::package_runner(py, &self.namespace)? {
                let _ = self.runner.set(runner.unbind());
            }
            Ok::<_, PyErr>(())
        })
        .map_err(plugin_error)
    }
}

#[derive(Debug)]
pub struct PyInitializer {
    func: Py<PyAny>,
}

impl ProcessInitializer for PyInitializer {
    fn call(&self, config: Option<&str>) -> Result<bool, PluginError> {
        Python::attach(|py| self.func.bind(py).call1((config,))?.is_truthy())
            .map_err(plugin_error)
    }
}

#[derive(Debug)]
pub struct PyPluginType {
    class: Py<PyAny>,
    runner: RunnerSlot,
}

impl PluginFactory for PyPluginType {
    type Plugin = PyContextPlugin;

    fn construct(&self) -> Result<PyContextPlugin, PluginError> {
        Python::attach(|py| {
            let instance = self.class.bind(py).call0()?;
            Ok(PyContextPlugin {
                instance: instance.unbind(),
                runner: Arc::clone(&self.runner),
            })
        })
        .map_err(plugin_error)
    }
}

#[derive(Debug)]
pub struct PyContextPlugin {
    instance: Py<PyAny>,
    runner: RunnerSlot,
}

impl ContextPlugin for PyContextPlugin {
    fn initialize(&self, config: &Map<String, Value>) -> BoxFuture<'static, Result<(), PluginError>> {
        let (instance, runner) = Python::attach(|py| {
            (
                self.instance.clone_ref(py),
                self.runner.get().map(|runner| runner.clone_ref(py)),
            )
        });
        let config = Value::Object(config.clone());

        async move {
            let task = tokio::task::spawn_blocking(move || {
                Python::attach(|py| {
                    let config = json_to_py(py, &config)?;
                    let pending = instance.bind(py).call_method1("initialize", (config,))?;
                    let runner = runner.as_ref().map(|runner| runner.bind(py));
                    coroutine::drive(pending, runner).map(|_| ())
                })
                .map_err(plugin_error)
            });
            match task.await {
                Ok(result) => result,
                Err(e) => Err(PluginError::new(format!("initialize task failed: {}", e))),
            }
        }
        .boxed()
    }

    fn generate_context_prompt(&self, message: &str) -> Result<Option<String>, PluginError> {
        Python::attach(|py| {
            let prompt = self
                .instance
                .bind(py)
                .call_method1("generate_context_prompt", (message,))?;
            if !prompt.is_truthy()? {
                return Ok(None);
            }
            prompt.extract::<String>().map(Some)
        })
        .map_err(plugin_error)
    }
}
