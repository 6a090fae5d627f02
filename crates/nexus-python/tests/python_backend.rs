//! Exercises the embedded-Python backends against throwaway packages.

use nexus_config::Config;
use nexus_memory::{ConsistencyProber, ProbeDocument, StoreSettings, VectorCollection, VectorStore};
use nexus_plugin::{
    resolve_capabilities, run_sync, BridgeController, BridgeFailure, BridgeOutcome, BridgeRequest,
    ComponentLoader, ContextPlugin, LoadError, LoadedComponent, PluginError, PluginFactory,
    PluginLocation, ProcessInitializer,
};
use nexus_python::{ChromaStore, Interpreter, PackageLoader};
use pyo3::prelude::*;
use pyo3::types::PyModule;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PLUGIN_INIT: &str = r#"
from .recall import build_prompt

_state = {"config": "unset"}


def nexus_init(config=None):
    _state["config"] = config
    return True


class SmartContextPlugin:
    def __init__(self):
        self.ready = False

    async def initialize(self, config):
        import asyncio
        await asyncio.sleep(0)
        self.ready = True

    def generate_context_prompt(self, message):
        return build_prompt(message, self.ready, _state["config"])
"#;

const PLUGIN_RECALL: &str = r#"
def build_prompt(message, ready, config):
    return f"ctx[{message}] ready={ready} config={config}"
"#;

fn loader() -> PackageLoader {
    let interpreter = Interpreter::get(&Config::default()).unwrap();
    PackageLoader::new(interpreter)
}

fn write_package(root: &Path, files: &[(&str, &str)]) {
    fs::create_dir_all(root).unwrap();
    for (name, body) in files {
        fs::write(root.join(name), body).unwrap();
    }
}

fn registered(namespace: &str) -> bool {
    Python::attach(|py| {
        PyModule::import(py, "sys")
            .unwrap()
            .getattr("modules")
            .unwrap()
            .contains(namespace)
            .unwrap()
    })
}

#[test]
fn test_package_relative_imports_resolve_inside_package() {
    let dir = TempDir::new().unwrap();
    write_package(
        dir.path(),
        &[("__init__.py", PLUGIN_INIT), ("recall.py", PLUGIN_RECALL)],
    );

    let location = PluginLocation::new(dir.path(), "nexus_test_relative");
    let component = loader().load(&location).unwrap();
    assert_eq!(component.namespace(), "nexus_test_relative");
    assert!(registered("nexus_test_relative"));
    assert!(registered("nexus_test_relative.recall"));

    let caps = resolve_capabilities(&component).unwrap();
    assert!(caps.initializer.call(Some("/etc/nexus.json")).unwrap());

    let plugin = caps.plugin_type.construct().unwrap();
    run_sync(plugin.initialize(&serde_json::Map::new())).unwrap();
    let prompt = plugin.generate_context_prompt("sharding").unwrap();
    assert_eq!(
        prompt.as_deref(),
        Some("ctx[sharding] ready=True config=/etc/nexus.json")
    );
}

#[test]
fn test_missing_entry_file() {
    let dir = TempDir::new().unwrap();
    let err = loader()
        .load(&PluginLocation::new(dir.path(), "nexus_test_empty"))
        .err()
        .unwrap();
    assert!(matches!(err, LoadError::EntryNotFound(_)));

    let err = loader()
        .load(&PluginLocation::new(dir.path().join("absent"), "nexus_test_absent"))
        .err()
        .unwrap();
    assert!(matches!(err, LoadError::DirectoryNotFound(_)));
}

#[test]
fn test_raising_package_is_not_left_registered() {
    let dir = TempDir::new().unwrap();
    write_package(
        dir.path(),
        &[("__init__.py", "raise ImportError('vector backend missing')\n")],
    );

    let err = loader()
        .load(&PluginLocation::new(dir.path(), "nexus_test_raising"))
        .err()
        .unwrap();
    match err {
        LoadError::Execution(detail) => assert!(detail.contains("vector backend missing")),
        other => panic!("unexpected error {:?}", other),
    }
    assert!(!registered("nexus_test_raising"));
}

#[test]
fn test_reloading_overwrites_previous_namespace() {
    let dir = TempDir::new().unwrap();
    write_package(dir.path(), &[("__init__.py", "VERSION = 1\n")]);
    let location = PluginLocation::new(dir.path(), "nexus_test_reload");
    loader().load(&location).unwrap();

    // A different size keeps the bytecode cache from serving the old source
    fs::write(dir.path().join("__init__.py"), "VERSION = 2  # rebuilt\n").unwrap();
    loader().load(&location).unwrap();

    let version: i64 = Python::attach(|py| {
        PyModule::import(py, "nexus_test_reload")
            .unwrap()
            .getattr("VERSION")
            .unwrap()
            .extract()
            .unwrap()
    });
    assert_eq!(version, 2);
}

#[test]
fn test_failed_load_drops_imported_submodules() {
    let dir = TempDir::new().unwrap();
    write_package(
        dir.path(),
        &[
            (
                "__init__.py",
                "from .recall import build_prompt\nraise ImportError('late failure')\n",
            ),
            ("recall.py", PLUGIN_RECALL),
        ],
    );

    let err = loader()
        .load(&PluginLocation::new(dir.path(), "nexus_test_partial"))
        .err()
        .unwrap();
    assert!(matches!(err, LoadError::Execution(_)));
    assert!(!registered("nexus_test_partial"));
    assert!(!registered("nexus_test_partial.recall"));
}

#[test]
fn test_reload_re_executes_sibling_modules() {
    let dir = TempDir::new().unwrap();
    write_package(
        dir.path(),
        &[
            ("__init__.py", "from .settings import LIMIT\n"),
            ("settings.py", "LIMIT = 1\n"),
        ],
    );
    let location = PluginLocation::new(dir.path(), "nexus_test_siblings");
    loader().load(&location).unwrap();

    fs::write(dir.path().join("settings.py"), "LIMIT = 250\n").unwrap();
    loader().load(&location).unwrap();

    let limit: i64 = Python::attach(|py| {
        PyModule::import(py, "nexus_test_siblings")
            .unwrap()
            .getattr("LIMIT")
            .unwrap()
            .extract()
            .unwrap()
    });
    assert_eq!(limit, 250);
}

#[test]
fn test_export_kinds_are_checked() {
    let dir = TempDir::new().unwrap();
    write_package(
        dir.path(),
        &[("__init__.py", "nexus_init = True\n\ndef SmartContextPlugin():\n    return None\n")],
    );
    let component = loader()
        .load(&PluginLocation::new(dir.path(), "nexus_test_kinds"))
        .unwrap();

    let err = resolve_capabilities(&component).unwrap_err();
    assert_eq!(err.names(), vec!["nexus_init", "SmartContextPlugin"]);
}

#[test]
fn test_initializer_truthiness() {
    let dir = TempDir::new().unwrap();
    write_package(
        dir.path(),
        &[(
            "__init__.py",
            "def nexus_init(config=None):\n    return 0 if config is None else 'ok'\n\nclass SmartContextPlugin:\n    pass\n",
        )],
    );
    let component = loader()
        .load(&PluginLocation::new(dir.path(), "nexus_test_truthy"))
        .unwrap();
    let caps = resolve_capabilities(&component).unwrap();
    assert!(!caps.initializer.call(None).unwrap());
    assert!(caps.initializer.call(Some("cfg.yaml")).unwrap());
}

#[test]
fn test_controller_with_failing_warmup_still_generates() {
    let dir = TempDir::new().unwrap();
    write_package(
        dir.path(),
        &[(
            "__init__.py",
            r#"
def nexus_init(config=None):
    return True

class SmartContextPlugin:
    async def initialize(self, config):
        raise RuntimeError("embedding model offline")

    def generate_context_prompt(self, message):
        return "fallback:" + message
"#,
        )],
    );

    let controller = BridgeController::new(loader());
    let request = BridgeRequest::new(
        PluginLocation::new(dir.path(), "nexus_test_warmup"),
        "hello",
    );
    for _ in 0..2 {
        match controller.run(&request) {
            BridgeOutcome::Success(text) => assert_eq!(text, "fallback:hello"),
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}

#[test]
fn test_controller_reports_generation_error() {
    let dir = TempDir::new().unwrap();
    write_package(
        dir.path(),
        &[(
            "__init__.py",
            r#"
def nexus_init(config=None):
    return True

class SmartContextPlugin:
    def initialize(self, config):
        return None

    def generate_context_prompt(self, message):
        raise ValueError("recall index corrupt")
"#,
        )],
    );

    let controller = BridgeController::new(loader());
    let request = BridgeRequest::new(PluginLocation::new(dir.path(), "nexus_test_gen"), "hi");
    match controller.run(&request) {
        BridgeOutcome::Failure(failure @ BridgeFailure::Generate(_)) => {
            assert_eq!(
                failure.to_string(),
                "prompt_error: recall index corrupt"
            );
            assert_eq!(failure.exit_code(), 4);
        }
        other => panic!("unexpected outcome {:?}", other),
    }
}

const ASYNC_PLUGIN_INIT: &str = r#"
from . import compat_async


def nexus_init(config=None):
    return True


class SmartContextPlugin:
    def __init__(self):
        self.ready = False

    async def initialize(self, config):
        self.ready = True

    def generate_context_prompt(self, message):
        return f"{message} ready={self.ready} runs={len(compat_async.RUNS)}"
"#;

const ASYNC_PLUGIN_COMPAT: &str = r#"
import asyncio

RUNS = []


def run_coro_sync(coro):
    RUNS.append(coro)
    return asyncio.run(coro)
"#;

fn async_failure(namespace: &str, compat: &str) -> BridgeFailure {
    let dir = TempDir::new().unwrap();
    write_package(
        dir.path(),
        &[
            (
                "__init__.py",
                "def nexus_init(config=None):\n    return True\n\nclass SmartContextPlugin:\n    pass\n",
            ),
            ("compat_async.py", compat),
        ],
    );
    let controller = BridgeController::new(loader());
    let request = BridgeRequest::new(PluginLocation::new(dir.path(), namespace), "hi");
    match controller.run(&request) {
        BridgeOutcome::Failure(failure) => failure,
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn test_package_runner_drives_initialize() {
    let dir = TempDir::new().unwrap();
    write_package(
        dir.path(),
        &[
            ("__init__.py", ASYNC_PLUGIN_INIT),
            ("compat_async.py", ASYNC_PLUGIN_COMPAT),
        ],
    );

    let controller = BridgeController::new(loader());
    let request = BridgeRequest::new(PluginLocation::new(dir.path(), "nexus_test_runner"), "recall");
    match controller.run(&request) {
        BridgeOutcome::Success(text) => assert_eq!(text, "recall ready=True runs=1"),
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[test]
fn test_broken_compat_async_is_an_async_failure() {
    let failure = async_failure(
        "nexus_test_compat_raises",
        "raise ImportError('uvloop is not installed')\n",
    );
    assert!(matches!(failure, BridgeFailure::AsyncSupport(_)));
    assert_eq!(failure.exit_code(), 2);
    assert_eq!(
        failure.to_string(),
        "failed_import_async: uvloop is not installed"
    );
}

#[test]
fn test_compat_async_without_runner_is_an_async_failure() {
    let failure = async_failure("nexus_test_compat_empty", "RUNNER = None\n");
    assert!(matches!(failure, BridgeFailure::AsyncSupport(_)));
    assert!(failure.to_string().starts_with("failed_import_async: "));
    assert!(failure.to_string().contains("run_coro_sync"));

    let failure = async_failure("nexus_test_compat_value", "run_coro_sync = 42\n");
    assert!(matches!(failure, BridgeFailure::AsyncSupport(_)));
    assert!(failure.to_string().contains("is not callable"));
}

#[test]
fn test_sync_initialize_without_coroutine() {
    let dir = TempDir::new().unwrap();
    write_package(
        dir.path(),
        &[(
            "__init__.py",
            "def nexus_init(config=None):\n    return True\n\nclass SmartContextPlugin:\n    def initialize(self, config):\n        self.seen = dict(config)\n    def generate_context_prompt(self, message):\n        return None\n",
        )],
    );
    let component = loader()
        .load(&PluginLocation::new(dir.path(), "nexus_test_sync_init"))
        .unwrap();
    let plugin = resolve_capabilities(&component)
        .unwrap()
        .plugin_type
        .construct()
        .unwrap();
    let result: Result<(), PluginError> = run_sync(plugin.initialize(&serde_json::Map::new()));
    assert!(result.is_ok());
    assert_eq!(plugin.generate_context_prompt("x").unwrap(), None);
}

#[test]
fn test_chroma_write_is_visible() {
    let interpreter = Interpreter::get(&Config::default()).unwrap();
    let has_chroma = Python::attach(|py| PyModule::import(py, "chromadb").is_ok());
    if !has_chroma {
        return;
    }

    let db = TempDir::new().unwrap();
    let store = ChromaStore::connect(interpreter, &StoreSettings::new(db.path())).unwrap();
    let collection = store.get_or_create_collection("nexus_smoke").unwrap();
    let probe = ProbeDocument::new("e2e:abc123", "e2e-marker:1700000000:deadbeef");

    let result = ConsistencyProber::new(&collection).probe(&probe).unwrap();
    assert!(result.ok);
    assert_eq!(result.count_after, result.count_before + 1);
    assert_eq!(collection.count().unwrap(), 1);
}
