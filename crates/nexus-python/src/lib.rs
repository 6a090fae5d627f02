//! Python-backed implementations of the nexus contracts.
//!
//! The interpreter is embedded through PyO3 and bootstrapped once per
//! process. On top of it sit the package loader and plugin adapter behind
//! `nexus-plugin`, and the Chroma collection behind `nexus-memory`.

mod chroma;
mod component;
mod coroutine;
pub mod errors;
mod initialization;
mod package_loader;
mod utils;

pub use chroma::{ChromaCollection, ChromaStore};
pub use component::{PyComponent, PyContextPlugin, PyInitializer, PyPluginType};
pub use errors::PythonError;
pub use initialization::Interpreter;
pub use package_loader::{PackageLoader, ENTRY_FILE};
