//! Loading and driving an external context plugin.
//!
//! The bridge runs four stages in order: load the component, resolve its two
//! exports, run its process initializer, then build the plugin and generate a
//! prompt. Each stage has its own failure variant, and [`BridgeOutcome`] maps
//! them onto exit statuses at the process boundary.
//!
//! This crate only knows the contract. The Python-backed implementation lives
//! in `nexus-python`.

pub mod contract;
pub mod controller;
pub mod errors;
pub mod outcome;
pub mod resolver;
pub mod sync_adapter;

pub use contract::{
    ComponentLoader, ContextPlugin, LoadedComponent, Lookup, PluginFactory, PluginLocation,
    ProcessInitializer,
};
pub use controller::{BridgeController, BridgeRequest};
pub use errors::{AdapterError, ExportError, ExportProblem, LoadError, PluginError};
pub use outcome::{BridgeFailure, BridgeOutcome, Stage};
pub use resolver::{resolve_capabilities, Capabilities, INITIALIZER_EXPORT, PLUGIN_EXPORT};
pub use sync_adapter::run_sync;
