//! The capability contract a context plugin must satisfy.
//!
//! A component exposes a process initializer and a plugin type. The plugin
//! type builds instances with an async `initialize` and a sync
//! `generate_context_prompt`. Backends implement these traits; the controller
//! only ever sees the traits.

use crate::errors::{LoadError, PluginError};
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Where a component lives and which namespace it is registered under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginLocation {
    pub dir: PathBuf,
    pub namespace: String,
}

impl PluginLocation {
    pub fn new(dir: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            namespace: namespace.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Result of looking up a single export by name
#[derive(Debug)]
pub enum Lookup<T> {
    Found(T),
    Missing,
    /// Present, but not something that can be called or constructed
    WrongKind,
}

/// The component's top-level setup function
pub trait ProcessInitializer {
    /// Returns the truthiness of the initializer's result.
    fn call(&self, config: Option<&str>) -> Result<bool, PluginError>;
}

pub trait ContextPlugin {
    /// Warm-up. The returned future must be driven to completion by the caller.
    fn initialize(&self, config: &Map<String, Value>) -> BoxFuture<'static, Result<(), PluginError>>;

    /// `None` means the plugin produced no prompt.
    fn generate_context_prompt(&self, message: &str) -> Result<Option<String>, PluginError>;
}

/// A plugin type, constructible with no arguments
pub trait PluginFactory {
    type Plugin: ContextPlugin;

    fn construct(&self) -> Result<Self::Plugin, PluginError>;
}

/// A materialized component namespace
pub trait LoadedComponent {
    type Initializer: ProcessInitializer;
    type Factory: PluginFactory;

    fn namespace(&self) -> &str;

    fn initializer(&self, name: &str) -> Lookup<Self::Initializer>;

    fn plugin_type(&self, name: &str) -> Lookup<Self::Factory>;

    /// Check that the component's coroutines can be driven from sync code.
    fn ensure_async_support(&self) -> Result<(), PluginError> {
        Ok(())
    }
}

pub trait ComponentLoader {
    type Component: LoadedComponent;

    fn load(&self, location: &PluginLocation) -> Result<Self::Component, LoadError>;
}
