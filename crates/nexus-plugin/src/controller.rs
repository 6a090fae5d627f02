use crate::contract::{
    ComponentLoader, ContextPlugin, LoadedComponent, PluginFactory, PluginLocation,
    ProcessInitializer,
};
use crate::errors::PluginError;
use crate::outcome::{BridgeFailure, BridgeOutcome};
use crate::resolver::resolve_capabilities;
use crate::sync_adapter::run_sync;
use serde_json::{Map, Value};
use tracing::debug;

/// Inputs of one bridge invocation
#[derive(Debug, Clone)]
pub struct BridgeRequest {
    pub location: PluginLocation,
    pub message: String,
    /// Passed through to the process initializer; `None` means defaults
    pub config: Option<String>,
    /// Mapping handed to the plugin's async `initialize`
    pub init_config: Map<String, Value>,
}

impl BridgeRequest {
    pub fn new(location: PluginLocation, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
            config: None,
            init_config: Map::new(),
        }
    }

    /// An empty config path is the same as no config path. Anything else,
    /// whitespace included, reaches the initializer as given.
    pub fn with_config(mut self, config: Option<String>) -> Self {
        self.config = config.filter(|c| !c.is_empty());
        self
    }

    pub fn with_init_config(mut self, init_config: Map<String, Value>) -> Self {
        self.init_config = init_config;
        self
    }
}

/// Runs load -> resolve -> init -> generate, stopping at the first failure.
pub struct BridgeController<L> {
    loader: L,
}

impl<L: ComponentLoader> BridgeController<L> {
    pub fn new(loader: L) -> Self {
        Self { loader }
    }

    pub fn run(&self, request: &BridgeRequest) -> BridgeOutcome {
        match self.try_run(request) {
            Ok(text) => BridgeOutcome::Success(text),
            Err(failure) => {
                debug!(stage = %failure.stage(), tag = failure.tag(), "bridge run failed");
                BridgeOutcome::Failure(failure)
            }
        }
    }

    fn try_run(&self, request: &BridgeRequest) -> Result<String, BridgeFailure> {
        debug!(dir = %request.location.dir().display(), "loading component");
        let component = self
            .loader
            .load(&request.location)
            .map_err(BridgeFailure::Load)?;

        debug!(namespace = component.namespace(), "resolving exports");
        let capabilities = resolve_capabilities(&component).map_err(BridgeFailure::Export)?;
        component
            .ensure_async_support()
            .map_err(BridgeFailure::AsyncSupport)?;

        debug!(config = ?request.config, "running process initializer");
        let ok = capabilities
            .initializer
            .call(request.config.as_deref())
            .map_err(BridgeFailure::InitError)?;
        if !ok {
            return Err(BridgeFailure::InitFailed);
        }

        generate(&capabilities.plugin_type, request).map_err(BridgeFailure::Generate)
    }
}

fn generate<F: PluginFactory>(factory: &F, request: &BridgeRequest) -> Result<String, PluginError> {
    let plugin = factory.construct()?;

    // Warm-up is best effort: the prompt is still attempted when it fails
    if let Err(e) = run_sync(plugin.initialize(&request.init_config)) {
        debug!(error = %e, "plugin initialize failed, continuing");
    }

    debug!("generating context prompt");
    Ok(plugin
        .generate_context_prompt(&request.message)?
        .unwrap_or_default())
}
