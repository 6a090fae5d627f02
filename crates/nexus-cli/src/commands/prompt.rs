//! `nexus-context-prompt`: load the context plugin, build one prompt, exit.

use clap::Args;
use nexus_config::Config;
use nexus_logger as logger;
use nexus_plugin::{
    BridgeController, BridgeFailure, BridgeOutcome, BridgeRequest, LoadError, PluginLocation,
};
use nexus_python::{Interpreter, PackageLoader};
use std::io::{self, Write};
use std::path::PathBuf;

/// Emitted when stdout or stderr cannot be written
const EXIT_IO_FAILURE: i32 = 1;

#[derive(Args, Debug, Clone)]
pub struct PromptArgs {
    /// User message to build the context prompt for
    #[arg(long)]
    pub message: String,

    /// Config path handed to the plugin's `nexus_init`; empty means defaults
    #[arg(long, default_value = "")]
    pub config: String,

    /// Directory of the plugin package
    #[arg(long, env = "NEXUS_PLUGIN_DIR")]
    pub plugin_dir: Option<PathBuf>,

    /// Module name the package is registered under
    #[arg(long)]
    pub namespace: Option<String>,
}

impl PromptArgs {
    /// Flag (or `NEXUS_PLUGIN_DIR`), then the config file, then the default layout.
    pub fn plugin_dir(&self, config: &Config) -> PathBuf {
        match &self.plugin_dir {
            Some(dir) if !dir.as_os_str().is_empty() => dir.clone(),
            _ => config.get_plugin_dir(),
        }
    }

    pub fn namespace(&self, config: &Config) -> String {
        match &self.namespace {
            Some(ns) if !ns.trim().is_empty() => ns.trim().to_string(),
            _ => config.get_namespace(),
        }
    }

    pub fn request(&self, config: &Config) -> BridgeRequest {
        let location = PluginLocation::new(self.plugin_dir(config), self.namespace(config));
        BridgeRequest::new(location, self.message.clone()).with_config(Some(self.config.clone()))
    }
}

/// Run the bridge and write its outcome; returns the process exit code.
pub fn handle_prompt(args: &PromptArgs) -> i32 {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            logger::warn(&format!("Ignoring unreadable config: {}", e));
            Config::default()
        }
    };

    let request = args.request(&config);
    logger::debug(&format!(
        "Bridging '{}' from {}",
        request.location.namespace,
        request.location.dir().display()
    ));

    let outcome = match Interpreter::get(&config) {
        Ok(interpreter) => BridgeController::new(PackageLoader::new(interpreter)).run(&request),
        Err(e) => BridgeOutcome::Failure(BridgeFailure::Load(LoadError::Interpreter(
            e.to_string(),
        ))),
    };

    emit(&outcome, &mut io::stdout().lock(), &mut io::stderr().lock())
}

fn emit<O: Write, E: Write>(outcome: &BridgeOutcome, stdout: &mut O, stderr: &mut E) -> i32 {
    match outcome.emit(stdout, stderr) {
        Ok(code) => code,
        Err(e) => {
            logger::error(&format!("Failed to write result: {}", e));
            EXIT_IO_FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn args(plugin_dir: Option<&str>, namespace: Option<&str>, config: &str) -> PromptArgs {
        PromptArgs {
            message: "what did we decide about the index?".to_string(),
            config: config.to_string(),
            plugin_dir: plugin_dir.map(PathBuf::from),
            namespace: namespace.map(str::to_string),
        }
    }

    #[test]
    fn test_flag_overrides_config() {
        let config = Config {
            plugin_dir: Some("/srv/nexus/plugin".to_string()),
            namespace: Some("from_config".to_string()),
            ..Default::default()
        };
        let request = args(Some("/opt/plugin"), Some(" cli_ns "), "").request(&config);
        assert_eq!(request.location.dir(), Path::new("/opt/plugin"));
        assert_eq!(request.location.namespace, "cli_ns");
        assert_eq!(request.config, None);
    }

    #[test]
    fn test_falls_back_to_config_then_defaults() {
        let config = Config {
            plugin_dir: Some("/srv/nexus/plugin".to_string()),
            ..Default::default()
        };
        let request = args(None, None, "/etc/nexus.json").request(&config);
        assert_eq!(request.location.dir(), Path::new("/srv/nexus/plugin"));
        assert_eq!(request.location.namespace, nexus_config::DEFAULT_NAMESPACE);
        assert_eq!(request.config.as_deref(), Some("/etc/nexus.json"));

        let request = args(Some(""), Some("  "), "").request(&Config::default());
        assert_eq!(
            request.location.dir(),
            Path::new(nexus_config::DEFAULT_PLUGIN_DIR)
        );
        assert_eq!(request.location.namespace, nexus_config::DEFAULT_NAMESPACE);
    }

    #[test]
    fn test_emit_writes_outcome() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let outcome = BridgeOutcome::Failure(BridgeFailure::Load(LoadError::Interpreter(
            "no python".to_string(),
        )));
        let code = emit(&outcome, &mut out, &mut err);
        assert_eq!(code, 2);
        assert!(out.is_empty());
        assert!(String::from_utf8_lossy(&err).starts_with("failed_import_pkg: "));
    }
}
