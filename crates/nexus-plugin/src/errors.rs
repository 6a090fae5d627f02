use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A failure raised by plugin code, carrying its rendered message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct PluginError {
    message: String,
}

impl PluginError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors while materializing a component from its directory
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("plugin directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("entry file not found: {0}")]
    EntryNotFound(PathBuf),

    #[error("failed to read {0}: {1}")]
    Unreadable(PathBuf, io::Error),

    #[error("{0}")]
    Execution(String),

    #[error("interpreter unavailable: {0}")]
    Interpreter(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportProblem {
    Missing(String),
    WrongKind { name: String, expected: &'static str },
}

impl fmt::Display for ExportProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportProblem::Missing(name) => write!(f, "missing export '{}'", name),
            ExportProblem::WrongKind { name, expected } => {
                write!(f, "export '{}' is not {}", name, expected)
            }
        }
    }
}

/// One or more required exports were absent or of the wrong kind
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("module '{namespace}': {}", join_problems(.problems))]
pub struct ExportError {
    pub namespace: String,
    pub problems: Vec<ExportProblem>,
}

impl ExportError {
    pub fn names(&self) -> Vec<&str> {
        self.problems
            .iter()
            .map(|p| match p {
                ExportProblem::Missing(name) => name.as_str(),
                ExportProblem::WrongKind { name, .. } => name.as_str(),
            })
            .collect()
    }
}

fn join_problems(problems: &[ExportProblem]) -> String {
    problems
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failures of the sync-over-async adapter itself
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] io::Error),

    #[error("async task panicked: {0}")]
    Panicked(String),
}

impl From<AdapterError> for PluginError {
    fn from(err: AdapterError) -> Self {
        PluginError::new(err.to_string())
    }
}
