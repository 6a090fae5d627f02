//! Terminal result of one bridge run and its mapping to exit statuses.

use crate::errors::{ExportError, LoadError, PluginError};
use std::fmt;
use std::io::{self, Write};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_LOAD_FAILURE: i32 = 2;
pub const EXIT_EXPORT_FAILURE: i32 = 2;
pub const EXIT_INIT_FAILURE: i32 = 3;
pub const EXIT_GENERATE_FAILURE: i32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Export,
    Init,
    Generate,
}

impl Stage {
    pub fn exit_code(self) -> i32 {
        match self {
            Stage::Load => EXIT_LOAD_FAILURE,
            Stage::Export => EXIT_EXPORT_FAILURE,
            Stage::Init => EXIT_INIT_FAILURE,
            Stage::Generate => EXIT_GENERATE_FAILURE,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Export => "export",
            Stage::Init => "init",
            Stage::Generate => "generate",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub enum BridgeFailure {
    Load(LoadError),
    Export(ExportError),
    /// The component's coroutines cannot be driven
    AsyncSupport(PluginError),
    /// The process initializer raised
    InitError(PluginError),
    /// The process initializer returned a falsy value
    InitFailed,
    Generate(PluginError),
}

impl BridgeFailure {
    pub fn stage(&self) -> Stage {
        match self {
            BridgeFailure::Load(_) => Stage::Load,
            BridgeFailure::Export(_) | BridgeFailure::AsyncSupport(_) => Stage::Export,
            BridgeFailure::InitError(_) | BridgeFailure::InitFailed => Stage::Init,
            BridgeFailure::Generate(_) => Stage::Generate,
        }
    }

    /// Stable diagnostic tag callers can match on
    pub fn tag(&self) -> &'static str {
        match self {
            BridgeFailure::Load(_) => "failed_import_pkg",
            BridgeFailure::Export(_) => "failed_exports",
            BridgeFailure::AsyncSupport(_) => "failed_import_async",
            BridgeFailure::InitError(_) => "nexus_init_error",
            BridgeFailure::InitFailed => "nexus_init_failed",
            BridgeFailure::Generate(_) => "prompt_error",
        }
    }

    pub fn detail(&self) -> Option<String> {
        match self {
            BridgeFailure::Load(e) => Some(e.to_string()),
            BridgeFailure::Export(e) => Some(e.to_string()),
            BridgeFailure::AsyncSupport(e)
            | BridgeFailure::InitError(e)
            | BridgeFailure::Generate(e) => Some(e.to_string()),
            BridgeFailure::InitFailed => None,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.stage().exit_code()
    }
}

/// Renders the one-line diagnostic, `<tag>: <detail>` or just `<tag>`.
impl fmt::Display for BridgeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail() {
            Some(detail) => write!(f, "{}: {}", self.tag(), single_line(&detail)),
            None => f.write_str(self.tag()),
        }
    }
}

impl std::error::Error for BridgeFailure {}

fn single_line(detail: &str) -> String {
    detail
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" | ")
}

#[derive(Debug)]
pub enum BridgeOutcome {
    Success(String),
    Failure(BridgeFailure),
}

impl BridgeOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            BridgeOutcome::Success(_) => EXIT_SUCCESS,
            BridgeOutcome::Failure(failure) => failure.exit_code(),
        }
    }

    /// Write the prompt to `stdout` or the diagnostic to `stderr`, never both,
    /// and return the exit status.
    pub fn emit<O: Write, E: Write>(&self, stdout: &mut O, stderr: &mut E) -> io::Result<i32> {
        match self {
            BridgeOutcome::Success(text) => {
                stdout.write_all(text.as_bytes())?;
                stdout.flush()?;
            }
            BridgeOutcome::Failure(failure) => {
                writeln!(stderr, "{}", failure)?;
                stderr.flush()?;
            }
        }
        Ok(self.exit_code())
    }
}
