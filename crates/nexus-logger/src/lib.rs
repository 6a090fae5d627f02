//! Process-wide logger shared by the nexus binaries.
//!
//! Everything is appended to a per-run log file. Console output goes to
//! stderr and only when the verbosity asks for it, because both tools reserve
//! stdout for their result and stderr for a single diagnostic line.

use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

const LOG_FILE_NAME: &str = "nexus.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warn,
    Success,
    Info,
    Debug,
    Trace,
}

impl Level {
    fn label(self) -> &'static str {
        match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Success => "SUCCESS",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        }
    }

    /// Lowest verbosity at which the level reaches the console
    fn console_threshold(self) -> u8 {
        match self {
            Level::Error => 0,
            Level::Trace => 2,
            _ => 1,
        }
    }

    fn console_prefix(self) -> Option<ColoredString> {
        match self {
            Level::Error => Some("Error:".red().bold()),
            Level::Warn => Some("warning:".yellow().bold()),
            Level::Success => Some("\u{2714}".green().bold()),
            Level::Debug => Some("DEBUG:".blue().bold()),
            Level::Trace => Some("TRACE:".dimmed()),
            Level::Info => None,
        }
    }
}

struct LogState {
    verbosity: u8,
    file: Option<File>,
}

static STATE: Mutex<LogState> = Mutex::new(LogState {
    verbosity: 0,
    file: None,
});
static SPINNER: Mutex<Option<ProgressBar>> = Mutex::new(None);

/// 0 = quiet, 1 = debug (-v), 2 = trace (-vv)
pub fn get_verbosity() -> u8 {
    STATE.lock().map(|state| state.verbosity).unwrap_or(0)
}

/// Set the verbosity and open the log file under `~/.config/nexus`.
pub fn init_with_verbosity(verbosity: u8) -> Result<(), String> {
    if let Ok(mut state) = STATE.lock() {
        state.verbosity = verbosity;
    }
    init_in_dir(&default_log_dir()?)
}

/// Open `dir/nexus.log`, truncating whatever the previous run left there.
pub fn init_in_dir(dir: &Path) -> Result<(), String> {
    fs::create_dir_all(dir).map_err(|e| format!("Failed to create log directory: {}", e))?;

    let path = dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path)
        .map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;

    let mut state = STATE
        .lock()
        .map_err(|_| "Logger state poisoned".to_string())?;
    state.file = Some(file);
    Ok(())
}

fn default_log_dir() -> Result<PathBuf, String> {
    let base = if cfg!(target_os = "windows") {
        dirs::config_dir()
    } else {
        dirs::home_dir().map(|home| home.join(".config"))
    };
    base.map(|dir| dir.join("nexus"))
        .ok_or_else(|| "Could not determine home directory".to_string())
}

/// Append to the log file, then echo to stderr if the verbosity allows.
pub fn log(level: Level, message: &str) {
    let verbosity = match STATE.lock() {
        Ok(mut state) => {
            if let Some(file) = state.file.as_mut() {
                let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
                let _ = writeln!(file, "[{}] {} {}", timestamp, level.label(), message);
            }
            state.verbosity
        }
        Err(_) => 0,
    };

    if verbosity < level.console_threshold() {
        return;
    }
    let line = match level.console_prefix() {
        Some(prefix) => format!("{} {}", prefix, message),
        None => message.to_string(),
    };
    match SPINNER.lock().ok().and_then(|guard| guard.clone()) {
        Some(spinner) => spinner.suspend(|| eprintln!("{}", line)),
        None => eprintln!("{}", line),
    }
}

pub fn error(message: &str) {
    log(Level::Error, message);
}

pub fn warn(message: &str) {
    log(Level::Warn, message);
}

pub fn success(message: &str) {
    log(Level::Success, message);
}

pub fn debug(message: &str) {
    log(Level::Debug, message);
}

/// Show a spinner on stderr while a quiet run waits on slow work.
///
/// Verbose runs print their own progress, so no spinner is drawn there.
pub fn spinner_start(message: &str) {
    if get_verbosity() > 0 {
        return;
    }

    let spinner = ProgressBar::new_spinner().with_message(message.to_string());
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        spinner.set_style(style.tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
    }
    spinner.enable_steady_tick(Duration::from_millis(100));

    if let Ok(mut guard) = SPINNER.lock() {
        if let Some(previous) = guard.replace(spinner) {
            previous.finish_and_clear();
        }
    }
}

pub fn spinner_stop() {
    let spinner = SPINNER.lock().ok().and_then(|mut guard| guard.take());
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
}
