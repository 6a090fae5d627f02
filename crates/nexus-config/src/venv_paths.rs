//! Locating site-packages inside a Python virtual environment.
//!
//! The embedded interpreter does not know about the venv on its own, so the
//! bridge adds this directory to `sys.path` before importing anything.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// "Lib" on Windows, "lib" elsewhere
#[cfg(windows)]
const PYTHON_LIB_DIR: &str = "Lib";
#[cfg(not(windows))]
const PYTHON_LIB_DIR: &str = "lib";

const SITE_PACKAGES: &str = "site-packages";

/// `(major, minor)` of a `pythonX.Y` directory name
#[cfg(not(windows))]
fn python_version(dir_name: &str) -> Option<(u32, u32)> {
    let (major, minor) = dir_name.strip_prefix("python")?.split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VenvPathError {
    #[error("Virtual environment not found: {}", .0.display())]
    VenvNotFound(PathBuf),

    #[error("site-packages not found under {}", .0.display())]
    SitePackagesNotFound(PathBuf),
}

/// Resolve `<venv>/lib/python3.X/site-packages` (`<venv>/Lib/site-packages` on Windows).
pub fn resolve_site_packages(venv_path: &Path) -> Result<PathBuf, VenvPathError> {
    if !venv_path.is_dir() {
        return Err(VenvPathError::VenvNotFound(venv_path.to_path_buf()));
    }
    let lib_dir = venv_path.join(PYTHON_LIB_DIR);

    #[cfg(windows)]
    let candidate = Some(lib_dir.join(SITE_PACKAGES));

    #[cfg(not(windows))]
    let candidate = fs::read_dir(&lib_dir).ok().and_then(|entries| {
        entries
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let version = python_version(&e.file_name().to_string_lossy())?;
                let site_packages = e.path().join(SITE_PACKAGES);
                site_packages.is_dir().then_some((version, site_packages))
            })
            .max_by_key(|(version, _)| *version)
            .map(|(_, path)| path)
    });

    match candidate {
        Some(path) if path.is_dir() => Ok(path),
        _ => Err(VenvPathError::SitePackagesNotFound(lib_dir)),
    }
}
