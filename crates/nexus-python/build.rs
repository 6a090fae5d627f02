//! Link against a bundled libpython when one is staged for the target.
//!
//! Release builds ship the interpreter next to the binaries. Without a staged
//! shim, PyO3 links the system interpreter and this script does nothing.

use std::env;
use std::path::{Path, PathBuf};

fn main() {
    println!("cargo:rerun-if-env-changed=NEXUS_PYTHON_SHIM_DIR");

    let Ok(manifest_dir) = env::var("CARGO_MANIFEST_DIR") else {
        return;
    };
    let Ok(target) = env::var("TARGET") else {
        return;
    };
    let shim_dir = env::var("NEXUS_PYTHON_SHIM_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(&manifest_dir)
                .join("../../python-shim")
                .join(&target)
        });

    if !shim_dir.is_dir() {
        return;
    }

    match find_python_lib(&shim_dir) {
        Some(lib_file) => {
            println!("cargo:rustc-link-search=native={}", shim_dir.display());
            println!("cargo:rerun-if-changed={}", lib_file.display());
            add_rpath(&target);
        }
        None => println!(
            "cargo:warning=no libpython found in {}, using the system interpreter",
            shim_dir.display()
        ),
    }
}

fn find_python_lib(dir: &Path) -> Option<PathBuf> {
    dir.read_dir().ok()?.flatten().map(|e| e.path()).find(|path| {
        let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
            return false;
        };
        path.is_file()
            && ((name.starts_with("libpython")
                && (name.ends_with(".so") || name.ends_with(".dylib")))
                || (name.starts_with("python") && name.ends_with(".dll")))
    })
}

fn add_rpath(target: &str) {
    if target.contains("apple-darwin") {
        println!("cargo:rustc-link-arg=-Wl,-rpath,@executable_path");
    } else if target.contains("linux") {
        println!("cargo:rustc-link-arg=-Wl,-rpath,$ORIGIN");
    }
}
