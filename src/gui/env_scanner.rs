use crate::error::VenvError;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-environment executables folder on this platform.
pub fn scripts_dir_name() -> &'static str {
    if cfg!(windows) { "Scripts" } else { "bin" }
}

/// Activation script of environment `name` under `root`.
pub fn activation_script(root: &Path, name: &str) -> PathBuf {
    let scripts = root.join(name).join(scripts_dir_name());
    if cfg!(windows) {
        scripts.join("activate.bat")
    } else {
        scripts.join("activate")
    }
}

/// pip executable inside environment `name` under `root`.
pub fn pip_executable(root: &Path, name: &str) -> PathBuf {
    let scripts = root.join(name).join(scripts_dir_name());
    if cfg!(windows) {
        scripts.join("pip.exe")
    } else {
        scripts.join("pip")
    }
}

/// Lists the environments under `root`: immediate subdirectories that
/// contain the platform's scripts folder. Everything else is skipped quietly.
pub fn scan_environments(root: &Path) -> Result<Vec<String>, VenvError> {
    if !root.is_dir() {
        return Err(VenvError::RootNotFound(root.to_path_buf()));
    }

    let entries = fs::read_dir(root)
        .map_err(|e| VenvError::io(format!("failed to read {}", root.display()), e))?;

    let mut out = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if !path.join(scripts_dir_name()).is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => out.push(name),
            Err(raw) => log::debug!("skipping non UTF-8 directory name {:?}", raw),
        }
    }

    out.sort();
    log::debug!("found {} environments under {}", out.len(), root.display());
    Ok(out)
}

/// Status bar text after a successful scan.
pub fn scan_status(count: usize) -> String {
    if count == 0 {
        "No virtual environments found".to_string()
    } else {
        format!("Found {} virtual environments.", count)
    }
}
