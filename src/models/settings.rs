//! # Settings Persistence
//!
//! The global settings document lives in `~/.pyenvmanager/settings.json`.
//! Loading overlays whatever the file holds on top of [`Settings::default`];
//! a file that cannot be read or parsed is logged and replaced by the
//! defaults, never surfaced to the user. Keys this version does not know
//! about are kept and written back on save.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Folder name used for the per-user data directory
pub const APP_DIR_NAME: &str = "PyVenvManager";

/// Hidden folder in the home directory that holds `settings.json`
pub const SETTINGS_DIR_NAME: &str = ".pyenvmanager";

/// Built-in color schemes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ThemeKind {
    #[default]
    Light,
    Dark,
}

impl ThemeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeKind::Light => "light",
            ThemeKind::Dark => "dark",
        }
    }
}

// Unknown names render as the light theme
impl From<String> for ThemeKind {
    fn from(name: String) -> Self {
        if name.eq_ignore_ascii_case("dark") {
            ThemeKind::Dark
        } else {
            ThemeKind::Light
        }
    }
}

impl From<ThemeKind> for String {
    fn from(kind: ThemeKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Application settings, persisted as one flat JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root directory holding one subdirectory per environment
    pub venv_dir: PathBuf,
    /// Interpreter used for `-m venv`
    pub python_path: PathBuf,
    /// Selected color scheme
    pub theme: ThemeKind,
    /// Palette overrides keyed by slot name (`primary`, `text`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_colors: Option<BTreeMap<String, String>>,
    /// Keys written by other versions, carried through untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            venv_dir: default_venv_dir(),
            python_path: default_python_path(),
            theme: ThemeKind::default(),
            custom_colors: None,
            extra: serde_json::Map::new(),
        }
    }
}

impl Settings {
    /// Load settings from the fixed per-user location.
    /// Falls back to defaults when the file is missing, unreadable or corrupt.
    pub fn load() -> Self {
        match Self::settings_path() {
            Ok(path) => {
                ensure_parent_dir(&path);
                Self::load_from(&path)
            }
            Err(e) => {
                log::warn!("Error loading settings: {:#}", e);
                Self::default()
            }
        }
    }

    /// Load settings from a specific path with the same fallback rules as [`Settings::load`].
    pub fn load_from(path: &Path) -> Self {
        match Self::try_load_from(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Error loading settings: {:#}", e);
                Self::default()
            }
        }
    }

    fn try_load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("no settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let settings: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;
        Ok(settings)
    }

    /// Save the full document to the fixed per-user location.
    pub fn save(&self) -> Result<()> {
        let path = Self::settings_path()?;
        self.save_to(&path)
    }

    /// Save the full document to `path`.
    /// The new contents go to a sibling temp file first, so a failed write
    /// never clobbers the previous settings.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory: {}", parent.display())
            })?;
        }

        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, contents)
            .with_context(|| format!("Failed to write settings file: {}", tmp_path.display()))?;
        if let Err(e) = fs::rename(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e)
                .with_context(|| format!("Failed to replace settings file: {}", path.display()));
        }
        log::info!("settings saved to {}", path.display());
        Ok(())
    }

    /// Create the environments root if it is missing. Failure is logged only;
    /// the scanner reports the missing directory on its own.
    pub fn ensure_venv_dir(&self) {
        if let Err(e) = fs::create_dir_all(&self.venv_dir) {
            log::warn!(
                "could not create environments directory {}: {}",
                self.venv_dir.display(),
                e
            );
        }
    }

    /// Whether the configured interpreter resolves to an executable file.
    pub fn python_is_executable(&self) -> bool {
        interpreter_is_executable(&self.python_path)
    }

    /// Return the path to the settings file.
    fn settings_path() -> Result<PathBuf> {
        let dirs = directories::BaseDirs::new().context("Could not determine home directory")?;
        Ok(dirs.home_dir().join(SETTINGS_DIR_NAME).join("settings.json"))
    }
}

/// Creates the directory that will hold `path`. Failure is logged only;
/// a later save reports it to the user.
fn ensure_parent_dir(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            log::warn!(
                "could not create settings directory {}: {}",
                parent.display(),
                e
            );
        }
    }
}

/// Whether `path` names an executable file. A bare name is looked up on `PATH`.
pub fn interpreter_is_executable(path: &Path) -> bool {
    let resolved = if path.components().count() > 1 {
        path.to_path_buf()
    } else {
        match which::which(path) {
            Ok(p) => p,
            Err(_) => return false,
        }
    };
    is_executable(&resolved)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use nix::unistd::{AccessFlags, access};
    path.is_file() && access(path, AccessFlags::X_OK).is_ok()
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Per-user local data directory of the app, e.g. `~/.local/share/pyvenvmanager`.
fn default_venv_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", APP_DIR_NAME)
        .map(|dirs| dirs.data_local_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(APP_DIR_NAME))
}

/// First Python interpreter on `PATH`, or a bare name the OS may still resolve.
fn default_python_path() -> PathBuf {
    let candidates: &[&str] = if cfg!(windows) {
        &["python", "py", "python3"]
    } else {
        &["python3", "python"]
    };
    candidates
        .iter()
        .find_map(|name| which::which(name).ok())
        .unwrap_or_else(|| PathBuf::from(candidates[0]))
}
