// Data models for virtual environments, background tasks and settings

use crate::error::VenvError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted application settings
pub mod settings;

pub use settings::{Settings, ThemeKind};

/// Directory inside an environment that holds the sidecar file
pub const SIDECAR_DIR: &str = ".env_settings";

/// File name of the sidecar inside [`SIDECAR_DIR`]
pub const SIDECAR_FILE: &str = "settings.json";

/// Per-environment metadata written by the import flow.
/// Lives next to the environment's own files so it travels with the directory.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvSidecar {
    /// Script to run right after activation, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_file: Option<PathBuf>,
}

impl EnvSidecar {
    /// Location of the sidecar for the environment at `env_dir`.
    pub fn path(env_dir: &Path) -> PathBuf {
        env_dir.join(SIDECAR_DIR).join(SIDECAR_FILE)
    }

    /// Reads the sidecar of an environment.
    /// A missing or malformed file yields `None`; it is never an error.
    pub fn load(env_dir: &Path) -> Option<Self> {
        let path = Self::path(env_dir);
        let contents = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(sidecar) => Some(sidecar),
            Err(e) => {
                log::debug!("ignoring malformed sidecar {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Writes the sidecar, creating its directory when needed.
    pub fn save(&self, env_dir: &Path) -> Result<(), VenvError> {
        let path = Self::path(env_dir);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| VenvError::io(format!("failed to create {}", parent.display()), e))?;
        }
        let contents = serde_json::to_string(self)?;
        fs::write(&path, contents)
            .map_err(|e| VenvError::io(format!("failed to write {}", path.display()), e))
    }

    /// Main file recorded in the sidecar, but only if it still exists on disk.
    pub fn existing_main_file(&self) -> Option<&Path> {
        self.main_file.as_deref().filter(|p| p.is_file())
    }
}

/// Everything the create dialog collects before a new environment is built.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CreateRequest {
    /// Directory name of the new environment under the root path
    pub name: String,
    /// Interpreter used to run `-m venv`
    pub python_path: PathBuf,
    /// Whitespace separated list of packages for pip, may be empty
    pub packages: String,
    /// Pass `--system-site-packages`
    pub system_site_packages: bool,
    /// Pass `--without-pip`
    pub without_pip: bool,
}

impl CreateRequest {
    /// Packages to install after creation, split on whitespace.
    pub fn package_list(&self) -> Vec<&str> {
        self.packages.split_whitespace().collect()
    }
}

/// The kinds of background work the application dispatches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    /// `python -m venv` followed by an optional pip install
    Create,
    /// Recursive copy of an existing environment into the root path
    Import,
    /// Recursive removal of a managed environment
    Delete,
    /// Recursive removal of the source directory after an import
    DeleteOriginal,
    /// Terminal launch with the environment activated
    Activate,
}

impl TaskKind {
    /// Text shown in the busy dialog while the task runs.
    pub fn busy_message(self, env_name: &str) -> String {
        match self {
            TaskKind::Create => format!("Creating environment '{}'", env_name),
            TaskKind::Import => format!("Importing environment as '{}'", env_name),
            TaskKind::Delete => format!("Deleting environment '{}'", env_name),
            TaskKind::DeleteOriginal => "Deleting original environment".to_string(),
            TaskKind::Activate => format!("Activating {}", env_name),
        }
    }

    /// Title of the error dialog when the task fails.
    pub fn failure_title(self) -> &'static str {
        match self {
            TaskKind::Create => "Creation Failed",
            TaskKind::Import => "Import Failed",
            TaskKind::Delete => "Deletion Failed",
            TaskKind::DeleteOriginal => "Deletion Error",
            TaskKind::Activate => "Activation Error",
        }
    }

    /// Status bar text when the task fails.
    pub fn failure_status(self) -> &'static str {
        match self {
            TaskKind::Create => "Environment creation failed",
            TaskKind::Import => "Environment import failed",
            TaskKind::Delete => "Environment deletion failed",
            TaskKind::DeleteOriginal => {
                "Import successful, but could not delete original environment."
            }
            TaskKind::Activate => "Environment activation failed",
        }
    }
}

/// Payload a worker hands back when its unit of work succeeded.
#[derive(Clone, Debug, PartialEq)]
pub enum TaskSuccess {
    /// New environment created, packages (if any) installed
    Created,
    /// Copy finished; `source` is offered for deletion afterwards
    Imported {
        source: PathBuf,
        main_file: Option<PathBuf>,
    },
    /// Managed environment removed
    Deleted,
    /// Import source removed
    OriginalDeleted,
    /// Terminal started; `main_file` is the script it runs, if any
    Activated { main_file: Option<PathBuf> },
}

impl TaskSuccess {
    /// Status bar text for a successful task on `env_name`.
    pub fn status_message(&self, env_name: &str) -> String {
        match self {
            TaskSuccess::Created => format!("Environment '{}' created successfully", env_name),
            TaskSuccess::Imported { .. } => format!("Environment imported as '{}'", env_name),
            TaskSuccess::Deleted => format!("Environment '{}' deleted", env_name),
            TaskSuccess::OriginalDeleted => format!(
                "Original environment deleted. '{}' imported successfully.",
                env_name
            ),
            TaskSuccess::Activated { main_file: None } => {
                format!("Activated '{}' environment", env_name)
            }
            TaskSuccess::Activated {
                main_file: Some(file),
            } => format!(
                "Activated '{}' and running {}",
                env_name,
                file.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.display().to_string())
            ),
        }
    }
}

/// Completion notification posted from a worker thread to the UI thread.
#[derive(Debug)]
pub struct TaskMessage {
    /// Monotonic id assigned when the task was spawned
    pub id: u64,
    /// What kind of work finished
    pub kind: TaskKind,
    /// Environment the work was about
    pub env_name: String,
    /// Success payload or the error to show the user
    pub result: Result<TaskSuccess, VenvError>,
}
