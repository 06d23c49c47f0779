// Error type shared by the scanner, the environment actions and the task runner

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Every failure an environment operation can report back to the user.
/// Each variant ends up as a dialog or a status bar message; none is fatal.
#[derive(Debug, Error)]
pub enum VenvError {
    #[error("Directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Invalid environment name '{0}': {1}")]
    InvalidName(String, &'static str),

    #[error("Environment '{0}' already exists")]
    AlreadyExists(String),

    #[error("Cannot import {} into itself", .0.display())]
    NestedImport(PathBuf),

    #[error("Activation script not found at:\n{}", .0.display())]
    ActivationScriptMissing(PathBuf),

    #[error("{program} exited with {status}\n{stderr}")]
    ProcessFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no terminal emulator found (tried gnome-terminal and xterm)")]
    NoTerminal,
}

impl VenvError {
    /// Wraps an I/O error with a short description of what was being attempted.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
