// Blocking units of work behind the Create / Import / Delete / Activate buttons.
// Everything here runs on a worker thread; nothing touches UI state.

use crate::error::VenvError;
use crate::gui::env_scanner::{activation_script, pip_executable};
use crate::gui::terminal;
use crate::models::{CreateRequest, EnvSidecar, TaskSuccess};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::LazyLock;
use walkdir::WalkDir;

/// Files probed, in order, at the top of an imported environment
pub const MAIN_FILE_CANDIDATES: [&str; 5] =
    ["main.py", "app.py", "run.py", "start.py", "__main__.py"];

// Characters that would escape the root path or are illegal on Windows
static FORBIDDEN_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1f]"#).expect("static pattern"));

/// Rejects names that are empty, hidden, or would not map to a single
/// directory directly under the root path.
pub fn validate_name(name: &str) -> Result<(), VenvError> {
    if name.trim().is_empty() {
        return Err(VenvError::InvalidName(
            name.to_string(),
            "Please enter a name for the environment",
        ));
    }
    if name.starts_with('.') {
        return Err(VenvError::InvalidName(name.to_string(), "name may not start with '.'"));
    }
    if FORBIDDEN_NAME_CHARS.is_match(name) {
        return Err(VenvError::InvalidName(
            name.to_string(),
            "name may not contain path separators or special characters",
        ));
    }
    Ok(())
}

/// Validates `name` and makes sure nothing exists at `<root>/<name>` yet.
/// Returns the path the new environment will occupy.
pub fn check_new_target(root: &Path, name: &str) -> Result<PathBuf, VenvError> {
    validate_name(name)?;
    let target = root.join(name);
    if target.exists() {
        return Err(VenvError::AlreadyExists(name.to_string()));
    }
    Ok(target)
}

/// Runs a command to completion and turns a non-zero exit into an error
/// carrying the captured stderr.
fn run_checked(command: &mut Command, program: &str) -> Result<Output, VenvError> {
    log::debug!("running {:?}", command);
    let output = command.output().map_err(|source| VenvError::Spawn {
        program: program.to_string(),
        source,
    })?;
    if !output.status.success() {
        return Err(VenvError::ProcessFailed {
            program: program.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

/// `python -m venv` followed by `pip install` of the requested packages.
/// A half-created environment is left in place when a step fails.
pub fn create_environment(root: &Path, req: &CreateRequest) -> Result<TaskSuccess, VenvError> {
    let env_path = check_new_target(root, &req.name)?;

    let mut venv = Command::new(&req.python_path);
    venv.args(["-m", "venv"]);
    if req.system_site_packages {
        venv.arg("--system-site-packages");
    }
    if req.without_pip {
        venv.arg("--without-pip");
    }
    venv.arg(&env_path);
    run_checked(&mut venv, &req.python_path.display().to_string())?;

    let packages = req.package_list();
    if !packages.is_empty() {
        let pip = pip_executable(root, &req.name);
        log::info!("installing {} package(s) into '{}'", packages.len(), req.name);
        run_checked(
            Command::new(&pip).arg("install").args(&packages),
            &pip.display().to_string(),
        )?;
    }

    Ok(TaskSuccess::Created)
}

/// Copies `source` into the root path as `name`, then records a main file
/// in the sidecar if one of the usual entry points is present.
pub fn import_environment(
    root: &Path,
    source: &Path,
    name: &str,
) -> Result<TaskSuccess, VenvError> {
    let target = check_new_target(root, name)?;
    check_not_nested(root, source)?;

    copy_tree(source, &target)?;

    let main_file = MAIN_FILE_CANDIDATES
        .iter()
        .map(|candidate| target.join(candidate))
        .find(|p| p.is_file());

    if let Some(main) = &main_file {
        let sidecar = EnvSidecar {
            main_file: Some(main.clone()),
        };
        sidecar.save(&target)?;
        log::info!("recorded main file {} for '{}'", main.display(), name);
    }

    Ok(TaskSuccess::Imported {
        source: source.to_path_buf(),
        main_file,
    })
}

// Copying a directory into one of its own descendants never terminates
fn check_not_nested(root: &Path, source: &Path) -> Result<(), VenvError> {
    let source = source
        .canonicalize()
        .map_err(|e| VenvError::io(format!("failed to read {}", source.display()), e))?;
    if let Ok(root) = root.canonicalize() {
        if root.starts_with(&source) {
            return Err(VenvError::NestedImport(source));
        }
    }
    Ok(())
}

/// Recursive copy following symlinks. Partial copies are not rolled back.
pub fn copy_tree(source: &Path, target: &Path) -> Result<(), VenvError> {
    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.map_err(|e| {
            VenvError::io(format!("failed to walk {}", source.display()), e.into())
        })?;
        let rel = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let dest = target.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)
                .map_err(|e| VenvError::io(format!("failed to create {}", dest.display()), e))?;
        } else {
            fs::copy(entry.path(), &dest).map_err(|e| {
                VenvError::io(format!("failed to copy {}", entry.path().display()), e)
            })?;
        }
    }
    Ok(())
}

/// Removes `<root>/<name>` and everything below it.
pub fn delete_environment(root: &Path, name: &str) -> Result<TaskSuccess, VenvError> {
    let env_path = root.join(name);
    fs::remove_dir_all(&env_path)
        .map_err(|e| VenvError::io(format!("failed to delete {}", env_path.display()), e))?;
    Ok(TaskSuccess::Deleted)
}

/// Removes the source directory of a finished import.
pub fn delete_original(source: &Path) -> Result<TaskSuccess, VenvError> {
    fs::remove_dir_all(source).map_err(|e| {
        VenvError::io(
            format!("Could not delete original environment {}", source.display()),
            e,
        )
    })?;
    Ok(TaskSuccess::OriginalDeleted)
}

/// Checked on the UI thread before an activation task is dispatched.
pub fn require_activation_script(root: &Path, name: &str) -> Result<PathBuf, VenvError> {
    let script = activation_script(root, name);
    if !script.exists() {
        return Err(VenvError::ActivationScriptMissing(script));
    }
    Ok(script)
}

/// Opens a terminal with environment `name` activated, running its recorded
/// main file when there is one.
pub fn activate_environment(root: &Path, name: &str) -> Result<TaskSuccess, VenvError> {
    let script = require_activation_script(root, name)?;
    let main_file = EnvSidecar::load(&root.join(name))
        .and_then(|sidecar| sidecar.existing_main_file().map(Path::to_path_buf));

    let term = terminal::detect_terminal()?;
    let cmd = terminal::build_command(term, name, &script, main_file.as_deref());
    let mut child = terminal::launch(&cmd)?;

    // Reap the terminal whenever it closes; xterm stays in the foreground
    let reaper = std::thread::Builder::new()
        .name("terminal-reaper".to_string())
        .spawn(move || {
            let _ = child.wait();
        });
    if let Err(e) = reaper {
        log::warn!("could not watch terminal for '{}': {}", name, e);
    }

    Ok(TaskSuccess::Activated { main_file })
}
