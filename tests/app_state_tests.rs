//! Application state tests
//!
//! Drive `AppState` through its actions the way the widgets do, against
//! temporary environment roots, and check the list, status bar and dialogs.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use venv_manager::gui::env_scanner::scripts_dir_name;
use venv_manager::gui::{Action, AppState, Confirm, MessageLevel};
use venv_manager::models::{Settings, ThemeKind};

fn make_env(root: &Path, name: &str) -> PathBuf {
    let path = root.join(name);
    fs::create_dir_all(path.join(scripts_dir_name())).expect("mkdir env");
    path
}

/// Helper to create an app rooted at `root` that saves settings into `home`
fn create_test_app(root: &Path, home: &Path) -> AppState {
    let settings = Settings {
        venv_dir: root.to_path_buf(),
        ..Settings::default()
    };
    AppState::with_settings(settings, Some(home.join("settings.json")), None)
}

fn wait_idle(app: &mut AppState) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while app.in_flight() > 0 && Instant::now() < deadline {
        app.poll_tasks();
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(app.in_flight(), 0, "background work did not finish");
}

#[test]
fn test_startup_scan_lists_environments() {
    let root = TempDir::new().expect("root");
    let home = TempDir::new().expect("home");
    make_env(root.path(), "a");
    fs::create_dir(root.path().join("b")).expect("mkdir b");
    make_env(root.path(), "c");

    let app = create_test_app(root.path(), home.path());
    assert_eq!(app.envs(), &["a".to_string(), "c".to_string()]);
    assert_eq!(app.status(), "Found 2 virtual environments.");
}

#[test]
fn test_missing_root_reports_not_found_without_dialog() {
    let home = TempDir::new().expect("home");
    let missing = home.path().join("does-not-exist");

    let app = create_test_app(&missing, home.path());
    assert!(app.envs().is_empty());
    assert_eq!(
        app.status(),
        format!("Directory not found: {}", missing.display())
    );
    assert!(app.messages().is_empty());
}

#[test]
fn test_actions_need_a_selection() {
    let root = TempDir::new().expect("root");
    let home = TempDir::new().expect("home");
    make_env(root.path(), "a");

    let mut app = create_test_app(root.path(), home.path());
    app.perform(Action::Delete);

    let msg = app.messages().front().expect("dialog");
    assert_eq!(msg.title, "Selection Required");
    assert_eq!(msg.body, "Please select a virtual environment to delete");
    assert_eq!(msg.level, MessageLevel::Info);
    assert!(app.pending_confirm().is_none());
}

#[test]
fn test_create_with_taken_name_is_rejected_up_front() {
    let root = TempDir::new().expect("root");
    let home = TempDir::new().expect("home");
    make_env(root.path(), "taken");

    let mut app = create_test_app(root.path(), home.path());
    app.perform(Action::OpenCreate);
    {
        let form = app.create_form_mut().expect("form open");
        form.name = "taken".to_string();
        form.python_path = root.path().join("no-such-python").display().to_string();
    }
    app.perform(Action::SubmitCreate);

    assert_eq!(app.in_flight(), 0);
    let msg = app.messages().front().expect("error dialog");
    assert_eq!(msg.level, MessageLevel::Error);
    assert_eq!(msg.body, "Environment 'taken' already exists");
    // The form stays open so the name can be fixed
    assert!(app.create_form_mut().is_some());
}

#[test]
fn test_delete_flow_removes_environment() {
    let root = TempDir::new().expect("root");
    let home = TempDir::new().expect("home");
    make_env(root.path(), "keep");
    make_env(root.path(), "drop");

    let mut app = create_test_app(root.path(), home.path());
    let idx = app.envs().iter().position(|e| e == "drop").expect("listed");
    app.perform(Action::Select(idx));
    app.perform(Action::Delete);
    assert_eq!(
        app.pending_confirm(),
        Some(&Confirm::DeleteEnv("drop".to_string()))
    );

    app.perform(Action::ConfirmYes);
    wait_idle(&mut app);

    assert_eq!(app.envs(), &["keep".to_string()]);
    assert_eq!(app.status(), "Environment 'drop' deleted");
    assert!(!root.path().join("drop").exists());
}

#[test]
fn test_declining_delete_keeps_environment() {
    let root = TempDir::new().expect("root");
    let home = TempDir::new().expect("home");
    make_env(root.path(), "stay");

    let mut app = create_test_app(root.path(), home.path());
    app.perform(Action::Select(0));
    app.perform(Action::Delete);
    app.perform(Action::ConfirmNo);

    assert_eq!(app.in_flight(), 0);
    assert!(root.path().join("stay").exists());
}

#[test]
fn test_deleting_vanished_environment_reports_failure() {
    let root = TempDir::new().expect("root");
    let home = TempDir::new().expect("home");
    let ghost = make_env(root.path(), "ghost");

    let mut app = create_test_app(root.path(), home.path());
    app.perform(Action::Select(0));
    fs::remove_dir_all(&ghost).expect("remove behind the app's back");
    app.perform(Action::Delete);
    app.perform(Action::ConfirmYes);
    wait_idle(&mut app);

    let msg = app.messages().front().expect("error dialog");
    assert_eq!(msg.title, "Deletion Failed");
    assert_eq!(app.status(), "Environment deletion failed");
}

#[test]
fn test_second_action_on_busy_environment_is_refused() {
    let root = TempDir::new().expect("root");
    let home = TempDir::new().expect("home");
    make_env(root.path(), "web");

    let mut app = create_test_app(root.path(), home.path());
    app.perform(Action::Select(0));
    app.perform(Action::Delete);
    app.perform(Action::ConfirmYes);
    app.perform(Action::Delete);
    app.perform(Action::ConfirmYes);

    assert_eq!(app.in_flight(), 1);
    assert_eq!(app.status(), "'web' is busy with another operation");
    wait_idle(&mut app);
}

#[test]
fn test_import_flow_copies_and_offers_to_delete_original() {
    let root = TempDir::new().expect("root");
    let home = TempDir::new().expect("home");
    let outside = TempDir::new().expect("outside");
    let source = make_env(outside.path(), "legacy");
    fs::write(source.join("main.py"), "print('hi')").expect("write main");

    let mut app = create_test_app(root.path(), home.path());
    app.open_import_form(source.clone());
    assert_eq!(app.import_form_mut().expect("form").name, "legacy");
    app.import_form_mut().expect("form").name = "imported".to_string();
    app.perform(Action::SubmitImport);
    wait_idle(&mut app);

    assert_eq!(app.envs(), &["imported".to_string()]);
    assert_eq!(app.status(), "Environment imported as 'imported'");
    assert_eq!(
        app.pending_confirm(),
        Some(&Confirm::DeleteOriginal {
            source: source.clone(),
            name: "imported".to_string(),
        })
    );

    app.perform(Action::ConfirmYes);
    wait_idle(&mut app);
    assert!(!source.exists());
    assert_eq!(
        app.status(),
        "Original environment deleted. 'imported' imported successfully."
    );
}

#[test]
fn test_saved_settings_survive_restart() {
    let root = TempDir::new().expect("root");
    let home = TempDir::new().expect("home");

    let mut app = create_test_app(root.path(), home.path());
    app.perform(Action::SetTheme(ThemeKind::Dark));
    app.perform(Action::OpenColors);
    app.perform(Action::ApplyColors);
    app.perform(Action::SaveSettings);

    assert_eq!(
        app.messages().front().map(|m| m.title.as_str()),
        Some("Settings Saved")
    );
    assert_eq!(app.status(), "Settings saved");

    let reloaded = Settings::load_from(&home.path().join("settings.json"));
    assert_eq!(&reloaded, app.settings());
    assert_eq!(reloaded.theme, ThemeKind::Dark);
    let colors = reloaded.custom_colors.expect("custom colors saved");
    assert_eq!(colors["background"], "#333333");
}

#[test]
fn test_changing_directory_saves_and_rescans() {
    let root = TempDir::new().expect("root");
    let other = TempDir::new().expect("other root");
    let home = TempDir::new().expect("home");
    make_env(other.path(), "elsewhere");

    let mut app = create_test_app(root.path(), home.path());
    assert!(app.envs().is_empty());

    app.set_venv_dir(other.path().to_path_buf());
    assert_eq!(app.envs(), &["elsewhere".to_string()]);
    let reloaded = Settings::load_from(&home.path().join("settings.json"));
    assert_eq!(reloaded.venv_dir, other.path());
}

#[cfg(unix)]
#[test]
fn test_create_runs_venv_then_pip() {
    use std::os::unix::fs::PermissionsExt;

    let root = TempDir::new().expect("root");
    let home = TempDir::new().expect("home");
    let tools = TempDir::new().expect("tools");

    // Stand-in interpreter: records its arguments and lays out a bin/pip
    // that records its own
    let fake_python = tools.path().join("python");
    fs::write(
        &fake_python,
        "#!/bin/sh\n\
         for last; do :; done\n\
         echo \"$@\" > \"$last.args\"\n\
         mkdir -p \"$last/bin\"\n\
         printf '#!/bin/sh\\necho \"$@\" > \"%s/pip-args\"\\n' \"$last\" > \"$last/bin/pip\"\n\
         chmod +x \"$last/bin/pip\"\n",
    )
    .expect("write fake python");
    fs::set_permissions(&fake_python, fs::Permissions::from_mode(0o755)).expect("chmod");

    let mut app = create_test_app(root.path(), home.path());
    app.perform(Action::OpenCreate);
    {
        let form = app.create_form_mut().expect("form open");
        form.name = "fresh".to_string();
        form.python_path = fake_python.display().to_string();
        form.packages = "requests flask".to_string();
        form.system_site_packages = true;
    }
    app.perform(Action::SubmitCreate);
    wait_idle(&mut app);

    assert!(app.messages().is_empty(), "unexpected dialog: {:?}", app.messages());
    assert_eq!(app.envs(), &["fresh".to_string()]);
    assert_eq!(app.status(), "Environment 'fresh' created successfully");

    let venv_args = fs::read_to_string(root.path().join("fresh.args")).expect("venv args");
    assert!(venv_args.starts_with("-m venv --system-site-packages "));
    let pip_args =
        fs::read_to_string(root.path().join("fresh").join("pip-args")).expect("pip args");
    assert_eq!(pip_args.trim(), "install requests flask");
}

/// Imports `<root>/<source>` as `target` and answers Yes to deleting the original.
fn import_from_root_and_delete_original(
    app: &mut AppState,
    root: &Path,
    source: &str,
    target: &str,
) {
    app.open_import_form(root.join(source));
    app.import_form_mut().expect("form").name = target.to_string();
    app.perform(Action::SubmitImport);
    wait_idle(app);
    assert!(matches!(
        app.pending_confirm(),
        Some(Confirm::DeleteOriginal { .. })
    ));
    app.perform(Action::ConfirmYes);
}

#[test]
fn test_deleting_original_inside_root_holds_its_name() {
    let root = TempDir::new().expect("root");
    let home = TempDir::new().expect("home");
    make_env(root.path(), "a");

    let mut app = create_test_app(root.path(), home.path());
    import_from_root_and_delete_original(&mut app, root.path(), "a", "b");
    assert_eq!(app.in_flight(), 1);

    // The source is still listed until the removal reports back
    let idx = app.envs().iter().position(|e| e == "a").expect("listed");
    app.perform(Action::Select(idx));
    app.perform(Action::Delete);
    app.perform(Action::ConfirmYes);

    assert_eq!(app.in_flight(), 1);
    assert_eq!(app.status(), "'a' is busy with another operation");
    wait_idle(&mut app);
    assert!(app.messages().is_empty(), "unexpected dialog: {:?}", app.messages());
}

#[test]
fn test_deleting_original_inside_root_rescans() {
    let root = TempDir::new().expect("root");
    let home = TempDir::new().expect("home");
    make_env(root.path(), "a");

    let mut app = create_test_app(root.path(), home.path());
    import_from_root_and_delete_original(&mut app, root.path(), "a", "b");
    wait_idle(&mut app);

    assert!(!root.path().join("a").exists());
    assert_eq!(app.envs(), &["b".to_string()]);
    assert_eq!(
        app.status(),
        "Original environment deleted. 'b' imported successfully."
    );

    // The name is free again once the removal is done
    make_env(root.path(), "a");
    app.perform(Action::Refresh);
    let idx = app.envs().iter().position(|e| e == "a").expect("listed");
    app.perform(Action::Select(idx));
    app.perform(Action::Delete);
    app.perform(Action::ConfirmYes);
    wait_idle(&mut app);
    assert!(!root.path().join("a").exists());
}

#[test]
fn test_exit_waits_for_running_work() {
    let root = TempDir::new().expect("root");
    let home = TempDir::new().expect("home");
    let doomed = make_env(root.path(), "doomed");
    for i in 0..50 {
        fs::write(doomed.join(format!("file{}.txt", i)), "x").expect("write");
    }

    let mut app = create_test_app(root.path(), home.path());
    app.perform(Action::Select(0));
    app.perform(Action::Delete);
    app.perform(Action::ConfirmYes);
    eframe::App::on_exit(&mut app, None);

    assert!(!doomed.exists());
}
