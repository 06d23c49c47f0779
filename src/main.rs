// Application entry point for the Python Virtual Environment Manager GUI

use std::path::PathBuf;
use venv_manager::gui;

/// Looks for `icon.png` next to the executable, then in the working directory.
/// A missing or undecodable icon just leaves the platform default.
fn load_icon() -> Option<egui::IconData> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(PathBuf::from)) {
        candidates.push(dir.join("icon.png"));
    }
    candidates.push(PathBuf::from("icon.png"));

    let path = candidates.into_iter().find(|p| p.is_file())?;
    match image::open(&path) {
        Ok(img) => {
            let rgba = img.into_rgba8();
            let (width, height) = rgba.dimensions();
            Some(egui::IconData {
                rgba: rgba.into_raw(),
                width,
                height,
            })
        }
        Err(e) => {
            log::warn!("Could not set icon from {}: {}", path.display(), e);
            None
        }
    }
}

/// Entry point for the application.
/// Initializes logging, then opens the resizable main window.
fn main() -> eframe::Result<()> {
    // RUST_LOG overrides the default level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut viewport = egui::ViewportBuilder::default()
        .with_title("Python Virtual Environment Manager")
        .with_inner_size([600.0, 500.0])
        .with_min_inner_size([480.0, 380.0])
        .with_resizable(true);
    if let Some(icon) = load_icon() {
        viewport = viewport.with_icon(icon);
    }

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    log::info!("starting Python Virtual Environment Manager {}", env!("CARGO_PKG_VERSION"));
    eframe::run_native(
        "Python Virtual Environment Manager",
        options,
        Box::new(|cc| Ok(Box::new(gui::AppState::new(cc)))),
    )
}
