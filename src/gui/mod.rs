// GUI module organization and public exports

// Main application state and UI logic
mod app;
// Reusable UI components (buttons, cards, swatches)
mod components;
// Create / import / delete / activate work run off the UI thread
pub mod env_actions;
// Environment discovery under the root path
pub mod env_scanner;
// Terminal emulator invocation
pub mod terminal;
// Worker threads and the channel back to the UI
pub mod tasks;
// Palettes, custom colors and animations
pub mod theme;

// Export AppState for use in main.rs
pub use app::{Action, AppState, Confirm, CreateForm, ImportForm, MessageBox, MessageLevel, View};
// Export all component functions
pub use components::*;
