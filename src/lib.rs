//! Desktop manager for Python virtual environments.
//!
//! The window itself lives in [`gui`]; [`models`] holds the settings document
//! and the messages exchanged with background workers.

pub mod error;
pub mod gui;
pub mod models;
