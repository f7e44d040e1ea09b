//! Application module
//!
//! This module contains the configuration, key bindings and core state.

pub mod config;
pub mod shortcuts;
mod state;

pub use config::{AppConfig, DisplayFrame};
pub use shortcuts::{Action, ShortcutConfig};
pub use state::{AppState, PreviewImage, Status, TexOutcome};
