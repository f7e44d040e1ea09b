//! Capture module for grabbing a screen region
//!
//! The primary monitor is captured with xcap, then a fullscreen overlay lets
//! the user drag out the region that is saved for recognition.

pub mod overlay;
pub mod screen;
pub mod selection;

use thiserror::Error;

pub use overlay::present_capture_window;
pub use screen::capture_primary_monitor;
pub use selection::CaptureSession;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Failed to get monitors: {0}")]
    Monitors(String),

    #[error("No monitors available")]
    NoMonitor,

    #[error("Failed to capture screen: {0}")]
    Screen(String),

    #[error("Failed to save image: {0}")]
    Save(#[from] image::ImageError),
}
