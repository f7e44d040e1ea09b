//! Freehand drawing surface and its fullscreen window

mod raster;
pub mod window;

use thiserror::Error;

pub use raster::Canvas;
pub use window::present_canvas_window;

#[derive(Error, Debug)]
pub enum CanvasError {
    #[error("Failed to save canvas: {0}")]
    Save(#[from] image::ImageError),
}
