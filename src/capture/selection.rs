//! Region selection over a captured screenshot

use gtk4 as gtk;
use image::{DynamicImage, ImageFormat, RgbaImage};
use log::{debug, info};
use std::path::Path;

use super::CaptureError;

/// A rectangular selection during capture
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct Selection {
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
}

impl Selection {
    /// Create a new selection with the given start point
    pub fn new(start_x: f64, start_y: f64) -> Self {
        Self {
            start_x,
            start_y,
            end_x: start_x,
            end_y: start_y,
        }
    }

    /// Update the end point of the selection
    pub fn update_end(&mut self, end_x: f64, end_y: f64) {
        self.end_x = end_x;
        self.end_y = end_y;
    }

    /// Normalized rectangle, at least one pixel in each dimension
    pub fn rectangle(&self) -> gtk::gdk::Rectangle {
        let x = self.start_x.min(self.end_x) as i32;
        let y = self.start_y.min(self.end_y) as i32;
        let w = ((self.start_x - self.end_x).abs() as i32).max(1);
        let h = ((self.start_y - self.end_y).abs() as i32).max(1);
        gtk::gdk::Rectangle::new(x, y, w, h)
    }
}

/// Mouse-driven state of the capture overlay
pub struct CaptureSession {
    screenshot: RgbaImage,
    selection: Option<Selection>,
    is_pressed: bool,
}

impl CaptureSession {
    pub fn new(screenshot: RgbaImage) -> Self {
        Self {
            screenshot,
            selection: None,
            is_pressed: false,
        }
    }

    pub fn screenshot(&self) -> &RgbaImage {
        &self.screenshot
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn is_pressed(&self) -> bool {
        self.is_pressed
    }

    /// Left button down: a new selection begins
    pub fn press(&mut self, x: f64, y: f64) {
        self.is_pressed = true;
        self.selection = Some(Selection::new(x, y));
    }

    /// Pointer moved while pressed: the selection grows
    pub fn drag_to(&mut self, x: f64, y: f64) {
        if !self.is_pressed {
            return;
        }
        if let Some(ref mut sel) = self.selection {
            sel.update_end(x, y);
        }
    }

    /// Button released: the selection is frozen
    pub fn release(&mut self, x: f64, y: f64) {
        self.drag_to(x, y);
        self.is_pressed = false;
    }

    /// Right click: forget the selection
    pub fn reset(&mut self) {
        debug!("Selection reset");
        self.is_pressed = false;
        self.selection = None;
    }

    /// Crop the selection out of the screenshot.
    ///
    /// `scale` converts widget coordinates into screenshot pixels.
    pub fn crop(&self, scale: f64) -> Option<RgbaImage> {
        let rect = self.selection?.rectangle();
        let img_w = self.screenshot.width() as i64;
        let img_h = self.screenshot.height() as i64;

        let x = ((rect.x() as f64 * scale) as i64).clamp(0, img_w - 1);
        let y = ((rect.y() as f64 * scale) as i64).clamp(0, img_h - 1);
        let w = ((rect.width() as f64 * scale) as i64).max(1).min(img_w - x);
        let h = ((rect.height() as f64 * scale) as i64).max(1).min(img_h - y);

        let cropped =
            image::imageops::crop_imm(&self.screenshot, x as u32, y as u32, w as u32, h as u32)
                .to_image();
        Some(cropped)
    }

    /// Save the cropped selection as JPEG. Returns `false` when nothing is selected.
    pub fn save(&self, path: &Path, scale: f64) -> Result<bool, CaptureError> {
        let Some(cropped) = self.crop(scale) else {
            return Ok(false);
        };

        DynamicImage::ImageRgba8(cropped)
            .to_rgb8()
            .save_with_format(path, ImageFormat::Jpeg)?;
        info!("Saved selection to {:?}", path);
        Ok(true)
    }
}
