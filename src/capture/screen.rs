//! Screen capture module using xcap library
//!
//! Grabs the primary monitor as an `RgbaImage` and converts images into
//! GDK pixbufs for painting.

use gtk4 as gtk;
use image::{RgbImage, RgbaImage};
use log::{debug, warn};
use xcap::Monitor;

use super::CaptureError;

/// Capture the primary monitor, falling back to the first one
pub fn capture_primary_monitor() -> Result<RgbaImage, CaptureError> {
    let monitors = Monitor::all().map_err(|e| CaptureError::Monitors(e.to_string()))?;

    let monitor = monitors
        .iter()
        .find(|m| m.is_primary().unwrap_or(false))
        .or(monitors.first())
        .ok_or(CaptureError::NoMonitor)?;

    let image = monitor
        .capture_image()
        .map_err(|e| CaptureError::Screen(e.to_string()))?;
    debug!("Captured {}x{} screenshot", image.width(), image.height());

    if image.width() == 0 || image.height() == 0 {
        warn!("Monitor returned an empty screenshot");
        return Err(CaptureError::Screen("empty image".to_string()));
    }

    Ok(image)
}

/// Convert an RGBA image to a GDK Pixbuf
pub fn rgba_to_pixbuf(image: &RgbaImage) -> gtk::gdk_pixbuf::Pixbuf {
    let width = image.width() as i32;
    let height = image.height() as i32;
    let stride = width * 4; // RGBA = 4 bytes per pixel
    let bytes = gtk::glib::Bytes::from(image.as_raw().as_slice());

    gtk::gdk_pixbuf::Pixbuf::from_bytes(
        &bytes,
        gtk::gdk_pixbuf::Colorspace::Rgb,
        true, // has_alpha
        8,    // bits_per_sample
        width,
        height,
        stride,
    )
}

/// Convert an RGB image to a GDK Pixbuf
pub fn rgb_to_pixbuf(image: &RgbImage) -> gtk::gdk_pixbuf::Pixbuf {
    let width = image.width() as i32;
    let height = image.height() as i32;
    let stride = width * 3;
    let bytes = gtk::glib::Bytes::from(image.as_raw().as_slice());

    gtk::gdk_pixbuf::Pixbuf::from_bytes(
        &bytes,
        gtk::gdk_pixbuf::Colorspace::Rgb,
        false,
        8,
        width,
        height,
        stride,
    )
}
