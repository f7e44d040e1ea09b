use image::{ImageFormat, Rgb, RgbImage};
use log::{debug, info};
use std::path::Path;

use super::CanvasError;

pub const PEN_WIDTH: f64 = 8.0;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// In-memory drawing surface: black round-capped strokes on white
pub struct Canvas {
    raster: RgbImage,
    pen_width: f64,
    last_point: Option<Point>,
    dirty: bool,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            raster: RgbImage::from_pixel(width.max(1), height.max(1), WHITE),
            pen_width: PEN_WIDTH,
            last_point: None,
            dirty: true,
        }
    }

    pub fn raster(&self) -> &RgbImage {
        &self.raster
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.raster.dimensions()
    }

    /// Reallocate a blank raster when the window size changes
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.raster.dimensions() != (width.max(1), height.max(1)) {
            debug!("Resizing canvas to {}x{}", width, height);
            *self = Self::new(width, height);
        }
    }

    /// Whether the raster changed since the last call
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub fn begin_stroke(&mut self, x: f64, y: f64) {
        let point = Point::new(x, y);
        self.draw_segment(point, point);
        self.last_point = Some(point);
    }

    /// Extend the current stroke by a segment to (`x`, `y`)
    pub fn extend_stroke(&mut self, x: f64, y: f64) {
        let point = Point::new(x, y);
        if let Some(last) = self.last_point {
            self.draw_segment(last, point);
            self.last_point = Some(point);
        }
    }

    pub fn end_stroke(&mut self, x: f64, y: f64) {
        self.extend_stroke(x, y);
        self.last_point = None;
    }

    pub fn clear(&mut self) {
        for pixel in self.raster.pixels_mut() {
            *pixel = WHITE;
        }
        self.last_point = None;
        self.dirty = true;
    }

    pub fn save(&self, path: &Path) -> Result<(), CanvasError> {
        self.raster.save_with_format(path, ImageFormat::Jpeg)?;
        let (width, height) = self.dimensions();
        info!("Saved {}x{} canvas to {:?}", width, height, path);
        Ok(())
    }

    /// Stamp a round-capped, anti-aliased line onto the raster
    fn draw_segment(&mut self, from: Point, to: Point) {
        let radius = self.pen_width / 2.0;
        let (width, height) = self.raster.dimensions();

        let min_x = (from.x.min(to.x) - radius - 1.0).floor().max(0.0) as u32;
        let min_y = (from.y.min(to.y) - radius - 1.0).floor().max(0.0) as u32;
        let max_x = ((from.x.max(to.x) + radius + 1.0).ceil().max(0.0) as u32).min(width);
        let max_y = ((from.y.max(to.y) + radius + 1.0).ceil().max(0.0) as u32).min(height);

        for py in min_y..max_y {
            for px in min_x..max_x {
                let distance = point_to_segment_distance(
                    px as f64 + 0.5,
                    py as f64 + 0.5,
                    from.x,
                    from.y,
                    to.x,
                    to.y,
                );
                let coverage = (radius + 0.5 - distance).clamp(0.0, 1.0);
                if coverage <= 0.0 {
                    continue;
                }
                let ink = (255.0 * (1.0 - coverage)).round() as u8;
                let pixel = self.raster.get_pixel_mut(px, py);
                for channel in pixel.0.iter_mut() {
                    *channel = (*channel).min(ink);
                }
            }
        }
        self.dirty = true;
    }
}

fn point_to_segment_distance(px: f64, py: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let dx = x2 - x1;
    let dy = y2 - y1;
    let length_sq = dx * dx + dy * dy;

    if length_sq == 0.0 {
        return ((px - x1).powi(2) + (py - y1).powi(2)).sqrt();
    }

    let t = (((px - x1) * dx + (py - y1) * dy) / length_sq).clamp(0.0, 1.0);
    let closest_x = x1 + t * dx;
    let closest_y = y1 + t * dy;

    ((px - closest_x).powi(2) + (py - closest_y).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_white(canvas: &Canvas) -> bool {
        canvas.raster().pixels().all(|p| *p == WHITE)
    }

    #[test]
    fn test_new_canvas_is_white() {
        let canvas = Canvas::new(20, 10);
        assert_eq!(canvas.dimensions(), (20, 10));
        assert!(is_white(&canvas));
    }

    #[test]
    fn test_stroke_inks_pixels_along_segment() {
        let mut canvas = Canvas::new(100, 40);
        canvas.begin_stroke(10.0, 20.0);
        canvas.extend_stroke(50.0, 20.0);
        canvas.end_stroke(90.0, 20.0);

        for x in [10, 30, 50, 70, 89] {
            assert_eq!(canvas.raster().get_pixel(x, 20), &Rgb([0, 0, 0]), "x = {}", x);
        }
        // Pen is 8 px wide, so rows well away from the line stay white
        assert_eq!(canvas.raster().get_pixel(50, 5), &WHITE);
        assert_eq!(canvas.raster().get_pixel(50, 35), &WHITE);
    }

    #[test]
    fn test_single_click_leaves_a_dot() {
        let mut canvas = Canvas::new(30, 30);
        canvas.begin_stroke(15.0, 15.0);
        canvas.end_stroke(15.0, 15.0);
        assert_eq!(canvas.raster().get_pixel(15, 15), &Rgb([0, 0, 0]));
        assert_eq!(canvas.raster().get_pixel(2, 2), &WHITE);
    }

    #[test]
    fn test_extend_without_stroke_does_nothing() {
        let mut canvas = Canvas::new(30, 30);
        canvas.extend_stroke(15.0, 15.0);
        assert!(is_white(&canvas));
    }

    #[test]
    fn test_strokes_off_canvas_are_clipped() {
        let mut canvas = Canvas::new(30, 30);
        canvas.begin_stroke(-50.0, -50.0);
        canvas.end_stroke(100.0, 100.0);
        assert_eq!(canvas.raster().get_pixel(15, 15), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_clear_restores_white() {
        let mut canvas = Canvas::new(30, 30);
        canvas.begin_stroke(5.0, 5.0);
        canvas.end_stroke(25.0, 25.0);
        assert!(!is_white(&canvas));

        canvas.take_dirty();
        canvas.clear();
        assert!(is_white(&canvas));
        assert!(canvas.take_dirty());
        assert!(!canvas.take_dirty());
    }

    #[test]
    fn test_resize_reallocates_only_on_change() {
        let mut canvas = Canvas::new(30, 30);
        canvas.begin_stroke(5.0, 5.0);
        canvas.resize(30, 30);
        assert!(!is_white(&canvas));

        canvas.resize(40, 20);
        assert_eq!(canvas.dimensions(), (40, 20));
        assert!(is_white(&canvas));
    }

    #[test]
    fn test_save_writes_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canvas.jpg");
        let mut canvas = Canvas::new(64, 32);
        canvas.begin_stroke(8.0, 16.0);
        canvas.end_stroke(56.0, 16.0);

        canvas.save(&path).unwrap();

        let saved = image::open(&path).unwrap().to_rgb8();
        assert_eq!(saved.dimensions(), (64, 32));
    }

    #[test]
    fn test_point_to_segment_distance() {
        assert_eq!(point_to_segment_distance(5.0, 3.0, 0.0, 0.0, 10.0, 0.0), 3.0);
        assert_eq!(point_to_segment_distance(13.0, 4.0, 0.0, 0.0, 10.0, 0.0), 5.0);
        assert_eq!(point_to_segment_distance(3.0, 4.0, 0.0, 0.0, 0.0, 0.0), 5.0);
    }
}
