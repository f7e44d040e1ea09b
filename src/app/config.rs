//! Runtime configuration
//!
//! Compiled-in defaults for the recognition service, file locations and the
//! preview frame, with `TEXSNAP_*` environment overrides.

use log::warn;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.mathpix.com/v3/latex";
pub const DEFAULT_APP_ID: &str = "******";
pub const DEFAULT_APP_KEY: &str = "********************************";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Shipped icon and sample image
pub const DEFAULT_ASSETS_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets");
pub const SAMPLE_IMAGE: &str = "limit.jpg";
pub const SAMPLE_LATEX: &str = r"\lim_{x\rightarrow3}(\frac{x^{2}+9}{x-3})";

pub const CAPTURE_FILE: &str = "capture.jpg";
pub const CANVAS_FILE: &str = "canvas.jpg";
pub const PREVIEW_FILE: &str = "output.svg";

/// Icon looked up in the assets directory
pub const ICON_NAME: &str = "texsnap";

/// Fixed-size area an image or preview is fitted into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayFrame {
    pub width: i32,
    pub height: i32,
}

impl DisplayFrame {
    pub const PREVIEW: DisplayFrame = DisplayFrame {
        width: 578,
        height: 200,
    };

    /// Fit content of the given size into the frame, preserving aspect ratio.
    ///
    /// Wider-than-frame content is pinned to the frame width, everything else
    /// to the frame height. Returns `None` for degenerate sizes.
    pub fn fit(&self, width: f64, height: f64) -> Option<(i32, i32)> {
        if !(width > 0.0 && height > 0.0) {
            return None;
        }

        let frame_w = self.width as f64;
        let frame_h = self.height as f64;

        if width / height > frame_w / frame_h {
            let display_h = (frame_w * height / width) as i32;
            Some((self.width, display_h.max(1)))
        } else {
            let display_w = (frame_h * width / height) as i32;
            Some((display_w.max(1), self.height))
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Recognition endpoint receiving the image payload
    pub endpoint: String,
    pub app_id: String,
    pub app_key: String,
    pub timeout: Duration,
    /// Results below this confidence get an advisory
    pub confidence_threshold: f64,
    /// Directory receiving capture, canvas and preview intermediates
    pub work_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub sample_image: PathBuf,
    pub sample_latex: String,
    pub frame: DisplayFrame,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            app_id: DEFAULT_APP_ID.to_string(),
            app_key: DEFAULT_APP_KEY.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            confidence_threshold: LOW_CONFIDENCE_THRESHOLD,
            work_dir: PathBuf::from("."),
            assets_dir: PathBuf::from(DEFAULT_ASSETS_DIR),
            sample_image: Path::new(DEFAULT_ASSETS_DIR).join(SAMPLE_IMAGE),
            sample_latex: SAMPLE_LATEX.to_string(),
            frame: DisplayFrame::PREVIEW,
        }
    }
}

impl AppConfig {
    /// Defaults overridden by the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(endpoint) = lookup("TEXSNAP_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(app_id) = lookup("TEXSNAP_APP_ID") {
            config.app_id = app_id;
        }
        if let Some(app_key) = lookup("TEXSNAP_APP_KEY") {
            config.app_key = app_key;
        }
        if let Some(raw) = lookup("TEXSNAP_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.timeout = Duration::from_secs(secs),
                _ => warn!("Ignoring invalid TEXSNAP_TIMEOUT_SECS value {:?}", raw),
            }
        }
        if let Some(dir) = lookup("TEXSNAP_WORK_DIR") {
            config.work_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("TEXSNAP_ASSETS_DIR") {
            config.sample_image = Path::new(&dir).join(SAMPLE_IMAGE);
            config.assets_dir = PathBuf::from(dir);
        }

        config
    }

    pub fn capture_path(&self) -> PathBuf {
        self.work_dir.join(CAPTURE_FILE)
    }

    pub fn canvas_path(&self) -> PathBuf {
        self.work_dir.join(CANVAS_FILE)
    }

    pub fn preview_path(&self) -> PathBuf {
        self.work_dir.join(PREVIEW_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_fit_wide_content_pins_width() {
        let frame = DisplayFrame::PREVIEW;
        assert_eq!(frame.fit(1156.0, 100.0), Some((578, 50)));
    }

    #[test]
    fn test_fit_tall_content_pins_height() {
        let frame = DisplayFrame::PREVIEW;
        assert_eq!(frame.fit(100.0, 400.0), Some((50, 200)));
    }

    #[test]
    fn test_fit_matching_ratio_fills_frame() {
        let frame = DisplayFrame::PREVIEW;
        assert_eq!(frame.fit(289.0, 100.0), Some((578, 200)));
    }

    #[test]
    fn test_fit_keeps_aspect_ratio() {
        let frame = DisplayFrame::PREVIEW;
        let (w, h) = frame.fit(731.0, 211.0).unwrap();
        let expected = 731.0 / 211.0;
        let actual = w as f64 / h as f64;
        assert!((actual - expected).abs() / expected < 0.02);
        assert!(w <= frame.width && h <= frame.height);
    }

    #[test]
    fn test_fit_rejects_degenerate_sizes() {
        let frame = DisplayFrame::PREVIEW;
        assert_eq!(frame.fit(0.0, 10.0), None);
        assert_eq!(frame.fit(10.0, 0.0), None);
        assert_eq!(frame.fit(f64::NAN, 10.0), None);
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.capture_path(), PathBuf::from("./capture.jpg"));
        assert_eq!(config.preview_path(), PathBuf::from("./output.svg"));
        assert_eq!(config.sample_image, config.assets_dir.join(SAMPLE_IMAGE));
    }

    #[test]
    fn test_shipped_assets_load() {
        let config = AppConfig::default();
        assert!(config.assets_dir.join(format!("{}.svg", ICON_NAME)).is_file());

        let sample = image::open(&config.sample_image).unwrap().to_rgb8();
        let (width, height) = sample.dimensions();
        assert!(width > height);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TEXSNAP_ENDPOINT", "http://localhost:9000/latex"),
            ("TEXSNAP_APP_ID", "my-id"),
            ("TEXSNAP_APP_KEY", "my-key"),
            ("TEXSNAP_TIMEOUT_SECS", "5"),
            ("TEXSNAP_WORK_DIR", "/tmp/texsnap"),
            ("TEXSNAP_ASSETS_DIR", "/opt/texsnap"),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.endpoint, "http://localhost:9000/latex");
        assert_eq!(config.app_id, "my-id");
        assert_eq!(config.app_key, "my-key");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.canvas_path(), PathBuf::from("/tmp/texsnap/canvas.jpg"));
        assert_eq!(config.sample_image, PathBuf::from("/opt/texsnap/limit.jpg"));
    }

    #[test]
    fn test_invalid_timeout_keeps_default() {
        let config = AppConfig::from_lookup(|key| match key {
            "TEXSNAP_TIMEOUT_SECS" => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}
