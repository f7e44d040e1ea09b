//! Ink bounds of a rendered preview, measured with the installed fonts

use log::{debug, warn};
use resvg::usvg;
use std::sync::{Arc, OnceLock};

/// Axis-aligned box in SVG user units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InkBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

fn font_database() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut fontdb = usvg::fontdb::Database::new();
            fontdb.load_system_fonts();
            debug!("Loaded {} font faces for measuring", fontdb.len());
            Arc::new(fontdb)
        })
        .clone()
}

/// Bounding box of everything `markup` paints, strokes included.
///
/// Returns `None` when the markup has text but no font is installed, since
/// the glyphs would be left out of the measurement.
pub fn ink_box(markup: &str) -> Option<InkBox> {
    let fontdb = font_database();
    if markup.contains("<text") && fontdb.len() == 0 {
        warn!("No fonts installed, using estimated preview size");
        return None;
    }

    let options = usvg::Options {
        fontdb,
        ..usvg::Options::default()
    };
    let tree = match usvg::Tree::from_str(markup, &options) {
        Ok(tree) => tree,
        Err(e) => {
            warn!("Failed to measure preview: {}", e);
            return None;
        }
    };
    if !tree.root().has_children() {
        return None;
    }

    let bounds = tree.root().abs_stroke_bounding_box();
    let ink = InkBox {
        x: bounds.x() as f64,
        y: bounds.y() as f64,
        width: bounds.width() as f64,
        height: bounds.height() as f64,
    };
    (ink.width > 0.0 && ink.height > 0.0).then_some(ink)
}
