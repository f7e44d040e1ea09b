//! LaTeX validation and preview rendering
//!
//! Formulas are parsed by `latex2mathml`; the MathML tree is laid out by
//! [`layout`], serialized to SVG by [`svg`] and framed to the ink box that
//! [`measure`] finds with the installed fonts.

pub mod layout;
pub mod measure;
pub mod svg;

use latex2mathml::{latex_to_mathml, DisplayStyle};
use log::debug;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use svg::Svg;

const PADDING: f64 = 8.0;

/// latex2mathml reports most errors inline instead of failing
const PARSE_ERROR_MARKER: &str = "[PARSE ERROR";

const TOKEN_ELEMENTS: [&str; 5] = ["mi", "mn", "mo", "mtext", "ms"];

#[derive(Error, Debug)]
pub enum TexError {
    /// The formula is not valid LaTeX
    #[error("Invalid TeX syntax: {0}")]
    Syntax(String),

    /// The parser produced markup the layout step cannot read
    #[error("Failed to lay out formula: {0}")]
    Render(#[from] roxmltree::Error),

    #[error("Failed to write preview: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse an inline formula, returning well-formed MathML
pub fn validate(latex: &str) -> Result<String, TexError> {
    let mathml = latex_to_mathml(latex, DisplayStyle::Inline)
        .map_err(|e| TexError::Syntax(format!("{:?}", e)))?;

    if let Some(start) = mathml.find(PARSE_ERROR_MARKER) {
        let message = &mathml[start..];
        let end = message.find("</").unwrap_or(message.len());
        return Err(TexError::Syntax(message[..end].to_string()));
    }
    if mathml.contains("<merror") {
        return Err(TexError::Syntax("merror in output".to_string()));
    }

    Ok(escape_token_text(&mathml))
}

/// Lay out and serialize a formula
pub fn render_svg(latex: &str) -> Result<Svg, TexError> {
    let mathml = validate(latex)?;
    let doc = roxmltree::Document::parse(&mathml)?;
    let layout = layout::layout_node(doc.root_element(), layout::BASE_SIZE);

    let estimate = svg::to_svg(&layout, PADDING);
    if layout.is_empty() {
        return Ok(estimate);
    }
    match measure::ink_box(&estimate.markup) {
        Some(ink) => Ok(svg::to_svg_framed(&layout, PADDING, ink)),
        None => Ok(estimate),
    }
}

/// Escape the text of token elements.
///
/// latex2mathml copies operators such as `<` and `&` verbatim, which no XML
/// parser accepts.
fn escape_token_text(mathml: &str) -> String {
    let mut out = String::with_capacity(mathml.len());
    let mut rest = mathml;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(tag_end) = tail.find('>') else {
            out.push_str(tail);
            return out;
        };
        let tag = &tail[..=tag_end];
        out.push_str(tag);
        rest = &tail[tag_end + 1..];

        if let Some(name) = token_name(tag) {
            let close = format!("</{}>", name);
            if let Some(end) = rest.find(&close) {
                escape_text_into(&rest[..end], &mut out);
                out.push_str(&close);
                rest = &rest[end + close.len()..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn token_name(tag: &str) -> Option<&str> {
    if tag.starts_with("</") || tag.ends_with("/>") {
        return None;
    }
    let name = tag[1..]
        .split(|c: char| c.is_whitespace() || c == '>')
        .next()?;
    TOKEN_ELEMENTS.contains(&name).then_some(name)
}

fn escape_text_into(text: &str, out: &mut String) {
    for (i, c) in text.char_indices() {
        match c {
            '<' => out.push_str("&lt;"),
            '&' if !starts_with_reference(&text[i..]) => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
}

/// Whether `text` opens with a character reference or a predefined entity
fn starts_with_reference(text: &str) -> bool {
    let Some(end) = text.find(';') else {
        return false;
    };
    let name = &text[1..end];
    if let Some(hex) = name.strip_prefix("#x") {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    if let Some(dec) = name.strip_prefix('#') {
        return !dec.is_empty() && dec.chars().all(|c| c.is_ascii_digit());
    }
    matches!(name, "amp" | "lt" | "gt" | "quot" | "apos")
}

/// A preview written to disk
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPreview {
    pub path: PathBuf,
    pub width: f64,
    pub height: f64,
}

/// Render a formula and write it to `path`
pub fn render_preview(latex: &str, path: &Path) -> Result<RenderedPreview, TexError> {
    let svg = render_svg(latex)?;
    std::fs::write(path, svg.markup.as_bytes())?;
    debug!(
        "Wrote {}x{} preview for {:?} to {:?}",
        svg.width, svg.height, latex, path
    );

    Ok(RenderedPreview {
        path: path.to_path_buf(),
        width: svg.width,
        height: svg.height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::SAMPLE_LATEX;

    #[test]
    fn test_validate_accepts_well_formed() {
        assert!(validate(r"\frac{x^{2}+9}{x-3}").is_ok());
        assert!(validate(SAMPLE_LATEX).is_ok());
    }

    #[test]
    fn test_validate_rejects_unbalanced_group() {
        assert!(matches!(validate(r"\frac{x"), Err(TexError::Syntax(_))));
        assert!(matches!(validate("x^{2"), Err(TexError::Syntax(_))));
    }

    #[test]
    fn test_validate_rejects_inline_parse_errors() {
        for latex in [r"\", r"\frac", "x^", r"\foo", "}"] {
            match validate(latex) {
                Err(TexError::Syntax(_)) => {}
                other => panic!("{:?} should be rejected, got {:?}", latex, other),
            }
        }
    }

    #[test]
    fn test_relations_and_ampersand_render() {
        for latex in ["x<y", "a<b", r"a\&b"] {
            let mathml = validate(latex).unwrap();
            assert!(roxmltree::Document::parse(&mathml).is_ok(), "{}", mathml);
            assert!(render_svg(latex).is_ok());
        }
    }

    #[test]
    fn test_escape_token_text() {
        assert_eq!(escape_token_text("<mo><</mo>"), "<mo>&lt;</mo>");
        assert_eq!(
            escape_token_text(r#"<mi mathvariant="normal">&</mi>"#),
            r#"<mi mathvariant="normal">&amp;</mi>"#
        );
        assert_eq!(escape_token_text("<mo>&amp;</mo>"), "<mo>&amp;</mo>");
        assert_eq!(escape_token_text("<mo>&#x2061;</mo>"), "<mo>&#x2061;</mo>");
        assert_eq!(
            escape_token_text("<mrow><mi>x</mi><mspace width=\"1em\"/></mrow>"),
            "<mrow><mi>x</mi><mspace width=\"1em\"/></mrow>"
        );
    }

    #[test]
    fn test_sample_renders_wider_than_tall() {
        let svg = render_svg(SAMPLE_LATEX).unwrap();
        assert!(svg.width > svg.height);
        assert!(svg.markup.contains("lim"));
    }

    #[test]
    fn test_render_preview_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.svg");

        let preview = render_preview(r"\sqrt{a^{2}+b^{2}}", &path).unwrap();

        assert_eq!(preview.path, path);
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<svg"));
        assert!(written.contains(&format!(r#"width="{}""#, preview.width)));
    }

    #[test]
    fn test_render_preview_reports_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("output.svg");
        assert!(matches!(render_preview("x", &path), Err(TexError::Io(_))));
    }
}
