use gtk4::gdk;
use gtk4::prelude::*;
use log::info;

/// How copied TeX is wrapped for pasting into a document
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TexDelimiter {
    Raw,
    Inline,
    Block,
}

impl TexDelimiter {
    pub fn marker(&self) -> &'static str {
        match self {
            TexDelimiter::Raw => "",
            TexDelimiter::Inline => "$",
            TexDelimiter::Block => "$$",
        }
    }

    pub fn wrap(&self, tex: &str) -> String {
        let marker = self.marker();
        format!("{marker}{tex}{marker}")
    }
}

pub struct ClipboardManager {
    display: gdk::Display,
}

impl ClipboardManager {
    pub fn from_widget(widget: &impl IsA<gtk4::Widget>) -> Self {
        Self {
            display: widget.display(),
        }
    }

    /// Put `tex` on the clipboard wrapped in `delimiter`, returning what was copied
    pub fn copy_tex(&self, tex: &str, delimiter: TexDelimiter) -> String {
        let text = delimiter.wrap(tex);
        self.display.clipboard().set_text(&text);
        info!("Copied {:?} TeX to clipboard", delimiter);
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_wraps_in_double_dollars() {
        assert_eq!(TexDelimiter::Block.wrap(r"\frac{1}{2}"), r"$$\frac{1}{2}$$");
    }

    #[test]
    fn test_inline_wraps_in_single_dollars() {
        assert_eq!(TexDelimiter::Inline.wrap("x^{2}"), "$x^{2}$");
    }

    #[test]
    fn test_raw_is_unchanged() {
        assert_eq!(TexDelimiter::Raw.wrap("a+b"), "a+b");
        assert_eq!(TexDelimiter::Raw.wrap(""), "");
    }
}
