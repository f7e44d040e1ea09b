use xmlwriter::{Indent, Options, XmlWriter};

use super::layout::{Item, LayoutBox};
use super::measure::InkBox;

const FONT_FAMILY: &str = "Latin Modern Math, STIX Two Math, Cambria Math, DejaVu Serif, serif";

/// A rendered SVG document with its intrinsic size
#[derive(Debug, Clone, PartialEq)]
pub struct Svg {
    pub markup: String,
    pub width: f64,
    pub height: f64,
}

/// Serialize a layout with `padding` around its estimated box
pub fn to_svg(layout: &LayoutBox, padding: f64) -> Svg {
    let view = InkBox {
        x: 0.0,
        y: 0.0,
        width: (layout.width + 2.0 * padding).ceil().max(1.0),
        height: (layout.height() + 2.0 * padding).ceil().max(1.0),
    };
    write_svg(layout, padding, view)
}

/// Serialize the same drawing as [`to_svg`], framed to a measured ink box
pub fn to_svg_framed(layout: &LayoutBox, padding: f64, ink: InkBox) -> Svg {
    let view = InkBox {
        x: ink.x - padding,
        y: ink.y - padding,
        width: (ink.width + 2.0 * padding).ceil().max(1.0),
        height: (ink.height + 2.0 * padding).ceil().max(1.0),
    };
    write_svg(layout, padding, view)
}

fn write_svg(layout: &LayoutBox, padding: f64, view: InkBox) -> Svg {
    let origin_x = padding;
    let baseline = padding + layout.ascent;

    let mut w = XmlWriter::new(Options {
        indent: Indent::None,
        ..Options::default()
    });
    w.start_element("svg");
    w.write_attribute("xmlns", "http://www.w3.org/2000/svg");
    w.write_attribute("width", &view.width);
    w.write_attribute("height", &view.height);
    w.write_attribute_fmt(
        "viewBox",
        format_args!("{} {} {} {}", view.x, view.y, view.width, view.height),
    );

    w.start_element("g");
    w.write_attribute("fill", "black");
    w.write_attribute("stroke", "none");
    w.write_attribute("font-family", FONT_FAMILY);

    for item in &layout.items {
        match item {
            Item::Glyph {
                x,
                y,
                text,
                size,
                italic,
            } => {
                w.start_element("text");
                w.write_attribute_fmt("x", format_args!("{:.2}", origin_x + x));
                w.write_attribute_fmt("y", format_args!("{:.2}", baseline + y));
                w.write_attribute_fmt("font-size", format_args!("{:.2}", size));
                if *italic {
                    w.write_attribute("font-style", "italic");
                }
                w.write_text(text);
                w.end_element();
            }
            Item::Rule {
                x,
                y,
                width,
                height,
            } => {
                w.start_element("rect");
                w.write_attribute_fmt("x", format_args!("{:.2}", origin_x + x));
                w.write_attribute_fmt("y", format_args!("{:.2}", baseline + y));
                w.write_attribute_fmt("width", format_args!("{:.2}", width));
                w.write_attribute_fmt("height", format_args!("{:.2}", height));
                w.end_element();
            }
            Item::Polyline { points, stroke } => {
                let points = points
                    .iter()
                    .map(|(px, py)| format!("{:.2},{:.2}", origin_x + px, baseline + py))
                    .collect::<Vec<_>>()
                    .join(" ");
                w.start_element("polyline");
                w.write_attribute("points", &points);
                w.write_attribute("fill", "none");
                w.write_attribute("stroke", "black");
                w.write_attribute_fmt("stroke-width", format_args!("{:.2}", stroke));
                w.write_attribute("stroke-linejoin", "round");
                w.end_element();
            }
        }
    }

    Svg {
        markup: w.end_document(),
        width: view.width,
        height: view.height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_layout_is_padding_only() {
        let svg = to_svg(&LayoutBox::default(), 4.0);
        assert_eq!(svg.width, 8.0);
        assert_eq!(svg.height, 8.0);
        assert!(svg.markup.starts_with("<svg"));
        assert!(svg.markup.ends_with("</svg>"));
    }

    #[test]
    fn test_glyph_is_placed_on_baseline() {
        let layout = LayoutBox {
            width: 20.0,
            ascent: 30.0,
            descent: 10.0,
            items: vec![Item::Glyph {
                x: 0.0,
                y: 0.0,
                text: "<".to_string(),
                size: 40.0,
                italic: true,
            }],
        };
        let svg = to_svg(&layout, 5.0);
        assert_eq!(svg.width, 30.0);
        assert_eq!(svg.height, 50.0);
        assert!(svg
            .markup
            .contains(r#"<text x="5.00" y="35.00" font-size="40.00" font-style="italic">&lt;</text>"#));
    }

    #[test]
    fn test_output_is_well_formed_xml() {
        let layout = LayoutBox {
            width: 10.0,
            ascent: 10.0,
            descent: 2.0,
            items: vec![
                Item::Rule {
                    x: 0.0,
                    y: -1.0,
                    width: 10.0,
                    height: 2.0,
                },
                Item::Polyline {
                    points: vec![(0.0, 0.0), (5.0, -5.0)],
                    stroke: 1.0,
                },
            ],
        };
        let svg = to_svg(&layout, 2.0);
        let doc = roxmltree::Document::parse(&svg.markup).unwrap();
        assert_eq!(doc.root_element().tag_name().name(), "svg");
        assert_eq!(doc.root_element().attribute("width"), Some("14"));
    }

    #[test]
    fn test_framed_view_box_follows_ink() {
        let layout = LayoutBox {
            width: 40.0,
            ascent: 30.0,
            descent: 10.0,
            items: vec![Item::Rule {
                x: 0.0,
                y: -1.0,
                width: 40.0,
                height: 2.0,
            }],
        };
        let ink = InkBox {
            x: 7.5,
            y: 36.0,
            width: 40.0,
            height: 2.0,
        };
        let svg = to_svg_framed(&layout, 4.0, ink);
        assert_eq!((svg.width, svg.height), (48.0, 10.0));

        let doc = roxmltree::Document::parse(&svg.markup).unwrap();
        assert_eq!(doc.root_element().attribute("viewBox"), Some("3.5 32 48 10"));
    }
}
