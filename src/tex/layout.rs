//! Box layout of a MathML tree.
//!
//! Every node becomes a [`LayoutBox`] whose origin sits on the baseline at its
//! left edge; `y` grows downwards like SVG. Glyph metrics are approximations
//! in em units, which is enough for a preview.

use roxmltree::Node;

/// Font size of top-level glyphs, in SVG user units
pub const BASE_SIZE: f64 = 40.0;

const SCRIPT_SCALE: f64 = 0.7;
const FRACTION_SCALE: f64 = 0.8;
const MIN_SIZE: f64 = 10.0;

const ASCENT: f64 = 0.72;
const DESCENT: f64 = 0.22;

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Glyph {
        x: f64,
        y: f64,
        text: String,
        size: f64,
        italic: bool,
    },
    Rule {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Polyline {
        points: Vec<(f64, f64)>,
        stroke: f64,
    },
}

impl Item {
    fn translate(&mut self, dx: f64, dy: f64) {
        match self {
            Item::Glyph { x, y, .. } | Item::Rule { x, y, .. } => {
                *x += dx;
                *y += dy;
            }
            Item::Polyline { points, .. } => {
                for point in points.iter_mut() {
                    point.0 += dx;
                    point.1 += dy;
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutBox {
    pub width: f64,
    pub ascent: f64,
    pub descent: f64,
    pub items: Vec<Item>,
}

impl LayoutBox {
    pub fn height(&self) -> f64 {
        self.ascent + self.descent
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn space(width: f64) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    fn glyphs(text: &str, size: f64, italic: bool) -> Self {
        let width: f64 = text.chars().map(advance).sum::<f64>() * size;
        let scale = if text.chars().any(is_large_operator) {
            1.3
        } else {
            1.0
        };
        Self {
            width,
            ascent: ASCENT * size * scale,
            descent: DESCENT * size * scale,
            items: vec![Item::Glyph {
                x: 0.0,
                y: 0.0,
                text: text.to_string(),
                size,
                italic,
            }],
        }
    }

    /// Place `other` with its origin at (`dx`, `dy`) relative to ours
    fn place(&mut self, other: LayoutBox, dx: f64, dy: f64) {
        self.ascent = self.ascent.max(other.ascent - dy);
        self.descent = self.descent.max(other.descent + dy);
        self.width = self.width.max(dx + other.width);
        self.items.extend(other.items.into_iter().map(|mut item| {
            item.translate(dx, dy);
            item
        }));
    }

    /// Append `other` after the current width on the same baseline
    fn push(&mut self, other: LayoutBox) {
        let dx = self.width;
        self.place(other, dx, 0.0);
    }
}

/// Approximate advance width of a character, in em
fn advance(c: char) -> f64 {
    match c {
        ' ' => 0.25,
        'i' | 'j' | 'l' | 't' | 'f' | 'r' => 0.32,
        'm' | 'w' => 0.75,
        'a'..='z' | '0'..='9' => 0.5,
        'A'..='Z' => 0.7,
        '(' | ')' | '[' | ']' | '{' | '}' | '|' | ',' | '.' | ';' | ':' | '!' | '\'' => 0.33,
        c if is_large_operator(c) => 1.0,
        c if is_spaced_operator(c) => 0.78,
        _ => 0.6,
    }
}

fn is_large_operator(c: char) -> bool {
    matches!(c, '∑' | '∏' | '∐' | '∫' | '∬' | '∭' | '∮' | '⋃' | '⋂')
}

fn is_spaced_operator(c: char) -> bool {
    matches!(
        c,
        '+' | '-'
            | '−'
            | '='
            | '<'
            | '>'
            | '≤'
            | '≥'
            | '≠'
            | '≈'
            | '≡'
            | '∼'
            | '×'
            | '÷'
            | '±'
            | '∓'
            | '·'
            | '→'
            | '←'
            | '↔'
            | '⇒'
            | '⇐'
            | '⇔'
            | '∈'
            | '∉'
            | '⊂'
            | '⊆'
            | '∪'
            | '∩'
    )
}

fn is_fence(text: &str) -> bool {
    matches!(
        text,
        "(" | ")" | "[" | "]" | "{" | "}" | "|" | "‖" | "⟨" | "⟩" | "⌊" | "⌋" | "⌈" | "⌉"
    )
}

fn shrink(size: f64, factor: f64) -> f64 {
    (size * factor).max(MIN_SIZE)
}

fn token_text(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}

fn element_children<'a, 'input>(node: Node<'a, 'input>) -> Vec<Node<'a, 'input>> {
    node.children()
        .filter(|n| n.is_element() && n.tag_name().name() != "annotation")
        .collect()
}

/// Parse an `<mspace width="..">` length into user units
fn parse_length(value: &str, size: f64) -> f64 {
    let value = value.trim();
    let (number, unit) = value
        .find(|c: char| c.is_ascii_alphabetic() || c == '%')
        .map(|idx| value.split_at(idx))
        .unwrap_or((value, ""));
    let number: f64 = number.trim().parse().unwrap_or(0.0);
    match unit {
        "em" | "" => number * size,
        "ex" => number * size * 0.43,
        "px" | "pt" => number * size / 16.0,
        _ => 0.0,
    }
}

pub fn layout_node(node: Node, size: f64) -> LayoutBox {
    match node.tag_name().name() {
        "mi" => {
            let text = token_text(node);
            let normal = node.attribute("mathvariant") == Some("normal");
            let italic = !normal
                && text.chars().count() == 1
                && text.chars().all(|c| c.is_alphabetic());
            LayoutBox::glyphs(&text, size, italic)
        }
        "mn" | "mtext" | "ms" => LayoutBox::glyphs(&token_text(node), size, false),
        "mo" => layout_operator(node, size),
        "mspace" => LayoutBox::space(
            node.attribute("width")
                .map(|w| parse_length(w, size))
                .unwrap_or(0.0),
        ),
        "msup" | "msub" | "msubsup" => layout_scripts(node, size),
        "munder" | "mover" | "munderover" => layout_limits(node, size),
        "mfrac" => layout_fraction(node, size),
        "msqrt" => layout_sqrt(layout_row(&element_children(node), size), size),
        "mroot" => layout_root(node, size),
        "mtable" => layout_table(node, size),
        "mphantom" => {
            let mut phantom = layout_row(&element_children(node), size);
            phantom.items.clear();
            phantom
        }
        _ => layout_row(&element_children(node), size),
    }
}

fn layout_operator(node: Node, size: f64) -> LayoutBox {
    let text = token_text(node);
    let spaced = text.chars().count() == 1 && text.chars().all(is_spaced_operator);
    let glyph = LayoutBox::glyphs(&text, size, false);

    if spaced && node.attribute("form") != Some("prefix") {
        let pad = 0.22 * size;
        let mut out = LayoutBox::space(pad);
        out.push(glyph);
        out.width += pad;
        out
    } else if text == "," {
        let mut out = glyph;
        out.width += 0.16 * size;
        out
    } else {
        glyph
    }
}

fn is_stretchy_fence(node: Node) -> bool {
    node.tag_name().name() == "mo"
        && node.attribute("stretchy") != Some("false")
        && is_fence(&token_text(node))
}

/// Lay out children left to right; fences grow to the height of the row
fn layout_row(children: &[Node], size: f64) -> LayoutBox {
    let boxes: Vec<Option<LayoutBox>> = children
        .iter()
        .map(|child| {
            if is_stretchy_fence(*child) {
                None
            } else {
                Some(layout_node(*child, size))
            }
        })
        .collect();

    let content_ascent = boxes
        .iter()
        .flatten()
        .map(|b| b.ascent)
        .fold(ASCENT * size, f64::max);
    let content_descent = boxes
        .iter()
        .flatten()
        .map(|b| b.descent)
        .fold(DESCENT * size, f64::max);

    let mut row = LayoutBox::default();
    for (child, laid_out) in children.iter().zip(boxes) {
        match laid_out {
            Some(b) => row.push(b),
            None => {
                let needed = (content_ascent + content_descent) / (ASCENT + DESCENT);
                let fence_size = if needed > size * 1.01 { needed } else { size };
                let fence = LayoutBox::glyphs(&token_text(*child), fence_size, false);
                // Centre the fence on the content
                let content_mid = (content_descent - content_ascent) / 2.0;
                let fence_mid = (DESCENT - ASCENT) * fence_size / 2.0;
                let dx = row.width;
                row.place(fence, dx, content_mid - fence_mid);
            }
        }
    }
    row
}

fn layout_scripts(node: Node, size: f64) -> LayoutBox {
    let children = element_children(node);
    let kind = node.tag_name().name();
    let script_size = shrink(size, SCRIPT_SCALE);

    let mut out = children
        .first()
        .map(|base| layout_node(*base, size))
        .unwrap_or_default();
    let base_ascent = out.ascent;
    let base_descent = out.descent;
    let x = out.width + 0.05 * size;

    let (sub, sup) = match kind {
        "msub" => (children.get(1), None),
        "msup" => (None, children.get(1)),
        _ => (children.get(1), children.get(2)),
    };

    if let Some(sub) = sub {
        let sub_box = layout_node(*sub, script_size);
        let dy = (0.22 * size).max(base_descent + 0.5 * sub_box.ascent - 0.2 * size);
        out.place(sub_box, x, dy);
    }
    if let Some(sup) = sup {
        let sup_box = layout_node(*sup, script_size);
        let dy = (0.45 * size).max(base_ascent - 0.5 * sup_box.ascent);
        out.place(sup_box, x, -dy);
    }
    out
}

fn layout_limits(node: Node, size: f64) -> LayoutBox {
    let children = element_children(node);
    let kind = node.tag_name().name();
    let accent = node.attribute("accent") == Some("true");
    let limit_size = if accent { size } else { shrink(size, SCRIPT_SCALE) };
    let gap = 0.08 * size;

    let base = children
        .first()
        .map(|b| layout_node(*b, size))
        .unwrap_or_default();

    let (under, over) = match kind {
        "munder" => (children.get(1), None),
        "mover" => (None, children.get(1)),
        _ => (children.get(1), children.get(2)),
    };
    let under = under.map(|n| layout_node(*n, limit_size));
    let over = over.map(|n| layout_node(*n, limit_size));

    let width = [
        Some(base.width),
        under.as_ref().map(|b| b.width),
        over.as_ref().map(|b| b.width),
    ]
    .into_iter()
    .flatten()
    .fold(0.0, f64::max);

    let base_ascent = base.ascent;
    let base_descent = base.descent;
    let mut out = LayoutBox::space(width);
    out.place(base.clone(), (width - base.width) / 2.0, 0.0);

    if let Some(under) = under {
        let dy = base_descent + gap + under.ascent;
        out.place(under.clone(), (width - under.width) / 2.0, dy);
    }
    if let Some(over) = over {
        let gap = if accent { -0.25 * size } else { gap };
        let dy = base_ascent + gap + over.descent;
        out.place(over.clone(), (width - over.width) / 2.0, -dy);
    }
    out
}

fn layout_fraction(node: Node, size: f64) -> LayoutBox {
    let children = element_children(node);
    let part_size = shrink(size, FRACTION_SCALE);
    let numerator = children
        .first()
        .map(|n| layout_node(*n, part_size))
        .unwrap_or_default();
    let denominator = children
        .get(1)
        .map(|n| layout_node(*n, part_size))
        .unwrap_or_default();

    let thickness = match node.attribute("linethickness") {
        Some(value) if parse_length(value, size) == 0.0 => 0.0,
        _ => (0.05 * size).max(1.0),
    };
    let axis = -0.25 * size;
    let gap = 0.12 * size;
    let pad = 0.1 * size;
    let width = numerator.width.max(denominator.width) + 2.0 * pad;

    let mut out = LayoutBox::space(width);
    let num_dy = axis - thickness / 2.0 - gap - numerator.descent;
    let den_dy = axis + thickness / 2.0 + gap + denominator.ascent;
    let num_width = numerator.width;
    let den_width = denominator.width;
    out.place(numerator, (width - num_width) / 2.0, num_dy);
    out.place(denominator, (width - den_width) / 2.0, den_dy);

    if thickness > 0.0 {
        out.items.push(Item::Rule {
            x: pad / 2.0,
            y: axis - thickness / 2.0,
            width: width - pad,
            height: thickness,
        });
    }
    out
}

fn layout_sqrt(content: LayoutBox, size: f64) -> LayoutBox {
    let stroke = (0.05 * size).max(1.0);
    let radical_width = 0.55 * size;
    let top = -(content.ascent + 0.15 * size);
    let bottom = content.descent;
    let mid = (top + bottom) / 2.0;
    let end = radical_width + content.width + 0.1 * size;

    let mut out = LayoutBox::space(end);
    out.ascent = -top + stroke;
    out.place(content, radical_width + 0.05 * size, 0.0);
    out.items.push(Item::Polyline {
        points: vec![
            (0.0, mid + 0.1 * size),
            (0.15 * size, mid),
            (0.3 * size, bottom),
            (radical_width, top),
            (end, top),
        ],
        stroke,
    });
    out
}

fn layout_root(node: Node, size: f64) -> LayoutBox {
    let children = element_children(node);
    let base = children
        .first()
        .map(|n| layout_node(*n, size))
        .unwrap_or_default();
    let index = children
        .get(1)
        .map(|n| layout_node(*n, shrink(size, 0.5)));

    let radical = layout_sqrt(base, size);
    match index {
        Some(index) => {
            let shift = (index.width - 0.25 * size).max(0.0);
            let lift = radical.ascent * 0.45;
            let mut out = LayoutBox::default();
            out.place(index, 0.0, -lift);
            out.place(radical, shift, 0.0);
            out
        }
        None => radical,
    }
}

fn layout_table(node: Node, size: f64) -> LayoutBox {
    let rows: Vec<Vec<LayoutBox>> = element_children(node)
        .into_iter()
        .map(|row| {
            let cells = if row.tag_name().name() == "mtr" {
                element_children(row)
            } else {
                vec![row]
            };
            cells
                .into_iter()
                .map(|cell| layout_node(cell, size))
                .collect()
        })
        .collect();

    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut column_widths = vec![0.0f64; columns];
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            column_widths[i] = column_widths[i].max(cell.width);
        }
    }

    let column_gap = 0.8 * size;
    let row_gap = 0.3 * size;
    let row_metrics: Vec<(f64, f64)> = rows
        .iter()
        .map(|row| {
            row.iter().fold((ASCENT * size, DESCENT * size), |(a, d), cell| {
                (a.max(cell.ascent), d.max(cell.descent))
            })
        })
        .collect();
    let total_height: f64 = row_metrics.iter().map(|(a, d)| a + d).sum::<f64>()
        + row_gap * rows.len().saturating_sub(1) as f64;

    // Centre the table on the math axis
    let mut y = -0.25 * size - total_height / 2.0;
    let mut out = LayoutBox::default();
    for (row, (ascent, descent)) in rows.into_iter().zip(row_metrics) {
        let baseline = y + ascent;
        let mut x = 0.0;
        for (i, cell) in row.into_iter().enumerate() {
            let cell_width = cell.width;
            out.place(cell, x + (column_widths[i] - cell_width) / 2.0, baseline);
            x += column_widths[i] + column_gap;
        }
        y = baseline + descent + row_gap;
    }
    out.width = column_widths.iter().sum::<f64>()
        + column_gap * columns.saturating_sub(1) as f64;
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(markup: &str) -> LayoutBox {
        let doc = roxmltree::Document::parse(markup).unwrap();
        layout_node(doc.root_element(), BASE_SIZE)
    }

    fn glyph_texts(layout: &LayoutBox) -> Vec<String> {
        layout
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Glyph { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_row_concatenates_horizontally() {
        let single = layout("<math><mi>x</mi></math>");
        let row = layout("<math><mrow><mi>x</mi><mn>2</mn></mrow></math>");
        assert_eq!(glyph_texts(&row), vec!["x", "2"]);
        assert!(row.width > single.width);
    }

    #[test]
    fn test_single_letter_identifiers_are_italic() {
        let layout = layout("<math><mi>x</mi><mi>sin</mi></math>");
        let italics: Vec<bool> = layout
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Glyph { italic, .. } => Some(*italic),
                _ => None,
            })
            .collect();
        assert_eq!(italics, vec![true, false]);
    }

    #[test]
    fn test_binary_operator_is_padded() {
        let bare = layout("<math><mi>a</mi><mi>b</mi></math>");
        let sum = layout("<math><mi>a</mi><mo>+</mo><mi>b</mi></math>");
        assert!(sum.width > bare.width + 0.78 * BASE_SIZE);
    }

    #[test]
    fn test_superscript_is_raised_and_smaller() {
        let layout = layout("<math><msup><mi>x</mi><mn>2</mn></msup></math>");
        match &layout.items[1] {
            Item::Glyph { y, size, .. } => {
                assert!(*y < 0.0);
                assert!(*size < BASE_SIZE);
            }
            other => panic!("unexpected item {:?}", other),
        }
        assert!(layout.ascent > ASCENT * BASE_SIZE);
    }

    #[test]
    fn test_fraction_stacks_around_rule() {
        let layout = layout("<math><mfrac><mi>a</mi><mi>b</mi></mfrac></math>");
        let rule_y = layout
            .items
            .iter()
            .find_map(|item| match item {
                Item::Rule { y, .. } => Some(*y),
                _ => None,
            })
            .expect("fraction rule");
        let ys: Vec<f64> = layout
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Glyph { y, .. } => Some(*y),
                _ => None,
            })
            .collect();
        assert!(ys[0] < rule_y);
        assert!(ys[1] > rule_y);
        assert!(layout.height() > (ASCENT + DESCENT) * BASE_SIZE);
    }

    #[test]
    fn test_binomial_has_no_rule() {
        let layout =
            layout(r#"<math><mfrac linethickness="0"><mi>n</mi><mi>k</mi></mfrac></math>"#);
        assert!(!layout.items.iter().any(|i| matches!(i, Item::Rule { .. })));
    }

    #[test]
    fn test_sqrt_draws_radical() {
        let layout = layout("<math><msqrt><mi>x</mi></msqrt></math>");
        assert!(layout
            .items
            .iter()
            .any(|i| matches!(i, Item::Polyline { points, .. } if points.len() == 5)));
    }

    #[test]
    fn test_fences_grow_with_content() {
        let flat = layout("<math><mo>(</mo><mi>x</mi><mo>)</mo></math>");
        let tall = layout(
            "<math><mo>(</mo><mfrac><mi>a</mi><mi>b</mi></mfrac><mo>)</mo></math>",
        );
        let fence_size = |layout: &LayoutBox| {
            layout.items.iter().find_map(|item| match item {
                Item::Glyph { text, size, .. } if text == "(" => Some(*size),
                _ => None,
            })
        };
        assert_eq!(fence_size(&flat), Some(BASE_SIZE));
        assert!(fence_size(&tall).unwrap() > BASE_SIZE);
    }

    #[test]
    fn test_non_stretchy_fence_keeps_size() {
        let layout = layout(
            r#"<math><mo stretchy="false">(</mo><mfrac><mi>a</mi><mi>b</mi></mfrac></math>"#,
        );
        let size = layout.items.iter().find_map(|item| match item {
            Item::Glyph { text, size, .. } if text == "(" => Some(*size),
            _ => None,
        });
        assert_eq!(size, Some(BASE_SIZE));
    }

    #[test]
    fn test_under_limit_is_below_base() {
        let layout = layout("<math><munder><mi>lim</mi><mi>x</mi></munder></math>");
        match &layout.items[1] {
            Item::Glyph { y, .. } => assert!(*y > 0.0),
            other => panic!("unexpected item {:?}", other),
        }
    }

    #[test]
    fn test_table_places_cells_in_grid() {
        let layout = layout(
            "<math><mtable><mtr><mtd><mn>1</mn></mtd><mtd><mn>2</mn></mtd></mtr>\
             <mtr><mtd><mn>3</mn></mtd><mtd><mn>4</mn></mtd></mtr></mtable></math>",
        );
        let positions: Vec<(f64, f64)> = layout
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Glyph { x, y, .. } => Some((*x, *y)),
                _ => None,
            })
            .collect();
        assert_eq!(positions.len(), 4);
        assert_eq!(positions[0].1, positions[1].1);
        assert!(positions[2].1 > positions[0].1);
        assert!(positions[1].0 > positions[0].0);
    }

    #[test]
    fn test_parse_length_units() {
        assert_eq!(parse_length("0.5em", 40.0), 20.0);
        assert_eq!(parse_length("1", 40.0), 40.0);
        assert_eq!(parse_length("16px", 40.0), 40.0);
        assert_eq!(parse_length("wide", 40.0), 0.0);
    }

    #[test]
    fn test_phantom_reserves_space_without_ink() {
        let layout = layout("<math><mphantom><mi>x</mi></mphantom></math>");
        assert!(layout.is_empty());
        assert!(layout.width > 0.0);
    }
}
