//! Text measuring, wrapping and container layout.
//!
//! Measuring is column based (`unicode-width`) with a fixed average glyph
//! advance. Real font metrics belong to the renderer; what matters here is
//! that layout is deterministic so bound labels land in the same place on
//! every recompute.

use crate::geometry;
use crate::model::{Element, ElementKind, TextAlign, TextData, VerticalAlign};
use crate::mutate::ElementUpdate;
use kurbo::{Point, Rect};
use unicode_width::UnicodeWidthStr;

pub const DEFAULT_LINE_HEIGHT: f64 = 1.25;

/// Average glyph advance as a fraction of the font size.
const GLYPH_ADVANCE: f64 = 0.5;

/// Distance between a container's outline and its label.
pub const BOUND_TEXT_PADDING: f64 = 5.0;

pub fn line_width(line: &str, font_size: f64) -> f64 {
    UnicodeWidthStr::width(line) as f64 * font_size * GLYPH_ADVANCE
}

/// `(width, height)` of a possibly multi-line text.
pub fn measure_text(text: &str, font_size: f64, line_height: f64) -> (f64, f64) {
    let lines = text.split('\n');
    let (count, widest) = lines.fold((0usize, 0.0f64), |(n, w), line| {
        (n + 1, w.max(line_width(line, font_size)))
    });
    (widest, count as f64 * font_size * line_height)
}

/// Greedy word wrap. Words longer than `max_width` are broken by character.
pub fn wrap_text(text: &str, font_size: f64, max_width: f64) -> String {
    if max_width <= 0.0 || !max_width.is_finite() {
        return text.to_string();
    }
    let mut out: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split(' ') {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{line} {word}")
            };
            if line_width(&candidate, font_size) <= max_width {
                line = candidate;
                continue;
            }
            if !line.is_empty() {
                out.push(std::mem::take(&mut line));
            }
            if line_width(word, font_size) <= max_width {
                line = word.to_string();
                continue;
            }
            for ch in word.chars() {
                let mut next = line.clone();
                next.push(ch);
                if !line.is_empty() && line_width(&next, font_size) > max_width {
                    out.push(std::mem::take(&mut line));
                    line.push(ch);
                } else {
                    line = next;
                }
            }
        }
        out.push(line);
    }
    out.join("\n")
}

/// Box available to a label inside `container`, before padding.
fn label_area(container: &Element) -> Rect {
    let r = container.rect();
    match &container.kind {
        ElementKind::Ellipse => {
            // Largest axis-aligned box inside the ellipse.
            let c = r.center();
            let (hw, hh) = (
                r.width() / 2.0 * std::f64::consts::FRAC_1_SQRT_2,
                r.height() / 2.0 * std::f64::consts::FRAC_1_SQRT_2,
            );
            Rect::new(c.x - hw, c.y - hh, c.x + hw, c.y + hh)
        }
        ElementKind::Diamond => {
            let c = r.center();
            let (hw, hh) = (r.width() / 4.0, r.height() / 4.0);
            Rect::new(c.x - hw, c.y - hh, c.x + hw, c.y + hh)
        }
        ElementKind::Rectangle | ElementKind::Cuboid => r,
        ElementKind::Arrow(_) => {
            let mid = linear_midpoint(container);
            Rect::from_center_size(mid, (0.0, 0.0))
        }
        ElementKind::Frame { .. }
        | ElementKind::Text(_)
        | ElementKind::FreeDraw
        | ElementKind::Line => r,
    }
}

/// Point halfway along a linear element's polyline.
fn linear_midpoint(el: &Element) -> Point {
    let pts = geometry::absolute_points(el);
    let total: f64 = pts.windows(2).map(|w| (w[1] - w[0]).hypot()).sum();
    let mut remaining = total / 2.0;
    for w in pts.windows(2) {
        let seg = (w[1] - w[0]).hypot();
        if seg >= remaining && seg > 0.0 {
            return w[0] + (w[1] - w[0]) * (remaining / seg);
        }
        remaining -= seg;
    }
    pts.first().copied().unwrap_or_else(|| el.center())
}

/// Maximum wrap width of a label inside `container`.
pub fn container_max_width(container: &Element, padding: f64) -> f64 {
    match &container.kind {
        // Arrow labels wrap only on explicit line breaks.
        ElementKind::Arrow(_) => f64::INFINITY,
        _ => (label_area(container).width() - 2.0 * padding).max(0.0),
    }
}

/// Geometry update that re-lays out `text` inside `container`.
///
/// Overflow (text taller than the container) is tolerated; shrinking the
/// font to fit is the caller's business.
pub fn layout_in_container(
    container: &Element,
    text: &Element,
    data: &TextData,
    padding: f64,
) -> ElementUpdate {
    let max_width = container_max_width(container, padding);
    let wrapped = wrap_text(&data.original_text, data.font_size, max_width);
    let (w, h) = measure_text(&wrapped, data.font_size, data.line_height);
    let area = label_area(container);

    let (x, y) = match &container.kind {
        ElementKind::Arrow(_) => {
            let c = area.center();
            (c.x - w / 2.0, c.y - h / 2.0)
        }
        _ => {
            let inner = area.inflate(-padding, -padding);
            let x = match data.text_align {
                TextAlign::Left => inner.x0,
                TextAlign::Center => inner.center().x - w / 2.0,
                TextAlign::Right => inner.x1 - w,
            };
            let y = match data.vertical_align {
                VerticalAlign::Top => inner.y0,
                VerticalAlign::Middle => inner.center().y - h / 2.0,
                VerticalAlign::Bottom => inner.y1 - h,
            };
            (x, y)
        }
    };

    let mut update = ElementUpdate::position(x, y).with_size(w, h);
    if wrapped != data.text {
        update.text = Some(wrapped);
    }
    if text.angle != container.angle && !container.kind.is_linear() {
        update.angle = Some(container.angle);
    }
    update
}
