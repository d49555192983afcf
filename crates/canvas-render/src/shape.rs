//! Element → drawable shape.
//!
//! Generation is a pure function of an element's shape-relevant fields
//! (size, points, style, seed and kind payload). Shapes live in the
//! element's local frame: origin at `(x, y)`, unrotated. Placement is
//! applied at draw time through [`shape_transform`].

use crate::sketch::{self, Sketch};
use canvas_core::geometry::{self, diamond_points, is_finite_point};
use canvas_core::id::ElementId;
use canvas_core::model::{Arrowhead, Color, Element, ElementKind, FillStyle, Roundness};
use kurbo::{Affine, BezPath, Point, Rect, Shape as _, Vec2};
use thiserror::Error;

const EPSILON: f64 = 1e-9;
/// Cuboids without a size are drawn at this size.
const CUBOID_FALLBACK_SIZE: f64 = 100.0;
/// Simplification tolerance for closed freehand fills.
const FREEDRAW_SIMPLIFY: f64 = 0.75;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShapeError {
    #[error("element {0} has non-finite geometry")]
    NonFinite(ElementId),
    #[error("linear element {id} has {count} point(s), needs at least 2")]
    TooFewPoints { id: ElementId, count: usize },
}

/// Settings that apply to every generated shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeConfig {
    pub elbow_corner_radius: f64,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            elbow_corner_radius: 16.0,
        }
    }
}

/// How a path is painted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Stroke {
        color: Color,
        width: f64,
        dash: Option<[f64; 2]>,
    },
    Fill {
        color: Color,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Drawable {
    pub path: BezPath,
    pub paint: Paint,
}

/// Ordered drawables for one element, painted back to front.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Shape {
    pub drawables: Vec<Drawable>,
}

impl Shape {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.drawables.is_empty()
    }

    /// Union of all path bounds in local coordinates.
    pub fn bounds(&self) -> Option<Rect> {
        self.drawables
            .iter()
            .map(|d| d.path.bounding_box())
            .reduce(|a, b| a.union(b))
    }

    fn stroke(&mut self, path: BezPath, sketch: &Sketch) {
        if path.elements().is_empty() {
            return;
        }
        self.drawables.push(Drawable {
            path,
            paint: Paint::Stroke {
                color: sketch.stroke,
                width: sketch.stroke_width,
                dash: sketch.dash,
            },
        });
    }

    fn fill(&mut self, path: BezPath, color: Color) {
        self.drawables.push(Drawable {
            path,
            paint: Paint::Fill { color },
        });
    }
}

/// Local → scene transform: translate to `(x, y)`, rotate about the center.
pub fn shape_transform(el: &Element) -> Affine {
    let local_center = geometry::unrotated_rect(el).center() - Vec2::new(el.x, el.y);
    Affine::translate((el.x, el.y)) * Affine::rotate_about(el.angle, local_center)
}

/// Corner radius for a side of length `size`.
pub fn corner_radius(size: f64, roundness: Roundness) -> f64 {
    const PROPORTIONAL: f64 = 0.25;
    const ADAPTIVE_RADIUS: f64 = 32.0;
    match roundness {
        Roundness::Proportional => size * PROPORTIONAL,
        Roundness::Adaptive => {
            if size <= ADAPTIVE_RADIUS / PROPORTIONAL {
                size * PROPORTIONAL
            } else {
                ADAPTIVE_RADIUS
            }
        }
    }
}

fn check_finite(el: &Element) -> Result<(), ShapeError> {
    let scalars = [el.x, el.y, el.width, el.height, el.angle, el.style.stroke_width];
    if scalars.iter().all(|v| v.is_finite()) && el.points.iter().all(|p| is_finite_point(*p)) {
        Ok(())
    } else {
        Err(ShapeError::NonFinite(el.id))
    }
}

/// Generate the drawable shape for `el`. Text and frames draw nothing.
pub fn generate_shape(el: &Element, config: &ShapeConfig) -> Result<Shape, ShapeError> {
    check_finite(el)?;
    let mut shape = Shape::empty();
    match &el.kind {
        ElementKind::Rectangle => box_shape(&mut shape, el, el.width, el.height),
        ElementKind::Cuboid => {
            let w = if el.width > 0.0 { el.width } else { CUBOID_FALLBACK_SIZE };
            let h = if el.height > 0.0 { el.height } else { CUBOID_FALLBACK_SIZE };
            box_shape(&mut shape, el, w, h);
        }
        ElementKind::Diamond => diamond_shape(&mut shape, el),
        ElementKind::Ellipse => ellipse_shape(&mut shape, el),
        ElementKind::Line => linear_shape(&mut shape, el, None, config)?,
        ElementKind::Arrow(data) => {
            linear_shape(&mut shape, el, Some((data.start_arrowhead, data.end_arrowhead)), config)?
        }
        ElementKind::FreeDraw => freedraw_shape(&mut shape, el),
        ElementKind::Text(_) | ElementKind::Frame { .. } => {}
    }
    Ok(shape)
}

// ─── Closed shapes ───────────────────────────────────────────────────────

/// Fill for `polygon`, sketched after the outline and painted beneath it.
fn add_fill(shape: &mut Shape, sketch: &mut Sketch, polygon: &[Point]) {
    let Some(color) = sketch.fill else {
        return;
    };
    let path = sketch.fill_polygon(polygon);
    if path.elements().is_empty() {
        return;
    }
    let paint = match sketch.fill_style {
        FillStyle::Solid => Paint::Fill { color },
        FillStyle::Hachure | FillStyle::CrossHatch => Paint::Stroke {
            color,
            width: sketch.fill_weight,
            dash: None,
        },
    };
    shape.drawables.push(Drawable { path, paint });
}

fn box_shape(shape: &mut Shape, el: &Element, w: f64, h: f64) {
    let corners = [
        Point::new(0.0, 0.0),
        Point::new(w, 0.0),
        Point::new(w, h),
        Point::new(0.0, h),
    ];
    match el.style.roundness {
        Some(roundness) => {
            let r = corner_radius(w.min(h), roundness);
            rounded_closed(shape, el, &corners, r);
        }
        None => {
            let mut sketch = Sketch::for_element(el, false);
            let outline = sketch.rectangle(w, h);
            add_fill(shape, &mut sketch, &corners);
            shape.stroke(outline, &sketch);
        }
    }
}

fn diamond_shape(shape: &mut Shape, el: &Element) {
    let vertices = diamond_points(Rect::new(0.0, 0.0, el.width, el.height));
    match el.style.roundness {
        Some(roundness) => {
            let r = corner_radius(el.width.min(el.height) / 2.0, roundness);
            rounded_closed(shape, el, &vertices, r);
        }
        None => {
            let mut sketch = Sketch::for_element(el, false);
            let outline = sketch.polygon(&vertices);
            add_fill(shape, &mut sketch, &vertices);
            shape.stroke(outline, &sketch);
        }
    }
}

fn rounded_closed(shape: &mut Shape, el: &Element, vertices: &[Point], radius: f64) {
    let mut sketch = Sketch::for_element(el, true);
    let exact = round_corners(vertices, radius, true);
    let outline = sketch.path(&exact);
    add_fill(shape, &mut sketch, &flatten(&exact));
    shape.stroke(outline, &sketch);
}

fn ellipse_shape(shape: &mut Shape, el: &Element) {
    const SAMPLES: usize = 48;
    let mut sketch = Sketch::for_element(el, false);
    let center = Point::new(el.width / 2.0, el.height / 2.0);
    let outline = sketch.ellipse(center, el.width, el.height);
    let (rx, ry) = (el.width / 2.0, el.height / 2.0);
    let rim: Vec<Point> = (0..SAMPLES)
        .map(|i| {
            let (sin, cos) = (std::f64::consts::TAU * i as f64 / SAMPLES as f64).sin_cos();
            center + Vec2::new(rx * cos, ry * sin)
        })
        .collect();
    add_fill(shape, &mut sketch, &rim);
    shape.stroke(outline, &sketch);
}

// ─── Linear shapes ───────────────────────────────────────────────────────

/// Start and end arrowheads.
type Heads = (Option<Arrowhead>, Option<Arrowhead>);

fn linear_shape(
    shape: &mut Shape,
    el: &Element,
    heads: Option<Heads>,
    config: &ShapeConfig,
) -> Result<(), ShapeError> {
    if el.points.len() < 2 {
        return Err(ShapeError::TooFewPoints {
            id: el.id,
            count: el.points.len(),
        });
    }
    let points = &el.points;
    let mut sketch = Sketch::for_element(el, false);

    if el.kind.is_elbow_arrow() {
        let path = round_corners(points, config.elbow_corner_radius, false);
        shape.stroke(path, &sketch);
    } else if sketch.fill.is_some() {
        // Closed line loop.
        let outline = sketch.polygon(points);
        add_fill(shape, &mut sketch, points);
        shape.stroke(outline, &sketch);
    } else if el.style.roundness.is_some() {
        let outline = sketch.path(&catmull_rom(points, false));
        shape.stroke(outline, &sketch);
    } else {
        let outline = sketch.path(&polyline_path(points));
        shape.stroke(outline, &sketch);
    }

    if let Some((start, end)) = heads {
        let first = points[0];
        let last = points[points.len() - 1];
        if let Some(head) = start
            && let Some(from) = first_distinct(first, points.iter().skip(1))
        {
            arrowhead(shape, el, &sketch, head, from, first);
        }
        if let Some(head) = end
            && let Some(from) = first_distinct(last, points.iter().rev().skip(1))
        {
            arrowhead(shape, el, &sketch, head, from, last);
        }
    }
    Ok(())
}

/// First point of `rest` that does not coincide with `tip`.
fn first_distinct<'p>(tip: Point, mut rest: impl Iterator<Item = &'p Point>) -> Option<Point> {
    rest.find(|p| (**p - tip).hypot() > EPSILON).copied()
}

fn arrowhead(shape: &mut Shape, el: &Element, body: &Sketch, head: Arrowhead, from: Point, tip: Point) {
    let (size, angle) = match head {
        Arrowhead::Arrow => (25.0, 20.0),
        Arrowhead::Triangle => (15.0, 25.0),
        Arrowhead::Bar => (15.0, 90.0),
        Arrowhead::Dot => (15.0, 0.0),
    };
    let segment = (tip - from).hypot();
    let size = f64::min(size, segment * 0.5);
    let dir = (tip - from) / segment;
    let back = tip - dir * size;

    let mut sketch = body.for_head();

    let wing = |deg: f64| Affine::rotate_about(deg.to_radians(), tip) * back;
    match head {
        Arrowhead::Dot => {
            let diameter = size + el.style.stroke_width - 2.0;
            let circle = kurbo::Circle::new(tip, diameter.max(1.0) / 2.0).to_path(0.1);
            shape.fill(circle.clone(), sketch.stroke);
            shape.stroke(circle, &sketch);
        }
        Arrowhead::Triangle => {
            let tri = [tip, wing(angle), wing(-angle)];
            let outline = sketch.polygon(&tri);
            shape.fill(polygon_path(&tri), sketch.stroke);
            shape.stroke(outline, &sketch);
        }
        Arrowhead::Arrow => {
            let mut path = sketch.line(wing(angle), tip);
            path.extend(sketch.line(wing(-angle), tip));
            shape.stroke(path, &sketch);
        }
        Arrowhead::Bar => {
            let path = sketch.line(wing(angle), wing(-angle));
            shape.stroke(path, &sketch);
        }
    }
}

fn freedraw_shape(shape: &mut Shape, el: &Element) {
    if el.points.len() < 2 {
        return;
    }
    let sketch = Sketch::for_element(el, false);
    if let Some(color) = sketch.fill
        && sketch::is_path_a_loop(&el.points)
    {
        let simplified = simplify(&el.points, FREEDRAW_SIMPLIFY);
        shape.fill(catmull_rom(&simplified, true), color);
    }
    shape.stroke(catmull_rom(&el.points, false), &sketch);
}

// ─── Path helpers ────────────────────────────────────────────────────────

fn polyline_path(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    if let Some((first, rest)) = points.split_first() {
        path.move_to(*first);
        for p in rest {
            path.line_to(*p);
        }
    }
    path
}

fn polygon_path(points: &[Point]) -> BezPath {
    let mut path = polyline_path(points);
    if !points.is_empty() {
        path.close_path();
    }
    path
}

/// Uniform Catmull-Rom spline through `points` as cubic segments.
pub fn catmull_rom(points: &[Point], closed: bool) -> BezPath {
    let n = points.len();
    if n < 3 {
        return polyline_path(points);
    }
    let mut path = BezPath::new();
    path.move_to(points[0]);
    let at = |i: isize| -> Point {
        if closed {
            points[i.rem_euclid(n as isize) as usize]
        } else {
            points[i.clamp(0, n as isize - 1) as usize]
        }
    };
    let segments = if closed { n } else { n - 1 };
    for i in 0..segments as isize {
        let (p0, p1, p2, p3) = (at(i - 1), at(i), at(i + 1), at(i + 2));
        let c1 = p1 + (p2 - p0) / 6.0;
        let c2 = p2 - (p3 - p1) / 6.0;
        path.curve_to(c1, c2, p2);
    }
    if closed {
        path.close_path();
    }
    path
}

fn flatten(path: &BezPath) -> Vec<Point> {
    let mut points = Vec::new();
    kurbo::flatten(path.iter(), 0.5, |el| match el {
        kurbo::PathEl::MoveTo(p) | kurbo::PathEl::LineTo(p) => points.push(p),
        _ => {}
    });
    points
}

/// Point `r` away from `from` toward `to`, or `from` when they coincide.
fn toward(from: Point, to: Point, r: f64) -> Point {
    let d = to - from;
    let len = d.hypot();
    if len < EPSILON {
        from
    } else {
        from + d * (r / len)
    }
}

/// Straight segments joined by quadratic corners. Each corner radius is
/// capped at half of both adjoining segments.
pub fn round_corners(points: &[Point], radius: f64, closed: bool) -> BezPath {
    let n = points.len();
    let mut path = BezPath::new();
    if n < 2 {
        return path;
    }
    let corner = |i: usize| -> (Point, Point) {
        let cur = points[i];
        let prev = points[(i + n - 1) % n];
        let next = points[(i + 1) % n];
        let r = radius
            .min((cur - prev).hypot() / 2.0)
            .min((next - cur).hypot() / 2.0)
            .max(0.0);
        (toward(cur, prev, r), toward(cur, next, r))
    };
    let segment = |path: &mut BezPath, a: Point, b: Point, first: bool| {
        if first {
            path.move_to(a);
        }
        path.line_to(b);
    };

    if closed {
        let corners: Vec<(Point, Point)> = (0..n).map(corner).collect();
        for i in 1..=n {
            let j = i % n;
            let (a, b) = corners[j];
            segment(&mut path, corners[i - 1].1, a, i == 1);
            path.quad_to(points[j], b);
        }
        path.close_path();
    } else {
        let mut from = points[0];
        for i in 1..n - 1 {
            let (a, b) = corner(i);
            segment(&mut path, from, a, i == 1);
            path.quad_to(points[i], b);
            from = b;
        }
        segment(&mut path, from, points[n - 1], n == 2);
    }
    path
}

/// Ramer–Douglas–Peucker simplification.
pub fn simplify(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let (first, last) = (points[0], points[points.len() - 1]);
    let (index, dist) = points[1..points.len() - 1]
        .iter()
        .enumerate()
        .map(|(i, p)| (i + 1, geometry::distance_to_segment(*p, first, last)))
        .fold((0, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });
    if dist > epsilon {
        let mut left = simplify(&points[..=index], epsilon);
        let right = simplify(&points[index..], epsilon);
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}
