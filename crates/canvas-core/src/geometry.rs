//! Pure geometry helpers: bounds, rotation, outline projection, grid snap.

use crate::model::{Element, ElementKind};
use kurbo::{Point, Rect, Vec2};

const EPSILON: f64 = 1e-9;

/// Outline family used for bindings and outline distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outline {
    Box,
    Diamond,
    Ellipse,
}

/// Outline of a bindable element, `None` for linear kinds.
pub fn outline_of(kind: &ElementKind) -> Option<Outline> {
    match kind {
        ElementKind::Rectangle
        | ElementKind::Frame { .. }
        | ElementKind::Cuboid
        | ElementKind::Text(_) => Some(Outline::Box),
        ElementKind::Diamond => Some(Outline::Diamond),
        ElementKind::Ellipse => Some(Outline::Ellipse),
        ElementKind::FreeDraw | ElementKind::Line | ElementKind::Arrow(_) => None,
    }
}

/// Width and height spanned by a set of local points.
pub fn points_extent(points: &[Point]) -> (f64, f64) {
    match points_rect(points) {
        Some(r) => (r.width(), r.height()),
        None => (0.0, 0.0),
    }
}

fn points_rect(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    Some(
        points
            .iter()
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)),
    )
}

/// Rotate `p` around `center` by `angle` radians.
pub fn rotate_point(p: Point, center: Point, angle: f64) -> Point {
    if angle == 0.0 {
        return p;
    }
    let (sin, cos) = angle.sin_cos();
    let d = p - center;
    center + Vec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos)
}

/// Axis-aligned bounds of an element in scene coordinates.
pub fn element_bounds(el: &Element) -> Rect {
    let local = unrotated_rect(el);
    rotated_rect_bounds(local, local.center(), el.angle)
}

/// Box the element occupies before rotation. Linear kinds use the extent
/// of their points, which may start left of or above the origin.
pub fn unrotated_rect(el: &Element) -> Rect {
    if el.kind.is_linear()
        && let Some(r) = points_rect(&el.points)
    {
        return r + Vec2::new(el.x, el.y);
    }
    el.rect()
}

fn rotated_rect_bounds(r: Rect, center: Point, angle: f64) -> Rect {
    let corners = [
        Point::new(r.x0, r.y0),
        Point::new(r.x1, r.y0),
        Point::new(r.x1, r.y1),
        Point::new(r.x0, r.y1),
    ];
    bounds_of_points(corners.into_iter().map(|p| rotate_point(p, center, angle)))
}

fn bounds_of_points(mut points: impl Iterator<Item = Point>) -> Rect {
    let Some(first) = points.next() else {
        return Rect::ZERO;
    };
    points.fold(Rect::from_points(first, first), |r, p| r.union_pt(p))
}

/// Union of the bounds of all given elements, `None` when empty.
pub fn common_bounds<'a>(elements: impl IntoIterator<Item = &'a Element>) -> Option<Rect> {
    elements
        .into_iter()
        .map(element_bounds)
        .reduce(|a, b| a.union(b))
}

/// Absolute (scene) positions of a linear element's points.
pub fn absolute_points(el: &Element) -> Vec<Point> {
    let center = element_bounds(el).center();
    el.points
        .iter()
        .map(|p| rotate_point(Point::new(el.x + p.x, el.y + p.y), center, el.angle))
        .collect()
}

/// Inverse of [`absolute_points`] for an unrotated element: origin at the
/// first point, points local to it.
pub fn normalize_points(absolute: &[Point]) -> (Point, Vec<Point>) {
    let origin = absolute.first().copied().unwrap_or(Point::ORIGIN);
    let local = absolute.iter().map(|p| (*p - origin).to_point()).collect();
    (origin, local)
}

/// Snap to the nearest grid intersection when a grid is active.
pub fn grid_point(x: f64, y: f64, grid_size: Option<f64>) -> (f64, f64) {
    match grid_size {
        Some(g) if g > 0.0 => ((x / g).round() * g, (y / g).round() * g),
        _ => (x, y),
    }
}

/// Height of the shared vertical span of two boxes (0 when disjoint).
pub fn vertical_overlap(a: Rect, b: Rect) -> f64 {
    (a.y1.min(b.y1) - a.y0.max(b.y0)).max(0.0)
}

pub fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len2 = ab.hypot2();
    if len2 < EPSILON {
        return (p - a).hypot();
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).hypot()
}

pub fn is_finite_point(p: Point) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

/// Where the ray from the center of `rect` in direction `dir` leaves the
/// outline, together with the outward unit normal there. Unrotated frame.
pub fn outline_hit(outline: Outline, rect: Rect, dir: Vec2) -> (Point, Vec2) {
    let c = rect.center();
    let a = rect.width() / 2.0;
    let b = rect.height() / 2.0;
    let dir = if dir.hypot2() < EPSILON {
        Vec2::new(1.0, 0.0)
    } else {
        dir
    };

    let degenerate = a < EPSILON || b < EPSILON;
    match (outline, degenerate) {
        (Outline::Box, _) | (_, true) => {
            let tx = if dir.x.abs() > EPSILON { a / dir.x.abs() } else { f64::INFINITY };
            let ty = if dir.y.abs() > EPSILON { b / dir.y.abs() } else { f64::INFINITY };
            let t = tx.min(ty);
            let t = if t.is_finite() { t } else { 0.0 };
            let normal = if tx <= ty {
                Vec2::new(dir.x.signum(), 0.0)
            } else {
                Vec2::new(0.0, dir.y.signum())
            };
            (c + dir * t, normal)
        }
        (Outline::Ellipse, false) => {
            let t = 1.0 / ((dir.x / a).powi(2) + (dir.y / b).powi(2)).sqrt();
            let q = c + dir * t;
            let n = Vec2::new((q.x - c.x) / (a * a), (q.y - c.y) / (b * b));
            (q, n.normalize())
        }
        (Outline::Diamond, false) => {
            let t = 1.0 / (dir.x.abs() / a + dir.y.abs() / b);
            let n = Vec2::new(dir.x.signum() / a, dir.y.signum() / b);
            let n = if n.hypot2() < EPSILON { dir.normalize() } else { n.normalize() };
            (c + dir * t, n)
        }
    }
}

/// Distance from a scene point to an element's outline (rotation aware).
/// `None` for kinds without an outline.
pub fn distance_to_outline(el: &Element, p: Point) -> Option<f64> {
    let outline = outline_of(&el.kind)?;
    let rect = el.rect();
    let local = rotate_point(p, rect.center(), -el.angle);
    let d = match outline {
        Outline::Box => {
            let corners = [
                Point::new(rect.x0, rect.y0),
                Point::new(rect.x1, rect.y0),
                Point::new(rect.x1, rect.y1),
                Point::new(rect.x0, rect.y1),
            ];
            polygon_distance(&corners, local)
        }
        Outline::Diamond => polygon_distance(&diamond_points(rect), local),
        Outline::Ellipse => {
            let samples = ellipse_points(rect, 256);
            polygon_distance(&samples, local)
        }
    };
    Some(d)
}

fn polygon_distance(poly: &[Point], p: Point) -> f64 {
    (0..poly.len())
        .map(|i| distance_to_segment(p, poly[i], poly[(i + 1) % poly.len()]))
        .fold(f64::INFINITY, f64::min)
}

/// Top, right, bottom, left vertices of the diamond inscribed in `rect`.
pub fn diamond_points(rect: Rect) -> [Point; 4] {
    let c = rect.center();
    [
        Point::new(c.x, rect.y0),
        Point::new(rect.x1, c.y),
        Point::new(c.x, rect.y1),
        Point::new(rect.x0, c.y),
    ]
}

/// `n` evenly spaced samples along the ellipse inscribed in `rect`.
pub fn ellipse_points(rect: Rect, n: usize) -> Vec<Point> {
    let c = rect.center();
    let (a, b) = (rect.width() / 2.0, rect.height() / 2.0);
    (0..n)
        .map(|i| {
            let t = i as f64 / n as f64 * std::f64::consts::TAU;
            Point::new(c.x + a * t.cos(), c.y + b * t.sin())
        })
        .collect()
}
