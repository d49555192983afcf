//! Hit testing: point → element lookup.
//!
//! Walks the store back to front (last drawn = topmost) and tests each
//! drawn element in its own unrotated frame.

use canvas_core::cuboid::{self, ViewKind};
use canvas_core::geometry::{
    Outline, absolute_points, distance_to_outline, distance_to_segment, outline_of, rotate_point,
};
use canvas_core::id::ElementId;
use canvas_core::model::Element;
use canvas_core::mutate::Scene;
use kurbo::{Point, Rect};

/// Extra reach around strokes, in scene units.
pub const HIT_THRESHOLD: f64 = 10.0;

/// Whether `el` is drawn while `view` is active.
pub fn is_drawn(el: &Element, view: ViewKind) -> bool {
    el.is_visible() && cuboid::visible_in(el, view)
}

/// Topmost drawn element at `point`, `None` for the background.
pub fn hit_test(scene: &Scene, point: Point) -> Option<ElementId> {
    let view = scene.app_state.current_view;
    scene
        .iter_live()
        .rev()
        .filter(|el| is_drawn(el, view))
        .find(|el| hits(el, point, HIT_THRESHOLD))
        .map(|el| el.id)
}

/// Topmost drawn element an arrow end at `point` could bind to, never
/// `exclude` itself.
pub fn bindable_at(scene: &Scene, point: Point, exclude: ElementId) -> Option<ElementId> {
    let view = scene.app_state.current_view;
    scene
        .iter_live()
        .rev()
        .filter(|el| el.id != exclude && el.kind.is_bindable() && is_drawn(el, view))
        .find(|el| hits(el, point, HIT_THRESHOLD))
        .map(|el| el.id)
}

fn hits(el: &Element, p: Point, threshold: f64) -> bool {
    if el.kind.is_linear() {
        let reach = threshold + el.style.stroke_width / 2.0;
        let points = absolute_points(el);
        return match points.as_slice() {
            [only] => (p - *only).hypot() <= reach,
            _ => points
                .windows(2)
                .any(|w| distance_to_segment(p, w[0], w[1]) <= reach),
        };
    }
    let Some(outline) = outline_of(&el.kind) else {
        return false;
    };
    // Frames are picked by their border only.
    let near_border = distance_to_outline(el, p).is_some_and(|d| d <= threshold);
    if el.kind.is_frame() {
        return near_border;
    }

    let rect = el.rect();
    let local = rotate_point(p, rect.center(), -el.angle);
    let (dx, dy) = (local.x - rect.center().x, local.y - rect.center().y);
    let (a, b) = (rect.width() / 2.0, rect.height() / 2.0);
    let inside = match outline {
        Outline::Box => rect.contains(local),
        Outline::Diamond => a > 0.0 && b > 0.0 && dx.abs() / a + dy.abs() / b <= 1.0,
        Outline::Ellipse => a > 0.0 && b > 0.0 && (dx / a).powi(2) + (dy / b).powi(2) <= 1.0,
    };
    inside || near_border
}

fn overlaps(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// All drawn elements whose bounds intersect `area`, in z-order.
/// Used for marquee selection.
pub fn hit_test_rect(scene: &Scene, area: Rect) -> Vec<ElementId> {
    let view = scene.app_state.current_view;
    let area = area.abs();
    scene
        .iter_live()
        .filter(|el| is_drawn(el, view))
        .filter(|el| overlaps(el.bounds(), area))
        .map(|el| el.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_core::{ElementUpdate, cuboid::DualView};
    use pretty_assertions::assert_eq;

    fn scene() -> (Scene, ElementId, ElementId) {
        let mut scene = Scene::new();
        let a = scene.insert(Element::rectangle(10.0, 10.0, 100.0, 100.0)).id;
        let b = scene.insert(Element::ellipse(60.0, 60.0, 100.0, 100.0)).id;
        (scene, a, b)
    }

    #[test]
    fn topmost_wins() {
        let (scene, a, b) = scene();
        assert_eq!(hit_test(&scene, Point::new(100.0, 100.0)), Some(b));
        assert_eq!(hit_test(&scene, Point::new(20.0, 20.0)), Some(a));
        assert_eq!(hit_test(&scene, Point::new(500.0, 500.0)), None);
    }

    #[test]
    fn hidden_and_deleted_are_skipped() {
        let (mut scene, a, b) = scene();
        scene.mutate(b, ElementUpdate::hidden(true));
        assert_eq!(hit_test(&scene, Point::new(100.0, 100.0)), Some(a));
        scene.delete(a);
        assert_eq!(hit_test(&scene, Point::new(100.0, 100.0)), None);
    }

    #[test]
    fn rotation_is_respected() {
        let mut scene = Scene::new();
        let thin = scene
            .insert(Element::rectangle(0.0, 45.0, 100.0, 10.0).with_angle(std::f64::consts::FRAC_PI_2))
            .id;
        // Rotated a quarter turn about (50, 50): now a vertical bar.
        assert_eq!(hit_test(&scene, Point::new(50.0, 5.0)), Some(thin));
        assert_eq!(hit_test(&scene, Point::new(5.0, 50.0)), None);
    }

    #[test]
    fn elevation_only_elements_need_elevation_view() {
        let mut scene = Scene::new();
        let mut el = Element::line(0.0, 0.0, vec![Point::ZERO, Point::new(100.0, 0.0)]);
        el.dual_view = Some(DualView {
            elevation_only: true,
            ..DualView::default()
        });
        let id = scene.insert(el).id;
        assert_eq!(hit_test(&scene, Point::new(50.0, 2.0)), None);
        scene.app_state.current_view = ViewKind::Elevation;
        assert_eq!(hit_test(&scene, Point::new(50.0, 2.0)), Some(id));
    }

    #[test]
    fn bindable_lookup_skips_excluded_and_unbindable() {
        let (mut scene, a, b) = scene();
        let p = Point::new(100.0, 100.0);
        assert_eq!(bindable_at(&scene, p, b), Some(a));
        let arrow = scene
            .insert(Element::arrow(90.0, 100.0, vec![Point::ZERO, Point::new(20.0, 0.0)]))
            .id;
        assert_eq!(hit_test(&scene, p), Some(arrow));
        assert_eq!(bindable_at(&scene, p, arrow), Some(b));
    }

    #[test]
    fn marquee_collects_intersecting() {
        let (scene, a, b) = scene();
        assert_eq!(hit_test_rect(&scene, Rect::new(0.0, 0.0, 70.0, 70.0)), vec![a, b]);
        assert_eq!(hit_test_rect(&scene, Rect::new(0.0, 0.0, 20.0, 20.0)), vec![a]);
        assert_eq!(hit_test_rect(&scene, Rect::new(300.0, 300.0, 200.0, 200.0)), vec![]);
    }
}
