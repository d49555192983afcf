//! Dual-view cuboids: a plan ("top") and an elevation representation of
//! the same object.
//!
//! A cuboid remembers the rectangle it had in each view. Switching views
//! swaps the height while keeping the bottom edge in place, so a row of
//! cuboids stays standing on the same line. Entering the elevation view the
//! first time also creates an elevation-only companion with evenly spaced
//! floor lines next to each cuboid.

use crate::id::ElementId;
use crate::model::{Color, Element, ElementKind, ElementStyle, FillStyle, StrokeStyle};
use crate::mutate::{ElementUpdate, Scene};
use kurbo::Point;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOP_HEIGHT: f64 = 250.0;
pub const DEFAULT_ELEVATION_HEIGHT: f64 = 350.0;
const DEFAULT_WIDTH: f64 = 100.0;
const COMPANION_SPACING: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewKind {
    #[default]
    Top,
    Elevation,
}

impl ViewKind {
    pub fn toggled(self) -> Self {
        match self {
            ViewKind::Top => ViewKind::Elevation,
            ViewKind::Elevation => ViewKind::Top,
        }
    }

    fn default_height(self) -> f64 {
        match self {
            ViewKind::Top => DEFAULT_TOP_HEIGHT,
            ViewKind::Elevation => DEFAULT_ELEVATION_HEIGHT,
        }
    }
}

/// Rectangle an element had in one view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DualView {
    pub current_view: ViewKind,
    pub top_view: Option<ViewRect>,
    pub elevation_view: Option<ViewRect>,
    /// Only shown while the elevation view is active.
    pub elevation_only: bool,
    /// For companions: the cuboid they were created from.
    pub linked_element_id: Option<ElementId>,
    pub has_elevation_companion: bool,
}

impl DualView {
    fn slot(&self, view: ViewKind) -> Option<ViewRect> {
        match view {
            ViewKind::Top => self.top_view,
            ViewKind::Elevation => self.elevation_view,
        }
    }

    fn slot_mut(&mut self, view: ViewKind) -> &mut Option<ViewRect> {
        match view {
            ViewKind::Top => &mut self.top_view,
            ViewKind::Elevation => &mut self.elevation_view,
        }
    }
}

fn nonzero(v: f64, fallback: f64) -> f64 {
    if v > 0.0 && v.is_finite() { v } else { fallback }
}

/// Whether `element` is shown while `view` is active.
pub fn visible_in(element: &Element, view: ViewKind) -> bool {
    match &element.dual_view {
        Some(dv) if dv.elevation_only => view == ViewKind::Elevation,
        _ => true,
    }
}

/// Update that presents `element` in `view`.
///
/// The bottom edge stays put. The rectangle the element had in its previous
/// view is saved so switching back restores it.
pub fn switch_view(element: &Element, view: ViewKind) -> ElementUpdate {
    let mut dv = element.dual_view.clone().unwrap_or_default();
    let first = dv.top_view.is_none() && dv.elevation_view.is_none();

    if dv.elevation_only {
        dv.current_view = view;
        return ElementUpdate {
            dual_view: Some(Some(dv)),
            ..ElementUpdate::default()
        };
    }

    let width = nonzero(element.width, DEFAULT_WIDTH);
    let current = ViewRect {
        x: element.x,
        y: element.y,
        width,
        height: nonzero(element.height, dv.current_view.default_height()),
    };
    if !first {
        *dv.slot_mut(dv.current_view) = Some(current);
    }

    let old_height = current.height;
    let new_height = if first && view == dv.current_view {
        old_height
    } else if first {
        view.default_height()
    } else {
        dv.slot(view)
            .map(|r| nonzero(r.height, view.default_height()))
            .unwrap_or_else(|| view.default_height())
    };
    let y = element.y + (old_height - new_height);

    if first {
        *dv.slot_mut(dv.current_view) = Some(current);
    }
    *dv.slot_mut(view) = Some(ViewRect {
        x: element.x,
        y,
        width,
        height: new_height,
    });
    let other = view.toggled();
    if dv.slot(other).is_none() {
        *dv.slot_mut(other) = Some(ViewRect {
            x: element.x,
            y,
            width,
            height: other.default_height(),
        });
    }
    dv.current_view = view;

    ElementUpdate {
        y: Some(y),
        height: Some(new_height),
        dual_view: Some(Some(dv)),
        ..ElementUpdate::default()
    }
}

/// Create the elevation-only companion of cuboid `id`: a cuboid to its
/// right with aligned bottom edges, plus 2 (short) or 5 floor lines.
///
/// Returns the ids of the created elements, companion first.
pub fn create_elevation_companion(scene: &mut Scene, id: ElementId) -> Vec<ElementId> {
    let Some(original) = scene.get_live(id) else {
        return Vec::new();
    };
    let saved = original.dual_view.as_ref().and_then(|dv| dv.elevation_view);
    let x = original.x + nonzero(original.width, DEFAULT_WIDTH) + COMPANION_SPACING;
    let width = saved
        .map(|r| r.width)
        .filter(|w| *w > 0.0)
        .unwrap_or_else(|| nonzero(original.width, DEFAULT_WIDTH));
    let height = saved
        .map(|r| r.height)
        .filter(|h| *h > 0.0)
        .unwrap_or(DEFAULT_ELEVATION_HEIGHT);
    let bottom = original.y + nonzero(original.height, DEFAULT_WIDTH);
    let y = bottom - height;

    let mut companion = Element::cuboid(x, y, width, height).with_style(original.style.clone());
    companion.dual_view = Some(DualView {
        current_view: ViewKind::Elevation,
        elevation_only: true,
        linked_element_id: Some(id),
        ..DualView::default()
    });
    let companion_id = companion.id;
    scene.insert(companion);

    let line_style = ElementStyle {
        stroke_color: original.style.stroke_color,
        background_color: Color::TRANSPARENT,
        fill_style: FillStyle::Solid,
        stroke_width: original.style.stroke_width / 2.0,
        stroke_style: StrokeStyle::Solid,
        roughness: original.style.roughness,
        opacity: original.style.opacity,
        roundness: None,
    };
    let count = if height < 100.0 { 2 } else { 5 };
    let spacing = height / (count + 1) as f64;

    let mut created = vec![companion_id];
    for i in 1..=count {
        let mut line = Element::line(
            x + 1.0,
            y + i as f64 * spacing,
            vec![Point::ZERO, Point::new(width - 2.0, 0.0)],
        )
        .with_style(line_style.clone());
        line.dual_view = Some(DualView {
            current_view: ViewKind::Elevation,
            elevation_only: true,
            linked_element_id: Some(companion_id),
            ..DualView::default()
        });
        created.push(line.id);
        scene.insert(line);
    }

    let mut dv = original.dual_view.clone().unwrap_or_default();
    dv.has_elevation_companion = true;
    scene.mutate(
        id,
        ElementUpdate {
            dual_view: Some(Some(dv)),
            ..ElementUpdate::default()
        },
    );
    log::debug!("created elevation companion {companion_id} for {id}");
    created
}

/// Switch every cuboid to the other view. Returns the now active view.
pub fn toggle_view(scene: &mut Scene) -> ViewKind {
    let view = scene.app_state.current_view.toggled();
    let cuboids: Vec<ElementId> = scene
        .iter_live()
        .filter(|e| matches!(e.kind, ElementKind::Cuboid))
        .map(|e| e.id)
        .collect();

    for id in cuboids {
        let Some(el) = scene.get_live(id) else {
            continue;
        };
        let update = switch_view(&el, view);
        scene.mutate(id, update);

        let needs_companion = view == ViewKind::Elevation
            && el
                .dual_view
                .as_ref()
                .is_none_or(|dv| !dv.elevation_only && !dv.has_elevation_companion);
        if needs_companion {
            create_elevation_companion(scene, id);
        }
    }

    scene.app_state.current_view = view;
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn switch_keeps_bottom_edge_and_restores() {
        let mut scene = Scene::new();
        let cuboid = scene.insert(Element::cuboid(0.0, 100.0, 120.0, 200.0));
        let bottom = cuboid.y + cuboid.height;

        let el = scene.mutate(cuboid.id, switch_view(&cuboid, ViewKind::Elevation)).unwrap();
        assert_eq!(el.height, DEFAULT_ELEVATION_HEIGHT);
        assert_eq!(el.y + el.height, bottom);

        let el = scene.mutate(el.id, switch_view(&el, ViewKind::Top)).unwrap();
        assert_eq!(el.height, 200.0);
        assert_eq!(el.y, 100.0);
    }

    #[test]
    fn elevation_height_survives_resize() {
        let mut scene = Scene::new();
        let cuboid = scene.insert(Element::cuboid(0.0, 0.0, 100.0, 100.0));
        let el = scene.mutate(cuboid.id, switch_view(&cuboid, ViewKind::Elevation)).unwrap();
        let el = scene
            .mutate(el.id, ElementUpdate::default().with_size(100.0, 400.0))
            .unwrap();
        let el = scene.mutate(el.id, switch_view(&el, ViewKind::Top)).unwrap();
        let el = scene.mutate(el.id, switch_view(&el, ViewKind::Elevation)).unwrap();
        assert_eq!(el.height, 400.0);
    }

    #[test]
    fn toggle_creates_companion_once() {
        let mut scene = Scene::new();
        let cuboid = scene.insert(Element::cuboid(0.0, 0.0, 100.0, 80.0));

        assert_eq!(toggle_view(&mut scene), ViewKind::Elevation);
        let companion = scene
            .iter_live()
            .find(|e| {
                e.dual_view
                    .as_ref()
                    .is_some_and(|dv| dv.linked_element_id == Some(cuboid.id))
            })
            .cloned()
            .unwrap();
        assert_eq!(companion.x, 150.0);
        assert_eq!(companion.height, DEFAULT_ELEVATION_HEIGHT);
        assert_eq!(companion.y + companion.height, 80.0);
        let lines = scene
            .iter_live()
            .filter(|e| matches!(e.kind, ElementKind::Line))
            .count();
        assert_eq!(lines, 5);
        assert!(!visible_in(&companion, ViewKind::Top));

        toggle_view(&mut scene);
        toggle_view(&mut scene);
        let cuboids = scene
            .iter_live()
            .filter(|e| matches!(e.kind, ElementKind::Cuboid))
            .count();
        assert_eq!(cuboids, 2);
    }
}
