//! Insert-mode row reflow.
//!
//! While insert mode is on, a dragged batch behaves like an item in a row:
//! it snaps against its left neighbours and pushes its right neighbours
//! out of the way. Every decision here is computed from the pointer-down
//! snapshot, never from live positions, so repeated pointer moves cannot
//! compound a shift. The live scene only decides which of those elements
//! still exist.

use canvas_core::cuboid::ViewKind;
use canvas_core::geometry::vertical_overlap;
use canvas_core::id::ElementId;
use canvas_core::model::Element;
use canvas_core::mutate::Scene;
use canvas_render::is_drawn;
use indexmap::IndexMap;
use kurbo::Rect;
use std::collections::HashSet;
use std::sync::Arc;

/// Adjustments for one pointer move.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowPlan {
    /// Horizontal correction added to the drag offset so the batch touches
    /// its left neighbours.
    pub align_dx: f64,
    /// How far every shifted element moves right of its original x.
    pub shift: f64,
    /// Right neighbours plus the members of shifted frames, in z-order.
    pub shifted: Vec<ElementId>,
}

impl RowPlan {
    pub fn is_noop(&self) -> bool {
        self.align_dx == 0.0 && self.shifted.is_empty()
    }
}

/// Significant vertical overlap: positive, and at least `ratio` of the
/// smaller height.
pub fn in_same_row(a: Rect, b: Rect, ratio: f64) -> bool {
    let overlap = vertical_overlap(a, b);
    overlap > 0.0 && overlap >= ratio * a.height().min(b.height())
}

/// Arrows with a bound end are placed by binding maintenance.
fn is_bound_arrow(el: &Element) -> bool {
    el.kind
        .as_arrow()
        .is_some_and(|a| a.start_binding.is_some() || a.end_binding.is_some())
}

/// Elements that keep their own position while the batch moves.
struct Candidates<'a> {
    scene: &'a Scene,
    batch: &'a HashSet<ElementId>,
    /// Frames holding a batch member.
    enclosing: HashSet<ElementId>,
    view: ViewKind,
}

impl<'a> Candidates<'a> {
    fn new(
        scene: &'a Scene,
        originals: &IndexMap<ElementId, Arc<Element>>,
        batch: &'a HashSet<ElementId>,
    ) -> Self {
        let enclosing = batch
            .iter()
            .filter_map(|id| originals.get(id).and_then(|el| el.frame_id))
            .collect();
        Self {
            scene,
            batch,
            enclosing,
            view: scene.app_state.current_view,
        }
    }

    fn is_live(&self, id: ElementId) -> bool {
        self.scene.get_live(id).is_some()
    }

    /// Drawn, live, outside the batch, and not positioned by anything.
    fn accepts(&self, el: &Element) -> bool {
        if self.batch.contains(&el.id) || self.enclosing.contains(&el.id) {
            return false;
        }
        if !is_drawn(el, self.view) || !self.is_live(el.id) || is_bound_arrow(el) {
            return false;
        }
        !el.kind.as_text().is_some_and(|t| t.container_id.is_some())
    }
}

/// Plan the row layout for a batch whose (offset) bounds are `dragged`.
///
/// Geometry comes from `originals`; `scene` filters out elements deleted
/// since pointer-down and supplies the current view.
pub fn plan_row(
    scene: &Scene,
    originals: &IndexMap<ElementId, Arc<Element>>,
    batch: &HashSet<ElementId>,
    dragged: Rect,
    ratio: f64,
) -> RowPlan {
    let candidates = Candidates::new(scene, originals, batch);
    let row: Vec<&Arc<Element>> = originals
        .values()
        .filter(|el| candidates.accepts(el))
        .filter(|el| in_same_row(dragged, el.bounds(), ratio))
        .collect();
    let row_ids: HashSet<ElementId> = row.iter().map(|el| el.id).collect();
    // Members of a frame in the row travel with their frame.
    let row: Vec<&Arc<Element>> = row
        .into_iter()
        .filter(|el| el.frame_id.is_none_or(|f| !row_ids.contains(&f)))
        .collect();

    let (left, right): (Vec<&Arc<Element>>, Vec<&Arc<Element>>) = row
        .into_iter()
        .partition(|el| el.bounds().center().x <= dragged.x0);

    let mut plan = RowPlan::default();
    if let Some(edge) = left.iter().map(|el| el.bounds().x1).reduce(f64::max) {
        plan.align_dx = edge - dragged.x0;
    }

    let aligned_right = dragged.x1 + plan.align_dx;
    let Some(leftmost) = right.iter().map(|el| el.bounds().x0).reduce(f64::min) else {
        return plan;
    };
    if aligned_right <= leftmost {
        return plan;
    }

    plan.shift = aligned_right - leftmost;
    let frames: HashSet<ElementId> = right
        .iter()
        .filter(|el| el.kind.is_frame())
        .map(|el| el.id)
        .collect();
    let right_ids: HashSet<ElementId> = right.iter().map(|el| el.id).collect();
    plan.shifted = originals
        .values()
        .filter(|el| {
            right_ids.contains(&el.id)
                || (el.frame_id.is_some_and(|f| frames.contains(&f))
                    && !batch.contains(&el.id)
                    && candidates.is_live(el.id)
                    && !is_bound_arrow(el))
        })
        .map(|el| el.id)
        .collect();
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_core::{ElementKind, PointBinding};
    use kurbo::Point;
    use pretty_assertions::assert_eq;

    /// A scene plus its pointer-down copy.
    fn row(elements: Vec<Element>) -> (Scene, IndexMap<ElementId, Arc<Element>>) {
        let scene = Scene::from_elements(elements);
        let originals = scene.iter_live().map(|el| (el.id, el.clone())).collect();
        (scene, originals)
    }

    fn bound_arrow(x: f64, y: f64, to: Point, start: ElementId, end: Option<ElementId>) -> Element {
        let mut arrow = Element::arrow(x, y, vec![Point::ZERO, to]);
        if let ElementKind::Arrow(data) = &mut arrow.kind {
            let binding = |element_id| PointBinding {
                element_id,
                fixed_point: [0.5, 0.5],
                gap: 5.0,
            };
            data.start_binding = Some(binding(start));
            data.end_binding = end.map(binding);
        }
        arrow
    }

    #[test]
    fn row_membership_needs_quarter_overlap() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(in_same_row(a, Rect::new(0.0, 75.0, 50.0, 175.0), 0.25));
        assert!(!in_same_row(a, Rect::new(0.0, 80.0, 50.0, 180.0), 0.25));
        // Zero-height boxes never count.
        assert!(!in_same_row(a, Rect::new(0.0, 50.0, 50.0, 50.0), 0.25));
    }

    #[test]
    fn aligns_left_and_pushes_right() {
        let a = Element::rectangle(0.0, 0.0, 100.0, 50.0);
        let b = Element::rectangle(200.0, 0.0, 100.0, 50.0);
        let c = Element::rectangle(0.0, 300.0, 150.0, 50.0);
        let (a_id, b_id, c_id) = (a.id, b.id, c.id);
        let (scene, snap) = row(vec![a, b, c]);
        let batch = HashSet::from([c_id]);

        let plan = plan_row(&scene, &snap, &batch, Rect::new(90.0, 0.0, 240.0, 50.0), 0.25);
        assert_eq!(plan.align_dx, 10.0);
        assert_eq!(plan.shift, 50.0);
        assert_eq!(plan.shifted, vec![b_id]);
        assert!(!plan.shifted.contains(&a_id));
    }

    #[test]
    fn enough_room_shifts_nothing() {
        let a = Element::rectangle(0.0, 0.0, 100.0, 50.0);
        let b = Element::rectangle(400.0, 0.0, 100.0, 50.0);
        let c = Element::rectangle(0.0, 300.0, 150.0, 50.0);
        let c_id = c.id;
        let (scene, snap) = row(vec![a, b, c]);
        let plan = plan_row(
            &scene,
            &snap,
            &HashSet::from([c_id]),
            Rect::new(120.0, 10.0, 270.0, 60.0),
            0.25,
        );
        assert_eq!(plan.align_dx, -20.0);
        assert!(plan.shifted.is_empty());
    }

    #[test]
    fn lone_left_neighbour_still_aligns() {
        let a = Element::rectangle(0.0, 0.0, 100.0, 50.0);
        let c = Element::rectangle(0.0, 300.0, 150.0, 50.0);
        let c_id = c.id;
        let (scene, snap) = row(vec![a, c]);
        let plan = plan_row(
            &scene,
            &snap,
            &HashSet::from([c_id]),
            Rect::new(130.0, 0.0, 280.0, 50.0),
            0.25,
        );
        assert_eq!(plan.align_dx, -30.0);
        assert_eq!(plan.shift, 0.0);
        assert!(plan.shifted.is_empty());
    }

    #[test]
    fn shifted_frame_takes_its_members() {
        let c = Element::rectangle(0.0, 300.0, 100.0, 100.0);
        let frame = Element::frame(50.0, 0.0, 200.0, 100.0);
        let mut inner = Element::rectangle(60.0, 10.0, 30.0, 30.0);
        inner.frame_id = Some(frame.id);
        let (c_id, frame_id, inner_id) = (c.id, frame.id, inner.id);
        let (scene, snap) = row(vec![c, frame, inner]);

        let plan = plan_row(
            &scene,
            &snap,
            &HashSet::from([c_id]),
            Rect::new(0.0, 0.0, 100.0, 100.0),
            0.25,
        );
        assert_eq!(plan.shift, 50.0);
        assert_eq!(plan.shifted, vec![frame_id, inner_id]);
    }

    #[test]
    fn hidden_and_bound_elements_are_ignored() {
        let mut hidden = Element::rectangle(100.0, 0.0, 100.0, 50.0);
        hidden.hidden = true;
        let c = Element::rectangle(0.0, 300.0, 150.0, 50.0);
        let arrow = bound_arrow(150.0, 25.0, Point::new(50.0, 0.0), c.id, None);
        let c_id = c.id;
        let (scene, snap) = row(vec![hidden, c, arrow]);
        let plan = plan_row(
            &scene,
            &snap,
            &HashSet::from([c_id]),
            Rect::new(0.0, 0.0, 150.0, 50.0),
            0.25,
        );
        assert!(plan.is_noop());
    }

    #[test]
    fn arrows_between_neighbours_do_not_widen_the_push() {
        let a = Element::rectangle(0.0, 0.0, 100.0, 50.0);
        let b = Element::rectangle(200.0, 0.0, 100.0, 50.0);
        let arrow = bound_arrow(100.0, 10.0, Point::new(100.0, 30.0), a.id, Some(b.id));
        let c = Element::rectangle(0.0, 300.0, 150.0, 50.0);
        let (b_id, c_id) = (b.id, c.id);
        let (scene, snap) = row(vec![a, b, arrow, c]);

        let plan = plan_row(
            &scene,
            &snap,
            &HashSet::from([c_id]),
            Rect::new(90.0, 0.0, 240.0, 50.0),
            0.25,
        );
        assert_eq!(plan.align_dx, 10.0);
        assert_eq!(plan.shift, 50.0);
        assert_eq!(plan.shifted, vec![b_id]);
    }

    #[test]
    fn own_frame_is_not_a_neighbour() {
        let frame = Element::frame(0.0, 0.0, 500.0, 300.0);
        let mut child = Element::rectangle(20.0, 20.0, 100.0, 50.0);
        child.frame_id = Some(frame.id);
        let child_id = child.id;
        let (scene, snap) = row(vec![frame, child]);

        let plan = plan_row(
            &scene,
            &snap,
            &HashSet::from([child_id]),
            Rect::new(30.0, 20.0, 130.0, 70.0),
            0.25,
        );
        assert!(plan.is_noop(), "{plan:?}");
    }

    #[test]
    fn deleted_neighbours_are_skipped() {
        let a = Element::rectangle(0.0, 0.0, 100.0, 50.0);
        let b = Element::rectangle(200.0, 0.0, 100.0, 50.0);
        let wide = Element::rectangle(120.0, 0.0, 60.0, 50.0);
        let c = Element::rectangle(0.0, 300.0, 150.0, 50.0);
        let (b_id, wide_id, c_id) = (b.id, wide.id, c.id);
        let (mut scene, snap) = row(vec![a, b, wide, c]);
        scene.delete(wide_id);

        let plan = plan_row(
            &scene,
            &snap,
            &HashSet::from([c_id]),
            Rect::new(90.0, 0.0, 240.0, 50.0),
            0.25,
        );
        assert_eq!(plan.shift, 50.0);
        assert_eq!(plan.shifted, vec![b_id]);
    }
}
