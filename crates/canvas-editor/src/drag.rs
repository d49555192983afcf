//! Drag state machine.
//!
//! `Idle → Armed → Dragging → (commit | cancel) → Idle`.
//!
//! Pointer-down arms a session with a copy of every live element (cheap
//! `Arc` clones). Each pointer move recomputes every position from that
//! copy as `original + offset`, never from the live value, so moving by
//! `O` and then by `-O` lands exactly where the drag started. A pointer
//! move runs, in order: base offset, insert-mode reflow, binding
//! maintenance. The caller drains the change journal into the shape cache
//! afterwards.

use crate::config::EditorConfig;
use crate::history::History;
use crate::reflow::{RowPlan, plan_row};
use canvas_core::binding::{BindingContext, bound_outside, unbind_arrow_end, update_bound_elements};
use canvas_core::geometry::{self, grid_point};
use canvas_core::id::ElementId;
use canvas_core::model::{Element, ElementKind};
use canvas_core::mutate::{ElementUpdate, Scene, same_content};
use canvas_core::text::BOUND_TEXT_PADDING;
use indexmap::{IndexMap, IndexSet};
use kurbo::{Point, Rect, Vec2};
use std::collections::HashSet;
use std::f64::consts::{FRAC_PI_2, PI};
use std::sync::Arc;

/// Angle step for Shift-constrained linear elements.
const SHIFT_LOCKING_ANGLE: f64 = PI / 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    /// Pointer is down on a draggable batch; nothing has moved yet.
    Armed,
    Dragging,
}

/// Per-call drag inputs owned by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DragContext {
    pub insert_mode: bool,
    pub grid_size: Option<f64>,
    /// Offset computed by object snapping; an axis with a zero snap offset
    /// falls back to the grid.
    pub snap_offset: Vec2,
}

#[derive(Debug)]
struct DragSession {
    origin: Point,
    /// Every live element at pointer-down, in z-order.
    originals: IndexMap<ElementId, Arc<Element>>,
    batch: Vec<ElementId>,
    batch_set: HashSet<ElementId>,
    batch_bounds: Rect,
    /// Row neighbours currently pushed aside by insert mode.
    shifted: Vec<ElementId>,
    dragging: bool,
}

#[derive(Debug)]
pub struct DragEngine {
    session: Option<DragSession>,
    row_overlap_ratio: f64,
    text_padding: f64,
}

impl Default for DragEngine {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl DragEngine {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            session: None,
            row_overlap_ratio: config.row_overlap_ratio,
            text_padding: config.bound_text_padding,
        }
    }

    pub fn phase(&self) -> DragPhase {
        match &self.session {
            None => DragPhase::Idle,
            Some(s) if s.dragging => DragPhase::Dragging,
            Some(_) => DragPhase::Armed,
        }
    }

    /// Elements moved by the current session.
    pub fn batch(&self) -> &[ElementId] {
        self.session.as_ref().map_or(&[], |s| s.batch.as_slice())
    }

    /// Neighbours currently pushed aside by insert mode.
    pub fn shifted(&self) -> &[ElementId] {
        self.session.as_ref().map_or(&[], |s| s.shifted.as_slice())
    }

    /// Arm a session for `selected`. Returns `false` (and stays idle) when
    /// nothing in the selection can be dragged.
    pub fn pointer_down(&mut self, scene: &Scene, selected: &[ElementId], origin: Point) -> bool {
        self.session = None;
        let batch = drag_batch(scene, selected);
        if batch.is_empty() {
            return false;
        }
        let originals: IndexMap<ElementId, Arc<Element>> = scene
            .iter_live()
            .map(|el| (el.id, Arc::clone(el)))
            .collect();
        let Some(batch_bounds) =
            geometry::common_bounds(batch.iter().filter_map(|id| originals.get(id)).map(|e| &**e))
        else {
            return false;
        };
        log::trace!("drag armed with {} elements", batch.len());
        self.session = Some(DragSession {
            origin,
            batch_set: batch.iter().copied().collect(),
            originals,
            batch,
            batch_bounds,
            shifted: Vec::new(),
            dragging: false,
        });
        true
    }

    /// Move the batch so that it sits at `pointer`. Returns the ids the
    /// move touched, bound dependents included.
    pub fn pointer_move(&mut self, scene: &mut Scene, pointer: Point, ctx: &DragContext) -> Vec<ElementId> {
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let raw = pointer - session.origin;
        let mut offset = calculate_offset(
            session.batch_bounds.origin(),
            raw,
            ctx.snap_offset,
            ctx.grid_size,
        );
        if !offset.is_finite() {
            log::debug!("skipped drag frame with non-finite offset");
            return Vec::new();
        }
        session.dragging = true;

        let plan = if ctx.insert_mode {
            plan_row(
                scene,
                &session.originals,
                &session.batch_set,
                session.batch_bounds + offset,
                self.row_overlap_ratio,
            )
        } else {
            RowPlan::default()
        };
        offset.x += plan.align_dx;

        let mut touched: IndexSet<ElementId> = IndexSet::new();
        for id in &session.batch {
            if let Some(orig) = session.originals.get(id)
                && move_from(scene, orig, offset)
            {
                touched.insert(*id);
            }
        }
        for id in &plan.shifted {
            if let Some(orig) = session.originals.get(id)
                && move_from(scene, orig, Vec2::new(plan.shift, 0.0))
            {
                touched.insert(*id);
            }
        }

        // Neighbours that no longer need room go back to where they were.
        // One deleted meanwhile stays deleted.
        let now_shifted: HashSet<ElementId> = plan.shifted.iter().copied().collect();
        let released: Vec<&Element> = session
            .shifted
            .iter()
            .filter(|id| !now_shifted.contains(id) && scene.get_live(**id).is_some())
            .filter_map(|id| session.originals.get(id))
            .map(|el| &**el)
            .collect();
        touched.extend(scene.restore_elements(released));
        session.shifted = plan.shifted;

        let moved: Vec<ElementId> = session
            .batch
            .iter()
            .chain(&session.shifted)
            .copied()
            .chain(touched.iter().copied())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect();
        let binding_ctx = BindingContext::with_batch(session.batch.iter().chain(&session.shifted).copied())
            .with_text_padding(self.text_padding);
        touched.extend(update_bound_elements(scene, &moved, &binding_ctx));

        log::trace!(
            "drag to {offset:?}: {} touched, {} shifted",
            touched.len(),
            session.shifted.len()
        );
        touched.into_iter().collect()
    }

    /// Finish the gesture. Arrows in the batch still bound to something
    /// left behind are detached, then the resulting scene goes to
    /// `history` as one step. Returns whether anything was committed.
    pub fn pointer_up(&mut self, scene: &mut Scene, history: &mut dyn History) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        if !session.dragging || !session.changed(scene) {
            return false;
        }
        for id in &session.batch {
            let Some(el) = scene.get_live(*id) else {
                continue;
            };
            for end in bound_outside(&el, &session.batch_set) {
                log::debug!("detaching {id} {end:?} dragged off its target");
                unbind_arrow_end(scene, *id, end);
            }
        }
        history.record(scene.snapshot());
        true
    }

    /// Abort the gesture and put every element back as it was at
    /// pointer-down. Safe to call at any time, any number of times.
    pub fn cancel(&mut self, scene: &mut Scene) -> Vec<ElementId> {
        let Some(session) = self.session.take() else {
            return Vec::new();
        };
        let still_live: Vec<&Element> = session
            .originals
            .values()
            .filter(|el| scene.get_live(el.id).is_some())
            .map(|el| &**el)
            .collect();
        let restored = scene.restore_elements(still_live);
        if !restored.is_empty() {
            log::debug!("drag cancelled, restored {} elements", restored.len());
        }
        restored
    }
}

impl DragSession {
    fn changed(&self, scene: &Scene) -> bool {
        self.originals
            .values()
            .any(|orig| scene.get(orig.id).is_none_or(|cur| !same_content(&cur, orig)))
    }
}

fn move_from(scene: &mut Scene, orig: &Element, offset: Vec2) -> bool {
    let before = scene.get_live(orig.id).map(|e| e.version);
    let after = scene
        .mutate(orig.id, ElementUpdate::position(orig.x + offset.x, orig.y + offset.y))
        .map(|e| e.version);
    before.is_some() && before != after
}

fn is_bound_elbow(el: &Element) -> bool {
    el.kind
        .as_arrow()
        .is_some_and(|a| a.elbowed && (a.start_binding.is_some() || a.end_binding.is_some()))
}

/// The elements a drag of `selected` moves, in z-order.
///
/// - locked and deleted elements stay put;
/// - a lone elbow arrow with any binding is derived, so nothing moves;
/// - an elbow arrow bound at both ends moves only with both targets;
/// - a label moves with its container, never on its own;
/// - frames take their members, containers their labels;
/// - elbow arrows whose both targets move come along.
pub fn drag_batch(scene: &Scene, selected: &[ElementId]) -> Vec<ElementId> {
    let live: Vec<Arc<Element>> = selected
        .iter()
        .filter_map(|id| scene.get_live(*id))
        .filter(|el| !el.locked)
        .collect();
    if let [only] = live.as_slice()
        && is_bound_elbow(only)
    {
        return Vec::new();
    }
    let selected_ids: HashSet<ElementId> = live.iter().map(|el| el.id).collect();

    let mut batch: HashSet<ElementId> = HashSet::new();
    for el in &live {
        if let Some(arrow) = el.kind.as_arrow()
            && arrow.elbowed
            && let (Some(start), Some(end)) = (arrow.start_binding, arrow.end_binding)
            && !(selected_ids.contains(&start.element_id) && selected_ids.contains(&end.element_id))
        {
            continue;
        }
        if let Some(container) = el.kind.as_text().and_then(|t| t.container_id)
            && !selected_ids.contains(&container)
        {
            continue;
        }
        batch.insert(el.id);
    }

    let frames: HashSet<ElementId> = live
        .iter()
        .filter(|el| batch.contains(&el.id) && el.kind.is_frame())
        .map(|el| el.id)
        .collect();
    for el in scene.iter_live() {
        if el.frame_id.is_some_and(|f| frames.contains(&f)) && !el.locked {
            batch.insert(el.id);
        }
    }
    let labels: Vec<ElementId> = batch
        .iter()
        .filter_map(|id| scene.get_live(*id))
        .filter_map(|el| el.bound_text_id())
        .collect();
    batch.extend(labels);
    let follows: Vec<ElementId> = scene
        .iter_live()
        .filter(|el| !batch.contains(&el.id))
        .filter(|el| {
            el.kind.as_arrow().is_some_and(|a| {
                a.elbowed
                    && [a.start_binding, a.end_binding]
                        .iter()
                        .all(|b| b.is_some_and(|b| batch.contains(&b.element_id)))
            })
        })
        .map(|el| el.id)
        .collect();
    batch.extend(follows);

    scene
        .iter_live()
        .filter(|el| batch.contains(&el.id))
        .map(|el| el.id)
        .collect()
}

/// Adjust a raw drag offset for the batch whose top-left is `origin`.
///
/// An axis with a non-zero snap offset uses it; the other axes snap the
/// moved origin to the grid.
pub fn calculate_offset(origin: Point, drag: Vec2, snap: Vec2, grid_size: Option<f64>) -> Vec2 {
    let mut next = origin + drag + snap;
    if snap.x == 0.0 || snap.y == 0.0 {
        let (gx, gy) = grid_point(origin.x + drag.x, origin.y + drag.y, grid_size);
        if snap.x == 0.0 {
            next.x = gx;
        }
        if snap.y == 0.0 {
            next.y = gy;
        }
    }
    next - origin
}

/// Pointer position relative to the top-left of the common bounds of
/// `elements`.
pub fn get_drag_offset_xy<'a>(
    elements: impl IntoIterator<Item = &'a Element>,
    pointer: Point,
) -> Option<Vec2> {
    geometry::common_bounds(elements).map(|bounds| pointer - bounds.origin())
}

/// Modifiers for sizing an element being created by a drag.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NewElementDrag {
    pub maintain_aspect_ratio: bool,
    pub resize_from_center: bool,
    /// Fixed width / height ratio used instead of the square lock.
    pub width_aspect_ratio: Option<f64>,
    pub origin_offset: Option<Vec2>,
}

/// Size locked to the kind's "perfect" proportions. `height` carries the
/// direction of the drag in its sign.
pub(crate) fn perfect_size(kind: &ElementKind, width: f64, height: f64) -> (f64, f64) {
    let abs_width = width.abs();
    let abs_height = height.abs();
    if kind.is_linear() {
        let locked = ((abs_height / abs_width).atan() / SHIFT_LOCKING_ANGLE).round()
            * SHIFT_LOCKING_ANGLE;
        if locked == 0.0 {
            (width, 0.0)
        } else if (locked - FRAC_PI_2).abs() < 1e-9 {
            (0.0, height)
        } else {
            let h = abs_width * locked.tan() * height.signum();
            (width, if h.is_finite() && h != 0.0 { h } else { height })
        }
    } else {
        (width, abs_width * height.signum())
    }
}

/// Size the element `id`, being created by a drag from `origin` to
/// `pointer`. Zero-size results leave the element alone. Returns whether
/// the element changed.
pub fn drag_new_element(
    scene: &mut Scene,
    id: ElementId,
    origin: Point,
    pointer: Point,
    opts: &NewElementDrag,
) -> bool {
    let Some(el) = scene.get_live(id) else {
        return false;
    };
    let (dx, dy) = (pointer.x - origin.x, pointer.y - origin.y);
    let (mut width, mut height) = (dx.abs(), dy.abs());

    if opts.maintain_aspect_ratio {
        if let Some(ratio) = opts.width_aspect_ratio.filter(|r| *r > 0.0) {
            height = width / ratio;
        } else {
            // The dominant axis drives the size so the cursor stays on one side.
            (width, height) = if dy.abs() > dx.abs() {
                perfect_size(&el.kind, height, if dx < 0.0 { -width } else { width })
            } else {
                perfect_size(&el.kind, width, if dy < 0.0 { -height } else { height })
            };
            height = height.abs();
        }
    }

    let mut x = if dx < 0.0 { origin.x - width } else { origin.x };
    let mut y = if dy < 0.0 { origin.y - height } else { origin.y };
    if opts.resize_from_center {
        width *= 2.0;
        height *= 2.0;
        x = origin.x - width / 2.0;
        y = origin.y - height / 2.0;
    }

    if el.kind.as_text().is_some() {
        height = el.height;
        width = width.max(BOUND_TEXT_PADDING * 2.0);
        y = origin.y;
        if opts.resize_from_center {
            x = origin.x - width / 2.0;
        }
    }

    if width == 0.0 || height == 0.0 || !(width.is_finite() && height.is_finite()) {
        return false;
    }
    let shift = opts.origin_offset.unwrap_or(Vec2::ZERO);
    let before = el.version;
    scene
        .mutate(id, ElementUpdate::position(x + shift.x, y + shift.y).with_size(width, height))
        .is_some_and(|after| after.version != before)
}
