//! Binding maintenance.
//!
//! Two relations make an element's geometry derived from another one:
//!
//! - an arrow endpoint bound to a shape (`PointBinding`), resolved as the
//!   anchor ratio projected onto the shape outline plus the gap along the
//!   outward normal,
//! - a text label inside a container (`TextData::container_id`), re-wrapped
//!   and re-aligned inside the container's label area.
//!
//! Targets carry back references in `bound_elements`. Those back references
//! form a dependency graph (target → dependent); [`update_bound_elements`]
//! walks it from the changed elements so that an arrow's label follows the
//! arrow after the arrow followed its target.

use crate::geometry;
use crate::id::ElementId;
use crate::model::{
    ArrowEnd, BoundElement, BoundKind, Element, ElementKind, PointBinding, TextAlign,
    VerticalAlign,
};
use crate::mutate::{ElementUpdate, Scene};
use crate::text;
use kurbo::{Point, Vec2};
use petgraph::graphmap::DiGraphMap;
use smallvec::SmallVec;
use std::collections::{HashSet, VecDeque};

pub use crate::geometry::distance_to_outline;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindingError {
    #[error("element {0} is missing or deleted")]
    Missing(ElementId),
    #[error("element {0} is not an arrow")]
    NotArrow(ElementId),
    #[error("element {0} is not a text element")]
    NotText(ElementId),
    #[error("arrows cannot bind to {0}")]
    NotBindable(ElementId),
    #[error("{0} cannot contain text")]
    NotContainer(ElementId),
    #[error("arrow {0} has fewer than two points")]
    DegenerateArrow(ElementId),
    #[error("non-finite geometry while resolving {0}")]
    NonFinite(ElementId),
}

/// Per-call inputs of [`update_bound_elements`].
#[derive(Debug, Clone)]
pub struct BindingContext {
    /// Elements moved together in the current batch. They are never
    /// recomputed from their targets.
    pub simultaneously_updated: HashSet<ElementId>,
    pub text_padding: f64,
}

impl Default for BindingContext {
    fn default() -> Self {
        Self {
            simultaneously_updated: HashSet::new(),
            text_padding: text::BOUND_TEXT_PADDING,
        }
    }
}

impl BindingContext {
    pub fn with_batch(batch: impl IntoIterator<Item = ElementId>) -> Self {
        Self {
            simultaneously_updated: batch.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn with_text_padding(mut self, padding: f64) -> Self {
        self.text_padding = padding;
        self
    }
}

// ─── Anchors ─────────────────────────────────────────────────────────────

/// A resolved binding: where the endpoint goes and which way the outline
/// faces there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub point: Point,
    pub normal: Vec2,
}

/// Resolve `binding` against the current geometry of `target`.
///
/// The ratio point inside the unrotated box defines a ray from the center;
/// where the ray leaves the outline is pushed out by the gap along the
/// normal, then the whole thing is rotated with the target.
pub fn resolve_anchor(target: &Element, binding: &PointBinding) -> Option<Anchor> {
    let outline = geometry::outline_of(&target.kind)?;
    let rect = target.rect();
    let center = rect.center();
    let [fx, fy] = binding.fixed_point;
    let ratio_point = Point::new(rect.x0 + fx * rect.width(), rect.y0 + fy * rect.height());
    let (q, normal) = geometry::outline_hit(outline, rect, ratio_point - center);
    let local = q + normal * binding.gap;

    let point = geometry::rotate_point(local, center, target.angle);
    let normal = geometry::rotate_point(normal.to_point(), Point::ORIGIN, target.angle).to_vec2();
    geometry::is_finite_point(point).then_some(Anchor { point, normal })
}

/// Anchor ratio of a scene point relative to `target`'s unrotated box.
pub fn fixed_point_for(target: &Element, p: Point) -> [f64; 2] {
    let rect = target.rect();
    let local = geometry::rotate_point(p, rect.center(), -target.angle);
    let ratio = |v: f64, origin: f64, size: f64| {
        if size > f64::EPSILON {
            (v - origin) / size
        } else {
            0.5
        }
    };
    [
        ratio(local.x, rect.x0, rect.width()),
        ratio(local.y, rect.y0, rect.height()),
    ]
}

// ─── Elbow routing ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    Horizontal,
    Vertical,
}

impl Heading {
    fn of(v: Vec2) -> Self {
        if v.x.abs() >= v.y.abs() {
            Heading::Horizontal
        } else {
            Heading::Vertical
        }
    }
}

/// Orthogonal route from `start` to `end`, leaving and entering along the
/// given headings. Consecutive duplicates and collinear corners are
/// removed, so a straight connection is just two points.
pub fn route_elbow(start: Point, start_heading: Heading, end: Point, end_heading: Heading) -> Vec<Point> {
    let mut points = match (start_heading, end_heading) {
        (Heading::Horizontal, Heading::Horizontal) => {
            let mx = (start.x + end.x) / 2.0;
            vec![start, Point::new(mx, start.y), Point::new(mx, end.y), end]
        }
        (Heading::Vertical, Heading::Vertical) => {
            let my = (start.y + end.y) / 2.0;
            vec![start, Point::new(start.x, my), Point::new(end.x, my), end]
        }
        (Heading::Horizontal, Heading::Vertical) => vec![start, Point::new(end.x, start.y), end],
        (Heading::Vertical, Heading::Horizontal) => vec![start, Point::new(start.x, end.y), end],
    };
    points.dedup_by(|a, b| (*a - *b).hypot() < 1e-9);
    simplify_collinear(&mut points);
    points
}

fn simplify_collinear(points: &mut Vec<Point>) {
    let mut i = 1;
    while i + 1 < points.len() {
        let (a, b, c) = (points[i - 1], points[i], points[i + 1]);
        let collinear = ((b.x - a.x).abs() < 1e-9 && (c.x - b.x).abs() < 1e-9)
            || ((b.y - a.y).abs() < 1e-9 && (c.y - b.y).abs() < 1e-9);
        if collinear {
            points.remove(i);
        } else {
            i += 1;
        }
    }
}

// ─── Per-element recompute ───────────────────────────────────────────────

fn refers_to(dependent: &Element, target: ElementId, kind: BoundKind) -> bool {
    match kind {
        BoundKind::Arrow => dependent
            .kind
            .as_arrow()
            .is_some_and(|a| a.is_bound_to(target)),
        BoundKind::Text => dependent
            .kind
            .as_text()
            .is_some_and(|t| t.container_id == Some(target)),
    }
}

/// Drop references from `id` to elements that are gone or no longer
/// point back. Returns whether anything was repaired.
pub fn repair_references(scene: &mut Scene, id: ElementId) -> bool {
    let Some(el) = scene.get_live(id) else {
        return false;
    };
    let mut update = ElementUpdate::default();

    let kept: SmallVec<[BoundElement; 2]> = el
        .bound_elements
        .iter()
        .copied()
        .filter(|b| {
            scene
                .store()
                .get_live(b.id)
                .is_some_and(|dep| refers_to(dep, id, b.kind))
        })
        .collect();
    if kept.len() != el.bound_elements.len() {
        log::debug!(
            "pruned {} stale bound elements from {id}",
            el.bound_elements.len() - kept.len()
        );
        update.bound_elements = Some(kept);
    }

    let dead = |target: ElementId| scene.get_live(target).is_none();
    match &el.kind {
        ElementKind::Arrow(data) => {
            if data.start_binding.is_some_and(|b| dead(b.element_id)) {
                log::debug!("pruned dangling start binding of {id}");
                update.start_binding = Some(None);
            }
            if data.end_binding.is_some_and(|b| dead(b.element_id)) {
                log::debug!("pruned dangling end binding of {id}");
                update.end_binding = Some(None);
            }
        }
        ElementKind::Text(data) => {
            if data.container_id.is_some_and(dead) {
                log::debug!("pruned dangling container of {id}");
                update.container_id = Some(None);
            }
        }
        ElementKind::Rectangle
        | ElementKind::Diamond
        | ElementKind::Ellipse
        | ElementKind::Frame { .. }
        | ElementKind::Cuboid
        | ElementKind::FreeDraw
        | ElementKind::Line => {}
    }
    if el.frame_id.is_some_and(dead) {
        update.frame_id = Some(None);
    }

    if update.is_empty() {
        return false;
    }
    scene.mutate(id, update);
    true
}

/// Recompute both endpoints of an arrow from its current targets. Elbow
/// arrows are re-routed in full.
pub fn update_arrow(scene: &mut Scene, arrow_id: ElementId) -> Result<bool, BindingError> {
    let arrow = scene
        .get_live(arrow_id)
        .ok_or(BindingError::Missing(arrow_id))?;
    let data = arrow
        .kind
        .as_arrow()
        .ok_or(BindingError::NotArrow(arrow_id))?;
    let mut points = geometry::absolute_points(&arrow);
    if points.len() < 2 {
        return Err(BindingError::DegenerateArrow(arrow_id));
    }

    let mut anchors: [Option<Anchor>; 2] = [None, None];
    for (slot, end) in [ArrowEnd::Start, ArrowEnd::End].into_iter().enumerate() {
        let Some(binding) = data.binding(end) else {
            continue;
        };
        let Some(target) = scene.get_live(binding.element_id) else {
            continue;
        };
        let anchor =
            resolve_anchor(&target, binding).ok_or(BindingError::NonFinite(binding.element_id))?;
        let last = points.len() - 1;
        points[if slot == 0 { 0 } else { last }] = anchor.point;
        anchors[slot] = Some(anchor);
    }

    if data.elbowed {
        let (start, end) = (points[0], points[points.len() - 1]);
        let fallback = Heading::of(end - start);
        let start_heading = anchors[0].map_or(fallback, |a| Heading::of(a.normal));
        let end_heading = anchors[1].map_or(fallback, |a| Heading::of(a.normal));
        points = route_elbow(start, start_heading, end, end_heading);
    }

    if !points.iter().all(|p| geometry::is_finite_point(*p)) {
        return Err(BindingError::NonFinite(arrow_id));
    }
    let (origin, local) = geometry::normalize_points(&points);
    let before = arrow.version;
    let after = scene.mutate(
        arrow_id,
        ElementUpdate::position(origin.x, origin.y)
            .with_points(local)
            .with_angle(0.0),
    );
    Ok(after.is_some_and(|a| a.version != before))
}

/// Re-lay out a bound label inside its container.
pub fn update_label(scene: &mut Scene, text_id: ElementId, padding: f64) -> Result<bool, BindingError> {
    let label = scene
        .get_live(text_id)
        .ok_or(BindingError::Missing(text_id))?;
    let data = label
        .kind
        .as_text()
        .ok_or(BindingError::NotText(text_id))?;
    let Some(container_id) = data.container_id else {
        return Ok(false);
    };
    let container = scene
        .get_live(container_id)
        .ok_or(BindingError::Missing(container_id))?;

    let update = text::layout_in_container(&container, &label, data, padding);
    let before = label.version;
    let after = scene.mutate(text_id, update);
    Ok(after.is_some_and(|l| l.version != before))
}

// ─── Maintenance ─────────────────────────────────────────────────────────

/// Target → dependent edges from validated back references.
fn dependency_graph(scene: &Scene) -> DiGraphMap<ElementId, BoundKind> {
    let mut graph = DiGraphMap::new();
    for el in scene.iter_live() {
        graph.add_node(el.id);
        for b in &el.bound_elements {
            let valid = scene
                .store()
                .get_live(b.id)
                .is_some_and(|dep| refers_to(dep, el.id, b.kind));
            if valid {
                graph.add_edge(el.id, b.id, b.kind);
            }
        }
    }
    graph
}

/// Bring every element bound to `sources` (transitively) back in line with
/// the current geometry.
///
/// Members of `ctx.simultaneously_updated` are never recomputed. Each
/// dependent is recomputed once, after everything it depends on. A failure
/// for one dependent is logged and the rest carry on.
///
/// Returns the ids that changed.
pub fn update_bound_elements(
    scene: &mut Scene,
    sources: &[ElementId],
    ctx: &BindingContext,
) -> Vec<ElementId> {
    for &id in sources {
        repair_references(scene, id);
    }

    let graph = dependency_graph(scene);
    let mut reached: HashSet<ElementId> = HashSet::new();
    let mut bfs_order = Vec::new();
    let mut queue: VecDeque<ElementId> = sources
        .iter()
        .copied()
        .filter(|id| graph.contains_node(*id))
        .collect();
    // Sources outside the batch may themselves depend on another source.
    let mut seen: HashSet<ElementId> = HashSet::new();
    while let Some(node) = queue.pop_front() {
        for dep in graph.neighbors(node) {
            if !seen.insert(dep) || ctx.simultaneously_updated.contains(&dep) {
                continue;
            }
            reached.insert(dep);
            bfs_order.push(dep);
            queue.push_back(dep);
        }
    }

    let order = match petgraph::algo::toposort(&graph, None) {
        Ok(sorted) => sorted.into_iter().filter(|id| reached.contains(id)).collect(),
        Err(cycle) => {
            log::debug!("binding cycle through {}, using walk order", cycle.node_id());
            bfs_order
        }
    };

    let mut changed = Vec::new();
    for id in order {
        repair_references(scene, id);
        let Some(el) = scene.get_live(id) else {
            continue;
        };
        let result = match &el.kind {
            ElementKind::Arrow(_) => update_arrow(scene, id),
            ElementKind::Text(_) => update_label(scene, id, ctx.text_padding),
            _ => Ok(false),
        };
        match result {
            Ok(true) => changed.push(id),
            Ok(false) => {}
            Err(err) => log::debug!("binding update of {id} skipped: {err}"),
        }
    }
    changed
}

// ─── Binding operations ──────────────────────────────────────────────────

fn add_back_reference(scene: &mut Scene, target: ElementId, entry: BoundElement) {
    let Some(el) = scene.get_live(target) else {
        return;
    };
    if el.bound_elements.contains(&entry) {
        return;
    }
    let mut bound = el.bound_elements.clone();
    bound.push(entry);
    scene.mutate(
        target,
        ElementUpdate {
            bound_elements: Some(bound),
            ..ElementUpdate::default()
        },
    );
}

fn remove_back_reference(scene: &mut Scene, target: ElementId, entry: BoundElement) {
    let Some(el) = scene.get(target) else {
        return;
    };
    if !el.bound_elements.contains(&entry) {
        return;
    }
    let bound = el
        .bound_elements
        .iter()
        .copied()
        .filter(|b| *b != entry)
        .collect();
    scene.mutate(
        target,
        ElementUpdate {
            bound_elements: Some(bound),
            ..ElementUpdate::default()
        },
    );
}

/// Bind one end of an arrow with an explicit anchor, then snap the
/// endpoint onto the target.
pub fn bind_arrow_at(
    scene: &mut Scene,
    arrow_id: ElementId,
    end: ArrowEnd,
    binding: PointBinding,
) -> Result<(), BindingError> {
    let arrow = scene
        .get_live(arrow_id)
        .ok_or(BindingError::Missing(arrow_id))?;
    let data = arrow
        .kind
        .as_arrow()
        .ok_or(BindingError::NotArrow(arrow_id))?;
    let target = scene
        .get_live(binding.element_id)
        .ok_or(BindingError::Missing(binding.element_id))?;
    if !target.kind.is_bindable() || target.id == arrow_id {
        return Err(BindingError::NotBindable(target.id));
    }

    if data.binding(end).is_some() {
        unbind_arrow_end(scene, arrow_id, end);
    }
    let update = match end {
        ArrowEnd::Start => ElementUpdate {
            start_binding: Some(Some(binding)),
            ..ElementUpdate::default()
        },
        ArrowEnd::End => ElementUpdate {
            end_binding: Some(Some(binding)),
            ..ElementUpdate::default()
        },
    };
    scene.mutate(arrow_id, update);
    add_back_reference(
        scene,
        binding.element_id,
        BoundElement {
            id: arrow_id,
            kind: BoundKind::Arrow,
        },
    );
    update_arrow(scene, arrow_id)?;
    Ok(())
}

/// Bind one end of an arrow to `target_id`, anchoring at the point the
/// endpoint currently points at.
pub fn bind_arrow(
    scene: &mut Scene,
    arrow_id: ElementId,
    end: ArrowEnd,
    target_id: ElementId,
    gap: f64,
) -> Result<PointBinding, BindingError> {
    let arrow = scene
        .get_live(arrow_id)
        .ok_or(BindingError::Missing(arrow_id))?;
    let target = scene
        .get_live(target_id)
        .ok_or(BindingError::Missing(target_id))?;
    let points = geometry::absolute_points(&arrow);
    let endpoint = match end {
        ArrowEnd::Start => points.first(),
        ArrowEnd::End => points.last(),
    }
    .copied()
    .ok_or(BindingError::DegenerateArrow(arrow_id))?;

    let binding = PointBinding {
        element_id: target_id,
        fixed_point: fixed_point_for(&target, endpoint),
        gap: gap.max(0.0),
    };
    bind_arrow_at(scene, arrow_id, end, binding)?;
    Ok(binding)
}

/// Detach one end of an arrow. Returns whether it was bound.
pub fn unbind_arrow_end(scene: &mut Scene, arrow_id: ElementId, end: ArrowEnd) -> bool {
    let Some(arrow) = scene.get_live(arrow_id) else {
        return false;
    };
    let Some(data) = arrow.kind.as_arrow() else {
        return false;
    };
    let Some(binding) = data.binding(end).copied() else {
        return false;
    };
    let other = match end {
        ArrowEnd::Start => data.end_binding,
        ArrowEnd::End => data.start_binding,
    };

    let update = match end {
        ArrowEnd::Start => ElementUpdate {
            start_binding: Some(None),
            ..ElementUpdate::default()
        },
        ArrowEnd::End => ElementUpdate {
            end_binding: Some(None),
            ..ElementUpdate::default()
        },
    };
    scene.mutate(arrow_id, update);

    if other.is_none_or(|o| o.element_id != binding.element_id) {
        remove_back_reference(
            scene,
            binding.element_id,
            BoundElement {
                id: arrow_id,
                kind: BoundKind::Arrow,
            },
        );
    }
    true
}

/// Make `text_id` the label of `container_id`, centred, and lay it out.
/// A previous label of the container becomes free-standing text.
pub fn bind_text_to_container(
    scene: &mut Scene,
    text_id: ElementId,
    container_id: ElementId,
    padding: f64,
) -> Result<(), BindingError> {
    let label = scene
        .get_live(text_id)
        .ok_or(BindingError::Missing(text_id))?;
    let data = label.kind.as_text().ok_or(BindingError::NotText(text_id))?;
    let container = scene
        .get_live(container_id)
        .ok_or(BindingError::Missing(container_id))?;
    if !container.kind.is_text_container() {
        return Err(BindingError::NotContainer(container_id));
    }

    if let Some(previous) = data.container_id.filter(|c| *c != container_id) {
        remove_back_reference(
            scene,
            previous,
            BoundElement {
                id: text_id,
                kind: BoundKind::Text,
            },
        );
    }
    if let Some(old_label) = container.bound_text_id().filter(|t| *t != text_id) {
        remove_back_reference(
            scene,
            container_id,
            BoundElement {
                id: old_label,
                kind: BoundKind::Text,
            },
        );
        scene.mutate(
            old_label,
            ElementUpdate {
                container_id: Some(None),
                ..ElementUpdate::default()
            },
        );
    }

    scene.mutate(
        text_id,
        ElementUpdate {
            container_id: Some(Some(container_id)),
            text_align: Some(TextAlign::Center),
            vertical_align: Some(VerticalAlign::Middle),
            ..ElementUpdate::default()
        },
    );
    add_back_reference(
        scene,
        container_id,
        BoundElement {
            id: text_id,
            kind: BoundKind::Text,
        },
    );
    update_label(scene, text_id, padding)?;
    Ok(())
}

/// Ends of `arrow` bound to something outside `batch`.
pub fn bound_outside(arrow: &Element, batch: &HashSet<ElementId>) -> Vec<ArrowEnd> {
    let Some(data) = arrow.kind.as_arrow() else {
        return Vec::new();
    };
    [ArrowEnd::Start, ArrowEnd::End]
        .into_iter()
        .filter(|end| {
            data.binding(*end)
                .is_some_and(|b| !batch.contains(&b.element_id))
        })
        .collect()
}
