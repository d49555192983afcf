//! Mutation gateway.
//!
//! [`Scene`] owns the element store and is the only producer of new element
//! values. Every change goes through [`Scene::mutate`], which
//!
//! - copies the current `Arc<Element>`, applies the [`ElementUpdate`],
//! - bumps `version`, refreshes `version_nonce`, stamps `updated`,
//! - swaps the new value into the store (old `Arc`s held elsewhere are
//!   untouched),
//! - appends a [`ChangeRecord`] to the change journal.
//!
//! The journal is what keeps the shape cache honest: the editor drains it
//! after each interaction step and hands the records to the cache, which
//! drops shape-dirty entries and re-tags the rest.

use crate::cuboid::DualView;
use crate::geometry;
use crate::id::ElementId;
use crate::model::{
    BoundElement, Element, ElementKind, ElementStyle, PointBinding, TextAlign, VerticalAlign,
};
use crate::snapshot::{AppState, SceneSnapshot};
use crate::store::ElementStore;
use kurbo::Point;
use smallvec::SmallVec;
use std::collections::HashSet;
use std::sync::Arc;

// ─── Updates ─────────────────────────────────────────────────────────────

/// Partial set of field changes. `None` leaves a field alone; the nested
/// `Option`s distinguish "leave alone" from "clear".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementUpdate {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub angle: Option<f64>,
    pub points: Option<Vec<Point>>,
    pub style: Option<ElementStyle>,
    pub seed: Option<u32>,

    pub frame_id: Option<Option<ElementId>>,
    pub bound_elements: Option<SmallVec<[BoundElement; 2]>>,
    pub start_binding: Option<Option<PointBinding>>,
    pub end_binding: Option<Option<PointBinding>>,
    pub elbowed: Option<bool>,

    pub text: Option<String>,
    pub original_text: Option<String>,
    pub font_size: Option<f64>,
    pub text_align: Option<TextAlign>,
    pub vertical_align: Option<VerticalAlign>,
    pub container_id: Option<Option<ElementId>>,

    pub dual_view: Option<Option<DualView>>,
    pub locked: Option<bool>,
    pub hidden: Option<bool>,
    pub link: Option<Option<String>>,
}

impl ElementUpdate {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_points(mut self, points: Vec<Point>) -> Self {
        self.points = Some(points);
        self
    }

    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = Some(angle);
        self
    }

    pub fn with_style(mut self, style: ElementStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn hidden(hidden: bool) -> Self {
        Self {
            hidden: Some(hidden),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One entry of the change journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRecord {
    pub id: ElementId,
    /// Version of the element after the change.
    pub version: u32,
    /// Whether the change affects the generated shape (as opposed to
    /// placement or non-visual fields).
    pub shape_dirty: bool,
}

/// Fields that feed shape generation. Position and angle are placement.
fn shape_eq(a: &Element, b: &Element) -> bool {
    a.width == b.width
        && a.height == b.height
        && a.points == b.points
        && a.style == b.style
        && a.seed == b.seed
        && kind_shape_eq(&a.kind, &b.kind)
}

fn kind_shape_eq(a: &ElementKind, b: &ElementKind) -> bool {
    match (a, b) {
        (ElementKind::Arrow(x), ElementKind::Arrow(y)) => {
            x.elbowed == y.elbowed
                && x.start_arrowhead == y.start_arrowhead
                && x.end_arrowhead == y.end_arrowhead
        }
        (ElementKind::Text(x), ElementKind::Text(y)) => {
            x.text == y.text
                && x.font_size == y.font_size
                && x.line_height == y.line_height
                && x.text_align == y.text_align
        }
        _ => a == b,
    }
}

/// Equal apart from the version bookkeeping fields.
pub fn same_content(a: &Element, b: &Element) -> bool {
    a.id == b.id
        && a.kind == b.kind
        && a.x == b.x
        && a.y == b.y
        && a.width == b.width
        && a.height == b.height
        && a.angle == b.angle
        && a.points == b.points
        && a.style == b.style
        && a.seed == b.seed
        && a.is_deleted == b.is_deleted
        && a.frame_id == b.frame_id
        && a.bound_elements == b.bound_elements
        && a.locked == b.locked
        && a.hidden == b.hidden
        && a.link == b.link
        && a.dual_view == b.dual_view
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|v| v.is_finite())
}

/// Apply `update` to `el`. Non-finite numbers are dropped, sizes are
/// clamped to be non-negative.
fn apply_update(el: &mut Element, update: ElementUpdate) {
    if let Some(x) = finite(update.x) {
        el.x = x;
    }
    if let Some(y) = finite(update.y) {
        el.y = y;
    }
    if let Some(angle) = finite(update.angle) {
        el.angle = angle;
    }
    if let Some(w) = finite(update.width) {
        el.width = w.max(0.0);
    }
    if let Some(h) = finite(update.height) {
        el.height = h.max(0.0);
    }
    if let Some(points) = update.points {
        if points.iter().all(|p| geometry::is_finite_point(*p)) {
            el.points = points;
        } else {
            log::debug!("dropped non-finite points for {}", el.id);
        }
    }
    if el.kind.is_linear() {
        let (w, h) = geometry::points_extent(&el.points);
        el.width = w;
        el.height = h;
    }
    if let Some(style) = update.style {
        el.style = style;
    }
    if let Some(seed) = update.seed {
        el.seed = seed;
    }
    if let Some(frame_id) = update.frame_id {
        el.frame_id = frame_id;
    }
    if let Some(bound) = update.bound_elements {
        el.bound_elements = bound;
    }

    match &mut el.kind {
        ElementKind::Arrow(data) => {
            if let Some(b) = update.start_binding {
                data.start_binding = b;
            }
            if let Some(b) = update.end_binding {
                data.end_binding = b;
            }
            if let Some(elbowed) = update.elbowed {
                data.elbowed = elbowed;
            }
        }
        ElementKind::Text(data) => {
            if let Some(text) = update.text {
                data.text = text;
            }
            if let Some(text) = update.original_text {
                data.original_text = text;
            }
            if let Some(size) = finite(update.font_size).filter(|s| *s > 0.0) {
                data.font_size = size;
            }
            if let Some(align) = update.text_align {
                data.text_align = align;
            }
            if let Some(align) = update.vertical_align {
                data.vertical_align = align;
            }
            if let Some(container) = update.container_id {
                data.container_id = container;
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

    if let Some(dual_view) = update.dual_view {
        el.dual_view = dual_view;
    }
    if let Some(locked) = update.locked {
        el.locked = locked;
    }
    if let Some(hidden) = update.hidden {
        el.hidden = hidden;
    }
    if let Some(link) = update.link {
        el.link = link;
    }
}

fn sanitize(el: &mut Element) {
    for v in [&mut el.x, &mut el.y, &mut el.angle] {
        if !v.is_finite() {
            *v = 0.0;
        }
    }
    for v in [&mut el.width, &mut el.height] {
        if !v.is_finite() || *v < 0.0 {
            *v = 0.0;
        }
    }
    el.points.retain(|p| geometry::is_finite_point(*p));
}

fn stamp(el: &mut Element, version: u32) {
    el.version = version;
    el.version_nonce = rand::random();
    el.updated = chrono::Utc::now().timestamp_millis();
}

// ─── Scene ───────────────────────────────────────────────────────────────

/// The element store together with its change journal.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    store: ElementStore,
    journal: Vec<ChangeRecord>,
    pub app_state: AppState,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a scene from elements given back to front.
    pub fn from_elements(elements: impl IntoIterator<Item = Element>) -> Self {
        let mut scene = Self::new();
        for el in elements {
            scene.insert(el);
        }
        scene.journal.clear();
        scene
    }

    pub fn store(&self) -> &ElementStore {
        &self.store
    }

    /// Any element, tombstones included.
    pub fn get(&self, id: ElementId) -> Option<Arc<Element>> {
        self.store.get(id).cloned()
    }

    /// Live element only.
    pub fn get_live(&self, id: ElementId) -> Option<Arc<Element>> {
        self.store.get_live(id).cloned()
    }

    pub fn iter_live(&self) -> impl DoubleEndedIterator<Item = &Arc<Element>> {
        self.store.iter_live()
    }

    /// Add a new element on top of the z-order.
    pub fn insert(&mut self, mut element: Element) -> Arc<Element> {
        sanitize(&mut element);
        if let Some(existing) = self.store.get(element.id) {
            log::warn!("insert of existing id {}, replacing", element.id);
            let version = existing.version.max(element.version) + 1;
            stamp(&mut element, version);
        }
        let element = Arc::new(element);
        self.journal.push(ChangeRecord {
            id: element.id,
            version: element.version,
            shape_dirty: true,
        });
        self.store.insert(Arc::clone(&element));
        element
    }

    /// Apply `update` to the element `id`.
    ///
    /// Returns the element value after the update. Unknown ids return
    /// `None`; tombstones and no-op updates return the current value
    /// without bumping the version.
    pub fn mutate(&mut self, id: ElementId, update: ElementUpdate) -> Option<Arc<Element>> {
        let Some(current) = self.store.get(id) else {
            log::debug!("mutate of unknown element {id}");
            return None;
        };
        if current.is_deleted {
            log::warn!("ignored update to deleted element {id}");
            return Some(Arc::clone(current));
        }

        let mut next = (**current).clone();
        apply_update(&mut next, update);
        if same_content(&next, current) {
            return Some(Arc::clone(current));
        }

        let shape_dirty = !shape_eq(&next, current);
        stamp(&mut next, current.version + 1);
        Some(self.commit(next, shape_dirty))
    }

    fn commit(&mut self, next: Element, shape_dirty: bool) -> Arc<Element> {
        log::trace!("{} -> v{} (shape_dirty={shape_dirty})", next.id, next.version);
        let next = Arc::new(next);
        self.journal.push(ChangeRecord {
            id: next.id,
            version: next.version,
            shape_dirty,
        });
        self.store.replace(Arc::clone(&next));
        next
    }

    fn set_deleted(&mut self, id: ElementId, deleted: bool) -> bool {
        let Some(current) = self.store.get(id) else {
            return false;
        };
        if current.is_deleted == deleted {
            return false;
        }
        let mut next = (**current).clone();
        next.is_deleted = deleted;
        stamp(&mut next, current.version + 1);
        self.commit(next, false);
        true
    }

    /// Tombstone an element together with its bound label.
    /// Returns the ids actually tombstoned.
    pub fn delete(&mut self, id: ElementId) -> Vec<ElementId> {
        let Some(current) = self.get_live(id) else {
            return Vec::new();
        };
        let mut deleted = Vec::new();
        if self.set_deleted(id, true) {
            deleted.push(id);
        }
        if let Some(text_id) = current.bound_text_id()
            && self.set_deleted(text_id, true)
        {
            deleted.push(text_id);
        }
        deleted
    }

    /// Bring a tombstoned element (and its label) back.
    pub fn restore(&mut self, id: ElementId) -> bool {
        let restored = self.set_deleted(id, false);
        if restored
            && let Some(text_id) = self.get(id).and_then(|el| el.bound_text_id())
        {
            self.set_deleted(text_id, false);
        }
        restored
    }

    /// Take all journal entries recorded since the last drain.
    pub fn drain_changes(&mut self) -> Vec<ChangeRecord> {
        std::mem::take(&mut self.journal)
    }

    pub fn pending_changes(&self) -> &[ChangeRecord] {
        &self.journal
    }

    /// Serializable copy of the whole scene, tombstones included.
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            elements: self.store.iter().map(|e| (**e).clone()).collect(),
            app_state: self.app_state.clone(),
        }
    }

    /// Make the scene match `snapshot`.
    ///
    /// Elements that differ take the snapshot's content with a version
    /// past both the current and the snapshot version. Live elements the
    /// snapshot does not know are tombstoned. Z-order follows the snapshot.
    pub fn apply_snapshot(&mut self, snapshot: &SceneSnapshot) {
        let known: HashSet<ElementId> = snapshot.elements.iter().map(|e| e.id).collect();

        for target in &snapshot.elements {
            self.restore_content(target);
        }

        let orphans: Vec<ElementId> = self
            .store
            .iter_live()
            .filter(|e| !known.contains(&e.id))
            .map(|e| e.id)
            .collect();
        for id in orphans {
            self.set_deleted(id, true);
        }

        let order: Vec<ElementId> = snapshot.elements.iter().map(|e| e.id).collect();
        self.store.reorder(&order);
        self.app_state = snapshot.app_state.clone();
    }

    /// Put each of `originals` back as it was, leaving the rest of the
    /// scene alone. Returns the ids that changed.
    pub fn restore_elements<'a>(
        &mut self,
        originals: impl IntoIterator<Item = &'a Element>,
    ) -> Vec<ElementId> {
        originals
            .into_iter()
            .filter(|target| self.restore_content(target))
            .map(|target| target.id)
            .collect()
    }

    /// Give `target.id` the content of `target` with a version past both.
    fn restore_content(&mut self, target: &Element) -> bool {
        match self.store.get(target.id) {
            Some(current) if same_content(current, target) => false,
            Some(current) => {
                let shape_dirty = !shape_eq(current, target);
                let version = current.version.max(target.version) + 1;
                let mut next = target.clone();
                sanitize(&mut next);
                stamp(&mut next, version);
                self.commit(next, shape_dirty);
                true
            }
            None => {
                self.insert(target.clone());
                true
            }
        }
    }

    /// Remove tombstones older than `before_ms`; returns their ids so the
    /// shape cache can release them.
    pub fn purge_deleted(&mut self, before_ms: i64) -> Vec<ElementId> {
        self.store.purge_deleted(before_ms)
    }

    pub fn send_backward(&mut self, id: ElementId) -> bool {
        self.store.send_backward(id)
    }

    pub fn bring_forward(&mut self, id: ElementId) -> bool {
        self.store.bring_forward(id)
    }

    pub fn send_to_back(&mut self, id: ElementId) -> bool {
        self.store.send_to_back(id)
    }

    pub fn bring_to_front(&mut self, id: ElementId) -> bool {
        self.store.bring_to_front(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Color;
    use pretty_assertions::assert_eq;

    #[test]
    fn mutate_bumps_version_and_keeps_old_value() {
        let mut scene = Scene::new();
        let rect = scene.insert(Element::rectangle(0.0, 0.0, 100.0, 50.0));
        scene.drain_changes();

        let moved = scene
            .mutate(rect.id, ElementUpdate::position(10.0, 20.0))
            .unwrap();
        assert_eq!(moved.version, rect.version + 1);
        assert_eq!((moved.x, moved.y), (10.0, 20.0));
        assert_eq!((rect.x, rect.y), (0.0, 0.0), "old Arc untouched");

        let changes = scene.drain_changes();
        assert_eq!(
            changes,
            vec![ChangeRecord {
                id: rect.id,
                version: moved.version,
                shape_dirty: false,
            }]
        );
    }

    #[test]
    fn size_and_style_are_shape_dirty() {
        let mut scene = Scene::new();
        let rect = scene.insert(Element::rectangle(0.0, 0.0, 100.0, 50.0));
        scene.drain_changes();

        scene.mutate(rect.id, ElementUpdate::default().with_size(120.0, 50.0));
        let mut style = rect.style.clone();
        style.stroke_color = Color::rgba(1.0, 0.0, 0.0, 1.0);
        scene.mutate(rect.id, ElementUpdate::default().with_style(style));
        scene.mutate(
            rect.id,
            ElementUpdate {
                locked: Some(true),
                ..ElementUpdate::default()
            },
        );

        let dirty: Vec<bool> = scene.drain_changes().iter().map(|c| c.shape_dirty).collect();
        assert_eq!(dirty, vec![true, true, false]);
    }

    #[test]
    fn noop_update_keeps_version() {
        let mut scene = Scene::new();
        let rect = scene.insert(Element::rectangle(5.0, 5.0, 10.0, 10.0));
        let same = scene.mutate(rect.id, ElementUpdate::position(5.0, 5.0)).unwrap();
        assert!(Arc::ptr_eq(&rect, &same));
    }

    #[test]
    fn non_finite_and_negative_values_are_repaired() {
        let mut scene = Scene::new();
        let rect = scene.insert(Element::rectangle(5.0, 5.0, 10.0, 10.0));
        let next = scene
            .mutate(
                rect.id,
                ElementUpdate {
                    x: Some(f64::NAN),
                    y: Some(7.0),
                    width: Some(-3.0),
                    height: Some(f64::INFINITY),
                    ..ElementUpdate::default()
                },
            )
            .unwrap();
        assert_eq!((next.x, next.y), (5.0, 7.0));
        assert_eq!((next.width, next.height), (0.0, 10.0));
    }

    #[test]
    fn update_to_tombstone_is_ignored() {
        let mut scene = Scene::new();
        let rect = scene.insert(Element::rectangle(0.0, 0.0, 10.0, 10.0));
        assert_eq!(scene.delete(rect.id), vec![rect.id]);
        let dead = scene.get(rect.id).unwrap();

        let after = scene
            .mutate(rect.id, ElementUpdate::position(50.0, 50.0))
            .unwrap();
        assert_eq!(after.version, dead.version);
        assert_eq!(after.x, 0.0);
        assert!(scene.mutate(ElementId::intern("nope"), ElementUpdate::default()).is_none());
    }

    #[test]
    fn linear_points_drive_extent() {
        let mut scene = Scene::new();
        let line = scene.insert(Element::line(
            0.0,
            0.0,
            vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)],
        ));
        let next = scene
            .mutate(
                line.id,
                ElementUpdate::default()
                    .with_points(vec![Point::new(0.0, 0.0), Point::new(40.0, -20.0)]),
            )
            .unwrap();
        assert_eq!((next.width, next.height), (40.0, 20.0));
    }

    #[test]
    fn snapshot_restore_bumps_versions() {
        let mut scene = Scene::new();
        let a = scene.insert(Element::rectangle(0.0, 0.0, 10.0, 10.0));
        let snap = scene.snapshot();

        scene.mutate(a.id, ElementUpdate::position(30.0, 0.0));
        let b = scene.insert(Element::ellipse(50.0, 50.0, 10.0, 10.0));
        let before_restore = scene.get(a.id).unwrap().version;

        scene.apply_snapshot(&snap);
        let restored = scene.get(a.id).unwrap();
        assert_eq!(restored.x, 0.0);
        assert!(restored.version > before_restore);
        assert!(scene.get(b.id).unwrap().is_deleted);
        assert!(scene.get_live(b.id).is_none());
    }

    #[test]
    fn delete_tombstones_bound_label() {
        let mut scene = Scene::new();
        let rect = Element::rectangle(0.0, 0.0, 100.0, 50.0);
        let label = Element::text(0.0, 0.0, "hi", 20.0);
        let (rect_id, label_id) = (rect.id, label.id);
        scene.insert(rect);
        scene.insert(label);
        crate::binding::bind_text_to_container(&mut scene, label_id, rect_id, 5.0).unwrap();

        let deleted = scene.delete(rect_id);
        assert_eq!(deleted, vec![rect_id, label_id]);
        assert!(scene.restore(rect_id));
        assert!(scene.get_live(label_id).is_some());
    }
}
