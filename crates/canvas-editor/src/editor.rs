//! Editor facade: one owner for the scene and everything that reacts to it.
//!
//! Every input event is handled synchronously: the drag engine (or the
//! active creation tool) mutates the scene, then the change journal is
//! drained into the shape cache before `handle` returns, so a render
//! right after never sees a stale shape.

use crate::config::EditorConfig;
use crate::drag::{DragContext, DragEngine, DragPhase};
use crate::history::{History, UndoStack};
use crate::input::InputEvent;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::{SelectTool, Tool, ToolEffect, ToolKind, tool_for};
use canvas_core::binding;
use canvas_core::cuboid::{self, ViewKind};
use canvas_core::id::ElementId;
use canvas_core::mutate::{ElementUpdate, Scene};
use canvas_core::snapshot::SceneSnapshot;
use canvas_render::{Shape, ShapeCache, hit_test, is_drawn, shape_transform};
use kurbo::{Affine, Point, Rect, Vec2};
use std::collections::HashSet;
use std::sync::Arc;

pub struct Editor {
    scene: Scene,
    cache: ShapeCache,
    drag: DragEngine,
    history: UndoStack,
    config: EditorConfig,
    select: SelectTool,
    tool: ToolKind,
    last_tool: ToolKind,
    creation: Option<Box<dyn Tool>>,
    insert_mode: bool,
    snap_offset: Vec2,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_scene(Scene::new(), config)
    }

    /// Editor over an existing scene; its current state is the first
    /// history entry.
    pub fn with_scene(mut scene: Scene, config: EditorConfig) -> Self {
        scene.drain_changes();
        let mut history = UndoStack::new(config.undo_depth);
        history.record(scene.snapshot());
        Self {
            cache: ShapeCache::new(config.shape_config()),
            drag: DragEngine::new(&config),
            history,
            select: SelectTool::new(),
            tool: ToolKind::Select,
            last_tool: ToolKind::Select,
            creation: None,
            insert_mode: false,
            snap_offset: Vec2::ZERO,
            scene,
            config,
        }
    }

    /// Editor configured from an embedder JSON blob.
    pub fn from_config_json(json: &str) -> Result<Self, String> {
        Ok(Self::new(EditorConfig::from_json(json)?))
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn cache(&self) -> &ShapeCache {
        &self.cache
    }

    pub fn selection(&self) -> &[ElementId] {
        &self.select.selected
    }

    pub fn set_selection(&mut self, ids: &[ElementId]) {
        self.select.selected = ids
            .iter()
            .copied()
            .filter(|id| self.scene.get_live(*id).is_some())
            .collect();
    }

    pub fn marquee(&self) -> Option<Rect> {
        self.select.marquee_rect
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn set_tool(&mut self, kind: ToolKind) {
        if kind == self.tool {
            return;
        }
        if let Some(mut tool) = self.creation.take() {
            tool.cancel(&mut self.scene);
        }
        self.last_tool = self.tool;
        self.tool = kind;
        self.creation = tool_for(kind, &self.config);
        self.flush();
    }

    pub fn insert_mode(&self) -> bool {
        self.insert_mode
    }

    pub fn set_insert_mode(&mut self, on: bool) {
        self.insert_mode = on;
    }

    /// Offset found by object snapping for the next pointer moves.
    pub fn set_snap_offset(&mut self, offset: Vec2) {
        self.snap_offset = offset;
    }

    pub fn drag_phase(&self) -> DragPhase {
        self.drag.phase()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        self.scene.snapshot()
    }

    /// Replace the scene with `snapshot` and start a fresh history.
    pub fn load(&mut self, snapshot: &SceneSnapshot) {
        self.drag.cancel(&mut self.scene);
        self.scene.apply_snapshot(snapshot);
        self.history = UndoStack::new(self.config.undo_depth);
        self.history.record(self.scene.snapshot());
        self.select.clear();
        self.flush();
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Handle one input event. Returns whether the canvas needs a repaint.
    pub fn handle(&mut self, event: &InputEvent) -> bool {
        let repaint = match event {
            InputEvent::Key { key, modifiers } => match ShortcutMap::resolve_with(key, *modifiers) {
                Some(action) => self.run(action),
                None => false,
            },
            InputEvent::PointerCancel => self.cancel_gesture(),
            _ if self.tool == ToolKind::Select => self.handle_select(event),
            _ => self.handle_creation(event),
        };
        self.flush();
        repaint
    }

    fn drag_context(&self) -> DragContext {
        DragContext {
            insert_mode: self.insert_mode,
            grid_size: self.config.grid_size,
            snap_offset: self.snap_offset,
        }
    }

    fn handle_select(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown {
                x, y, modifiers, ..
            } => {
                let point = Point::new(*x, *y);
                let hit = hit_test(&self.scene, point);
                if self.select.pointer_down(&self.scene, point, hit, *modifiers) {
                    self.drag.pointer_down(&self.scene, &self.select.selected, point);
                }
                true
            }
            InputEvent::PointerMove { x, y, .. } => {
                let point = Point::new(*x, *y);
                if self.select.pointer_move(point) {
                    return true;
                }
                if self.drag.phase() == DragPhase::Idle {
                    return false;
                }
                let ctx = self.drag_context();
                !self.drag.pointer_move(&mut self.scene, point, &ctx).is_empty()
            }
            InputEvent::PointerUp { .. } => {
                if self.select.pointer_up(&self.scene) {
                    return true;
                }
                self.drag.pointer_up(&mut self.scene, &mut self.history)
            }
            InputEvent::PointerCancel | InputEvent::Key { .. } => false,
        }
    }

    fn handle_creation(&mut self, event: &InputEvent) -> bool {
        let Some(tool) = self.creation.as_mut() else {
            return false;
        };
        let hit = event
            .position()
            .and_then(|(x, y)| hit_test(&self.scene, Point::new(x, y)));
        match tool.handle(&mut self.scene, event, hit) {
            ToolEffect::Idle => false,
            ToolEffect::Created(_) | ToolEffect::Updated(_) | ToolEffect::Discarded(_) => true,
            ToolEffect::Finished(id) => {
                self.select.selected = vec![id];
                self.history.record(self.scene.snapshot());
                true
            }
        }
    }

    /// Abort whatever the pointer is doing. Returns whether anything was
    /// put back.
    fn cancel_gesture(&mut self) -> bool {
        let restored = !self.drag.cancel(&mut self.scene).is_empty();
        let dropped = self
            .creation
            .as_mut()
            .and_then(|tool| tool.cancel(&mut self.scene))
            .is_some();
        let had_marquee = self.select.marquee_rect.is_some();
        self.select.marquee_start = None;
        self.select.marquee_rect = None;
        restored || dropped || had_marquee
    }

    // ─── Actions ─────────────────────────────────────────────────────────

    /// Run a shortcut action. Returns whether the canvas needs a repaint.
    pub fn run(&mut self, action: ShortcutAction) -> bool {
        let repaint = match action {
            ShortcutAction::ToolSelect => self.switch_tool(ToolKind::Select),
            ShortcutAction::ToolRectangle => self.switch_tool(ToolKind::Rectangle),
            ShortcutAction::ToolDiamond => self.switch_tool(ToolKind::Diamond),
            ShortcutAction::ToolEllipse => self.switch_tool(ToolKind::Ellipse),
            ShortcutAction::ToolArrow => self.switch_tool(ToolKind::Arrow),
            ShortcutAction::ToolElbowArrow => self.switch_tool(ToolKind::ElbowArrow),
            ShortcutAction::ToolLine => self.switch_tool(ToolKind::Line),
            ShortcutAction::ToolText => self.switch_tool(ToolKind::Text),
            ShortcutAction::ToolFrame => self.switch_tool(ToolKind::Frame),
            ShortcutAction::ToolCuboid => self.switch_tool(ToolKind::Cuboid),
            ShortcutAction::ToolFreeDraw => self.switch_tool(ToolKind::FreeDraw),
            ShortcutAction::ToggleLastTool => self.switch_tool(self.last_tool),
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::Delete => self.delete_selection(),
            ShortcutAction::SelectAll => {
                self.select.select_all(&self.scene);
                true
            }
            ShortcutAction::Deselect => {
                if self.cancel_gesture() {
                    true
                } else {
                    let had = !self.select.selected.is_empty();
                    self.select.clear();
                    had
                }
            }
            ShortcutAction::ToggleInsertMode => {
                self.insert_mode = !self.insert_mode;
                log::debug!("insert mode {}", if self.insert_mode { "on" } else { "off" });
                false
            }
            ShortcutAction::ToggleView => {
                self.toggle_view();
                true
            }
            ShortcutAction::ToggleVisibility => self.hide_selection(),
            ShortcutAction::ShowAll => self.show_all(),
            ShortcutAction::SendBackward => self.reorder(Scene::send_backward),
            ShortcutAction::BringForward => self.reorder(Scene::bring_forward),
            ShortcutAction::SendToBack => self.reorder(Scene::send_to_back),
            ShortcutAction::BringToFront => self.reorder(Scene::bring_to_front),
        };
        self.flush();
        repaint
    }

    fn switch_tool(&mut self, kind: ToolKind) -> bool {
        self.set_tool(kind);
        false
    }

    /// Commit the current scene as one history step if it changed.
    fn commit(&mut self) {
        self.history.record(self.scene.snapshot());
    }

    pub fn undo(&mut self) -> bool {
        self.cancel_gesture();
        let Some(state) = self.history.undo() else {
            return false;
        };
        self.scene.apply_snapshot(&state);
        self.select.retain_live(&self.scene);
        self.flush();
        true
    }

    pub fn redo(&mut self) -> bool {
        self.cancel_gesture();
        let Some(state) = self.history.redo() else {
            return false;
        };
        self.scene.apply_snapshot(&state);
        self.select.retain_live(&self.scene);
        self.flush();
        true
    }

    /// Tombstone the selection. Frames take their members along; bindings
    /// left dangling are pruned.
    pub fn delete_selection(&mut self) -> bool {
        if self.drag.phase() != DragPhase::Idle {
            return false;
        }
        let selected: HashSet<ElementId> = self.select.selected.drain(..).collect();
        let doomed: Vec<ElementId> = self
            .scene
            .iter_live()
            .filter(|el| {
                selected.contains(&el.id) || el.frame_id.is_some_and(|f| selected.contains(&f))
            })
            .map(|el| el.id)
            .collect();
        let mut deleted = Vec::new();
        for id in doomed {
            deleted.extend(self.scene.delete(id));
        }
        if deleted.is_empty() {
            return false;
        }
        let gone: HashSet<ElementId> = deleted.iter().copied().collect();
        let dependents: Vec<ElementId> = self
            .scene
            .iter_live()
            .filter(|el| {
                el.kind
                    .as_arrow()
                    .is_some_and(|a| gone.iter().any(|id| a.is_bound_to(*id)))
                    || el.kind.as_text().and_then(|t| t.container_id).is_some_and(|c| gone.contains(&c))
            })
            .map(|el| el.id)
            .collect();
        for id in dependents {
            binding::repair_references(&mut self.scene, id);
        }
        self.commit();
        true
    }

    /// Switch every cuboid to the other view.
    pub fn toggle_view(&mut self) -> ViewKind {
        self.cancel_gesture();
        let view = cuboid::toggle_view(&mut self.scene);
        self.select.selected.retain(|id| {
            self.scene
                .get_live(*id)
                .is_some_and(|el| is_drawn(&el, view))
        });
        self.commit();
        view
    }

    fn hide_selection(&mut self) -> bool {
        let selected = std::mem::take(&mut self.select.selected);
        let mut changed = false;
        for id in selected {
            let before = self.scene.get_live(id).map(|el| el.version);
            let after = self.scene.mutate(id, ElementUpdate::hidden(true)).map(|el| el.version);
            changed |= before.is_some() && before != after;
        }
        if changed {
            self.commit();
        }
        changed
    }

    fn show_all(&mut self) -> bool {
        let hidden: Vec<ElementId> = self
            .scene
            .iter_live()
            .filter(|el| el.hidden)
            .map(|el| el.id)
            .collect();
        for id in &hidden {
            self.scene.mutate(*id, ElementUpdate::hidden(false));
        }
        if !hidden.is_empty() {
            self.commit();
        }
        !hidden.is_empty()
    }

    fn reorder(&mut self, op: fn(&mut Scene, ElementId) -> bool) -> bool {
        let mut changed = false;
        for id in self.select.selected.clone() {
            changed |= op(&mut self.scene, id);
        }
        if changed {
            self.commit();
        }
        changed
    }

    /// Drop tombstones older than `before_ms` and their cached shapes.
    pub fn purge_deleted(&mut self, before_ms: i64) -> usize {
        let purged = self.scene.purge_deleted(before_ms);
        self.cache.release(&purged);
        purged.len()
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    fn flush(&mut self) {
        let changes = self.scene.drain_changes();
        if !changes.is_empty() {
            self.cache.apply_changes(&changes);
        }
    }

    /// Drawn elements back to front with their placement and shape.
    pub fn render_list(&mut self) -> Vec<(ElementId, Affine, Arc<Shape>)> {
        self.flush();
        let view = self.scene.app_state.current_view;
        self.scene
            .iter_live()
            .filter(|el| is_drawn(el, view))
            .map(|el| (el.id, shape_transform(el), self.cache.get_shape(el)))
            .collect()
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}
