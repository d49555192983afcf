//! Undo/redo history.
//!
//! The editor hands committed scene snapshots to a [`History`]; it never
//! sees mid-drag state. [`UndoStack`] keeps whole-scene snapshots, so one
//! undo step replaces the whole scene in a single `apply_snapshot`, the
//! same way a drag gesture is one step no matter how many pointer moves
//! it took.

use canvas_core::snapshot::SceneSnapshot;

/// Receiver of committed scene states.
pub trait History {
    fn record(&mut self, snapshot: SceneSnapshot);
}

/// Snapshot-based undo/redo with a bounded depth.
///
/// The top of the undo stack is the current committed state; undo steps
/// back to the entry below it.
#[derive(Debug)]
pub struct UndoStack {
    undo_stack: Vec<SceneSnapshot>,
    redo_stack: Vec<SceneSnapshot>,
    /// Maximum number of undo steps.
    max_depth: usize,
}

impl UndoStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth + 1),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Step back. Returns the state the scene should take.
    pub fn undo(&mut self) -> Option<SceneSnapshot> {
        if !self.can_undo() {
            return None;
        }
        let undone = self.undo_stack.pop()?;
        self.redo_stack.push(undone);
        self.undo_stack.last().cloned()
    }

    /// Re-apply the last undone state.
    pub fn redo(&mut self) -> Option<SceneSnapshot> {
        let state = self.redo_stack.pop()?;
        self.undo_stack.push(state.clone());
        Some(state)
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// The current committed state.
    pub fn current(&self) -> Option<&SceneSnapshot> {
        self.undo_stack.last()
    }
}

impl History for UndoStack {
    fn record(&mut self, snapshot: SceneSnapshot) {
        if self
            .undo_stack
            .last()
            .is_some_and(|top| top.same_content(&snapshot))
        {
            return;
        }
        self.undo_stack.push(snapshot);
        // The baseline below the oldest step is kept as well.
        while self.undo_stack.len() > self.max_depth + 1 {
            self.undo_stack.remove(0);
        }
        // Clear redo stack on new action
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_core::{Element, ElementUpdate, Scene};
    use pretty_assertions::assert_eq;

    fn scene() -> (Scene, canvas_core::ElementId) {
        let mut scene = Scene::new();
        let id = scene.insert(Element::rectangle(0.0, 0.0, 100.0, 50.0)).id;
        (scene, id)
    }

    #[test]
    fn undo_redo_move() {
        let (mut scene, id) = scene();
        let mut stack = UndoStack::new(100);
        stack.record(scene.snapshot());

        scene.mutate(id, ElementUpdate::position(50.0, 30.0));
        stack.record(scene.snapshot());

        let before = stack.undo().unwrap();
        scene.apply_snapshot(&before);
        assert_eq!(scene.get(id).unwrap().x, 0.0);

        let after = stack.redo().unwrap();
        scene.apply_snapshot(&after);
        assert_eq!(scene.get(id).unwrap().x, 50.0);
    }

    #[test]
    fn redo_clears_on_new_action() {
        let (mut scene, id) = scene();
        let mut stack = UndoStack::new(100);
        stack.record(scene.snapshot());
        scene.mutate(id, ElementUpdate::position(5.0, 0.0));
        stack.record(scene.snapshot());

        stack.undo();
        assert!(stack.can_redo());

        scene.mutate(id, ElementUpdate::position(1.0, 0.0));
        stack.record(scene.snapshot());
        assert!(!stack.can_redo());
    }

    #[test]
    fn max_depth_trims_oldest() {
        let (mut scene, id) = scene();
        let mut stack = UndoStack::new(3);
        stack.record(scene.snapshot());
        for i in 0..5 {
            scene.mutate(id, ElementUpdate::position((i + 1) as f64, 0.0));
            stack.record(scene.snapshot());
        }
        let mut undo_count = 0;
        while stack.undo().is_some() {
            undo_count += 1;
        }
        assert_eq!(undo_count, 3);
    }

    #[test]
    fn unchanged_state_is_not_recorded() {
        let (scene, _) = scene();
        let mut stack = UndoStack::new(10);
        stack.record(scene.snapshot());
        stack.record(scene.snapshot());
        assert!(!stack.can_undo());
    }
}
