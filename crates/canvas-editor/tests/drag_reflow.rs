//! Integration tests: drag engine → insert-mode reflow → binding maintenance.
//!
//! Drives `DragEngine` the way the editor does (pointer down, a stream of
//! pointer moves, pointer up or cancel) and checks the scene after each
//! step against the pointer-down state.

use canvas_core::binding::{self, distance_to_outline};
use canvas_core::frame::add_to_frame;
use canvas_core::geometry::absolute_points;
use canvas_core::kurbo::{Point, Vec2};
use canvas_core::mutate::same_content;
use canvas_core::{ArrowEnd, Element, ElementId, Scene};
use canvas_editor::{
    DragContext, DragEngine, DragPhase, Editor, EditorConfig, InputEvent, Modifiers, UndoStack,
};
use pretty_assertions::assert_eq;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn insert_mode() -> DragContext {
    DragContext {
        insert_mode: true,
        ..DragContext::default()
    }
}

fn x_of(scene: &Scene, id: ElementId) -> f64 {
    scene.get(id).unwrap().x
}

/// A and B share a row; C (150 wide) waits below it.
fn row_scene() -> (Scene, ElementId, ElementId, ElementId) {
    let mut scene = Scene::new();
    let a = scene.insert(Element::rectangle(0.0, 0.0, 100.0, 50.0)).id;
    let b = scene.insert(Element::rectangle(200.0, 0.0, 100.0, 50.0)).id;
    let c = scene.insert(Element::rectangle(0.0, 300.0, 150.0, 50.0)).id;
    scene.drain_changes();
    (scene, a, b, c)
}

fn unchanged_since(scene: &Scene, before: &Scene) -> bool {
    before
        .iter_live()
        .all(|orig| scene.get(orig.id).is_some_and(|now| same_content(&now, orig)))
}

// ─── Insert-mode reflow ──────────────────────────────────────────────────

#[test]
fn dropping_into_a_row_aligns_and_makes_room() {
    init_logs();
    let (mut scene, a, b, c) = row_scene();
    let mut drag = DragEngine::default();
    let mut history = UndoStack::new(10);

    // Grab C at its center, then move it so its left edge sits at x = 90.
    assert!(drag.pointer_down(&scene, &[c], Point::new(75.0, 325.0)));
    drag.pointer_move(&mut scene, Point::new(165.0, 25.0), &insert_mode());

    assert_eq!(x_of(&scene, c), 100.0, "C snaps to A's right edge");
    assert_eq!(x_of(&scene, b), 250.0, "B makes room for C");
    assert_eq!(x_of(&scene, a), 0.0);
    assert_eq!(drag.shifted(), &[b]);
    let c_right = scene.get(c).unwrap().bounds().x1;
    assert!(c_right <= scene.get(b).unwrap().bounds().x0);

    // Off the row again: B goes back where it was.
    drag.pointer_move(&mut scene, Point::new(75.0, 625.0), &insert_mode());
    assert_eq!(x_of(&scene, b), 200.0);
    assert!(drag.shifted().is_empty());

    assert!(drag.pointer_up(&mut scene, &mut history));
    assert_eq!(drag.phase(), DragPhase::Idle);
    assert_eq!(scene.get(c).unwrap().y, 600.0);
}

#[test]
fn arrow_between_neighbours_is_rebound_not_pushed() {
    init_logs();
    let (mut scene, a, b, c) = row_scene();
    let arrow = scene
        .insert(Element::arrow(100.0, 10.0, vec![Point::ZERO, Point::new(100.0, 30.0)]))
        .id;
    binding::bind_arrow(&mut scene, arrow, ArrowEnd::Start, a, 5.0).unwrap();
    binding::bind_arrow(&mut scene, arrow, ArrowEnd::End, b, 5.0).unwrap();
    let mut drag = DragEngine::default();

    assert!(drag.pointer_down(&scene, &[c], Point::new(75.0, 325.0)));
    drag.pointer_move(&mut scene, Point::new(165.0, 25.0), &insert_mode());

    assert_eq!(x_of(&scene, c), 100.0);
    assert_eq!(x_of(&scene, b), 250.0, "the arrow does not widen the push");
    assert_eq!(drag.shifted(), &[b]);

    let points = absolute_points(&scene.get(arrow).unwrap());
    let start = distance_to_outline(&scene.get(a).unwrap(), points[0]).unwrap();
    let end = distance_to_outline(&scene.get(b).unwrap(), points[points.len() - 1]).unwrap();
    assert!((start - 5.0).abs() < 0.5, "start off outline by {start}");
    assert!((end - 5.0).abs() < 0.5, "end off outline by {end}");
}

#[test]
fn nudging_a_frame_child_leaves_the_frame_alone() {
    init_logs();
    let mut scene = Scene::new();
    let frame = scene.insert(Element::frame(0.0, 0.0, 500.0, 300.0)).id;
    let child = scene.insert(Element::rectangle(20.0, 20.0, 100.0, 50.0)).id;
    add_to_frame(&mut scene, &[child], frame);
    let mut drag = DragEngine::default();

    assert!(drag.pointer_down(&scene, &[child], Point::new(70.0, 45.0)));
    drag.pointer_move(&mut scene, Point::new(80.0, 45.0), &insert_mode());

    assert_eq!(x_of(&scene, child), 30.0);
    assert_eq!(x_of(&scene, frame), 0.0);
    assert!(drag.shifted().is_empty());
}

#[test]
fn neighbour_deleted_mid_drag_stops_pushing() {
    init_logs();
    let (mut scene, _, b, c) = row_scene();
    let wide = scene.insert(Element::rectangle(120.0, 0.0, 60.0, 50.0)).id;
    let mut drag = DragEngine::default();

    drag.pointer_down(&scene, &[c], Point::new(75.0, 325.0));
    drag.pointer_move(&mut scene, Point::new(165.0, 25.0), &insert_mode());
    assert_eq!(x_of(&scene, wide), 250.0);
    assert_eq!(x_of(&scene, b), 330.0);

    scene.delete(wide);
    drag.pointer_move(&mut scene, Point::new(165.0, 25.0), &insert_mode());
    assert_eq!(x_of(&scene, b), 250.0);
    assert_eq!(drag.shifted(), &[b]);
    assert!(scene.get_live(wide).is_none(), "a released neighbour is not revived");
}

#[test]
fn shifts_never_compound_across_moves() {
    init_logs();
    let (mut scene, _, b, c) = row_scene();
    let mut drag = DragEngine::default();
    drag.pointer_down(&scene, &[c], Point::new(75.0, 325.0));

    for _ in 0..5 {
        drag.pointer_move(&mut scene, Point::new(165.0, 25.0), &insert_mode());
        assert_eq!(x_of(&scene, b), 250.0);
    }
    // Off the row: nothing to push.
    drag.pointer_move(&mut scene, Point::new(120.0, 425.0), &insert_mode());
    assert_eq!(x_of(&scene, b), 200.0);
}

#[test]
fn without_insert_mode_neighbours_stay() {
    let (mut scene, a, b, c) = row_scene();
    let mut drag = DragEngine::default();
    drag.pointer_down(&scene, &[c], Point::new(75.0, 325.0));
    drag.pointer_move(&mut scene, Point::new(165.0, 25.0), &DragContext::default());

    assert_eq!(x_of(&scene, c), 90.0);
    assert_eq!((x_of(&scene, a), x_of(&scene, b)), (0.0, 200.0));
}

// ─── Snapshot replay ─────────────────────────────────────────────────────

#[test]
fn drag_and_back_restores_exactly() {
    init_logs();
    let mut scene = Scene::new();
    let a = scene.insert(Element::rectangle(0.0, 0.0, 120.0, 60.0)).id;
    let b = scene.insert(Element::ellipse(300.0, 100.0, 90.0, 70.0)).id;
    let arrow = scene
        .insert(Element::arrow(120.0, 30.0, vec![Point::ZERO, Point::new(200.0, 100.0)]))
        .id;
    binding::bind_arrow(&mut scene, arrow, ArrowEnd::Start, a, 5.0).unwrap();
    binding::bind_arrow(&mut scene, arrow, ArrowEnd::End, b, 5.0).unwrap();
    let before = scene.clone();

    let mut drag = DragEngine::default();
    let start = Point::new(60.0, 30.0);
    drag.pointer_down(&scene, &[a], start);
    for step in 1..=10 {
        let t = step as f64;
        drag.pointer_move(&mut scene, start + Vec2::new(t * 3.75, -t * 1.25), &DragContext::default());
    }
    assert!(!unchanged_since(&scene, &before));
    drag.pointer_move(&mut scene, start, &DragContext::default());

    assert!(unchanged_since(&scene, &before));
    assert!(scene.get(a).unwrap().version > before.get(a).unwrap().version);
}

#[test]
fn bound_arrows_follow_every_frame() {
    init_logs();
    let mut scene = Scene::new();
    let a = scene.insert(Element::rectangle(0.0, 0.0, 120.0, 60.0)).id;
    let b = scene.insert(Element::diamond(300.0, 0.0, 100.0, 100.0)).id;
    let arrow = scene
        .insert(Element::arrow(120.0, 30.0, vec![Point::ZERO, Point::new(180.0, 20.0)]))
        .id;
    binding::bind_arrow(&mut scene, arrow, ArrowEnd::Start, a, 5.0).unwrap();
    binding::bind_arrow(&mut scene, arrow, ArrowEnd::End, b, 5.0).unwrap();

    let mut drag = DragEngine::default();
    drag.pointer_down(&scene, &[b], Point::new(350.0, 50.0));
    for (x, y) in [(360.0, 80.0), (420.0, 200.0), (200.0, 300.0), (100.0, 250.0)] {
        let touched = drag.pointer_move(&mut scene, Point::new(x, y), &DragContext::default());
        assert!(touched.contains(&arrow));

        let points = absolute_points(&scene.get(arrow).unwrap());
        let start = distance_to_outline(&scene.get(a).unwrap(), points[0]).unwrap();
        let end = distance_to_outline(&scene.get(b).unwrap(), points[points.len() - 1]).unwrap();
        assert!((start - 5.0).abs() < 0.5, "start off outline by {start}");
        assert!((end - 5.0).abs() < 0.5, "end off outline by {end}");
    }
}

// ─── Cancel ──────────────────────────────────────────────────────────────

#[test]
fn cancel_restores_everything_once() {
    init_logs();
    let (mut scene, _, b, c) = row_scene();
    let before = scene.clone();
    let mut drag = DragEngine::default();

    drag.pointer_down(&scene, &[c], Point::new(75.0, 325.0));
    drag.pointer_move(&mut scene, Point::new(165.0, 25.0), &insert_mode());
    assert_eq!(x_of(&scene, b), 250.0);

    let restored = drag.cancel(&mut scene);
    assert!(restored.contains(&b) && restored.contains(&c));
    assert!(unchanged_since(&scene, &before));
    assert_eq!(drag.phase(), DragPhase::Idle);

    assert!(drag.cancel(&mut scene).is_empty());
    assert!(unchanged_since(&scene, &before));
}

// ─── Batch composition ───────────────────────────────────────────────────

#[test]
fn frame_drag_moves_members_and_labels() {
    let mut scene = Scene::new();
    let frame = scene.insert(Element::frame(0.0, 0.0, 300.0, 200.0)).id;
    let member = scene.insert(Element::rectangle(20.0, 20.0, 100.0, 60.0)).id;
    let label = scene.insert(Element::text(0.0, 0.0, "inside", 20.0)).id;
    binding::bind_text_to_container(&mut scene, label, member, 5.0).unwrap();
    add_to_frame(&mut scene, &[member], frame);
    let label_x = x_of(&scene, label);

    let mut drag = DragEngine::default();
    drag.pointer_down(&scene, &[frame], Point::new(0.0, 100.0));
    assert_eq!(drag.batch(), &[frame, member, label]);
    drag.pointer_move(&mut scene, Point::new(100.0, 100.0), &DragContext::default());

    assert_eq!(x_of(&scene, frame), 100.0);
    assert_eq!(x_of(&scene, member), 120.0);
    assert_eq!(x_of(&scene, label), label_x + 100.0);
}

#[test]
fn arrow_dragged_off_its_target_is_detached_on_commit() {
    init_logs();
    let mut scene = Scene::new();
    let a = scene.insert(Element::rectangle(0.0, 0.0, 100.0, 50.0)).id;
    let arrow = scene
        .insert(Element::arrow(100.0, 25.0, vec![Point::ZERO, Point::new(150.0, 0.0)]))
        .id;
    binding::bind_arrow(&mut scene, arrow, ArrowEnd::Start, a, 5.0).unwrap();

    let mut drag = DragEngine::default();
    let mut history = UndoStack::new(10);
    drag.pointer_down(&scene, &[arrow], Point::new(150.0, 25.0));
    drag.pointer_move(&mut scene, Point::new(150.0, 225.0), &DragContext::default());
    // Still bound while the gesture is live.
    assert!(scene.get(arrow).unwrap().kind.as_arrow().unwrap().start_binding.is_some());

    assert!(drag.pointer_up(&mut scene, &mut history));
    assert_eq!(scene.get(arrow).unwrap().kind.as_arrow().unwrap().start_binding, None);
    assert!(scene.get(a).unwrap().bound_elements.is_empty());
}

// ─── Through the editor ──────────────────────────────────────────────────

#[test]
fn editor_insert_mode_drag_is_one_undo_step() {
    init_logs();
    let (scene, _, b, c) = row_scene();
    let mut editor = Editor::with_scene(scene, EditorConfig::default());
    let alt = Modifiers {
        alt: true,
        ..Modifiers::NONE
    };
    editor.handle(&InputEvent::key("i", alt));
    assert!(editor.insert_mode());

    editor.handle(&InputEvent::pointer_down(75.0, 325.0));
    assert_eq!(editor.selection(), &[c]);
    for y in [300.0, 200.0, 100.0, 25.0] {
        editor.handle(&InputEvent::pointer_move(165.0, y));
    }
    editor.handle(&InputEvent::pointer_up(165.0, 25.0));
    assert_eq!(x_of(editor.scene(), b), 250.0);
    assert_eq!(x_of(editor.scene(), c), 100.0);

    let b_version = editor.scene().get(b).unwrap().version;
    assert!(editor.undo());
    assert_eq!(x_of(editor.scene(), b), 200.0);
    assert_eq!(x_of(editor.scene(), c), 0.0);
    assert!(editor.scene().get(b).unwrap().version > b_version);
    assert!(!editor.can_undo());
}
