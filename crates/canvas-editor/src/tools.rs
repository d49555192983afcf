//! Tool system for canvas interactions.
//!
//! Creation tools write straight through the scene's mutation gateway and
//! report what they did as a [`ToolEffect`]. Selection and the marquee
//! live in [`SelectTool`]; moving the selection is the drag engine's job.
//!
//! ## Modifier behaviors
//!
//! | Modifier | Select Tool | Shape Tools | Line / Arrow |
//! |----------|-------------|-------------|--------------|
//! | **Shift** | Toggle selection | Square / circle | 15° steps |
//! | **Alt** | — | Draw from center | — |

use crate::config::EditorConfig;
use crate::drag::{NewElementDrag, drag_new_element, perfect_size};
use crate::input::{InputEvent, Modifiers};
use canvas_core::binding::{self, Heading};
use canvas_core::cuboid::DualView;
use canvas_core::frame;
use canvas_core::id::ElementId;
use canvas_core::model::{ArrowEnd, Element, ElementKind};
use canvas_core::mutate::{ElementUpdate, Scene};
use canvas_render::{bindable_at, hit_test_rect};
use kurbo::{Point, Rect};

pub const DEFAULT_FONT_SIZE: f64 = 20.0;

/// Shortest linear element worth keeping.
const MIN_LINEAR_LENGTH: f64 = 1.0;

/// The active tool determines how input events are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Select,
    Rectangle,
    Diamond,
    Ellipse,
    Arrow,
    ElbowArrow,
    Line,
    Text,
    Frame,
    Cuboid,
    FreeDraw,
}

/// What a tool did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolEffect {
    Idle,
    Created(ElementId),
    Updated(ElementId),
    /// The element is complete; the gesture is one history step.
    Finished(ElementId),
    /// The element came out degenerate and was removed again.
    Discarded(ElementId),
}

/// Trait for tools that turn input into new elements.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// Handle an input event. `hit` is the topmost element under the
    /// pointer, if any.
    fn handle(&mut self, scene: &mut Scene, event: &InputEvent, hit: Option<ElementId>)
    -> ToolEffect;

    /// Drop the element being drawn, if any.
    fn cancel(&mut self, scene: &mut Scene) -> Option<ElementId>;
}

/// The creation tool for `kind`; `None` for the select tool.
pub fn tool_for(kind: ToolKind, config: &EditorConfig) -> Option<Box<dyn Tool>> {
    match kind {
        ToolKind::Select => None,
        ToolKind::Rectangle
        | ToolKind::Diamond
        | ToolKind::Ellipse
        | ToolKind::Frame
        | ToolKind::Cuboid => Some(Box::new(ShapeTool::new(kind))),
        ToolKind::Arrow | ToolKind::ElbowArrow | ToolKind::Line => {
            Some(Box::new(LinearTool::new(kind, config.default_binding_gap)))
        }
        ToolKind::FreeDraw => Some(Box::new(FreeDrawTool::default())),
        ToolKind::Text => Some(Box::new(TextTool::new(config.bound_text_padding))),
    }
}

/// Put a finished element into the topmost frame that fully contains it.
fn adopt_into_frame(scene: &mut Scene, id: ElementId) {
    let Some(el) = scene.get_live(id) else {
        return;
    };
    if el.kind.is_frame() || el.frame_id.is_some() {
        return;
    }
    let bounds = el.bounds();
    let frame_id = scene
        .iter_live()
        .rev()
        .filter(|f| f.kind.is_frame() && f.id != id)
        .find(|f| f.rect().contains_rect(bounds))
        .map(|f| f.id);
    if let Some(frame_id) = frame_id {
        frame::add_to_frame(scene, &[id], frame_id);
    }
}

fn discard(scene: &mut Scene, id: ElementId) -> ToolEffect {
    scene.delete(id);
    ToolEffect::Discarded(id)
}

// ─── Select Tool ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct SelectTool {
    /// Currently selected element(s).
    pub selected: Vec<ElementId>,
    /// Set when pointer-down hits empty space.
    pub marquee_start: Option<Point>,
    /// Current marquee rectangle, normalized. Updated during drag.
    pub marquee_rect: Option<Rect>,
    marquee_extends: bool,
}

impl SelectTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the first selected element.
    pub fn first_selected(&self) -> Option<ElementId> {
        self.selected.first().copied()
    }

    /// Update the selection for a press at `point`. Returns whether the
    /// press landed on the selection, i.e. whether a drag may start.
    pub fn pointer_down(
        &mut self,
        scene: &Scene,
        point: Point,
        hit: Option<ElementId>,
        modifiers: Modifiers,
    ) -> bool {
        self.marquee_start = None;
        self.marquee_rect = None;

        // A label is picked through its container.
        let hit = hit.map(|id| {
            scene
                .get_live(id)
                .and_then(|el| el.kind.as_text().and_then(|t| t.container_id))
                .filter(|c| scene.get_live(*c).is_some())
                .unwrap_or(id)
        });

        let Some(hit_id) = hit else {
            // Click on empty space: start marquee
            if !modifiers.shift {
                self.selected.clear();
            }
            self.marquee_start = Some(point);
            self.marquee_rect = Some(Rect::from_points(point, point));
            self.marquee_extends = modifiers.shift;
            return false;
        };

        if modifiers.shift {
            // Shift+click: toggle in/out of selection
            if let Some(pos) = self.selected.iter().position(|id| *id == hit_id) {
                self.selected.remove(pos);
                return false;
            }
            self.selected.push(hit_id);
        } else if !self.selected.contains(&hit_id) {
            self.selected = vec![hit_id];
        }
        true
    }

    /// Grow the marquee. Returns whether a marquee is active.
    pub fn pointer_move(&mut self, point: Point) -> bool {
        let Some(start) = self.marquee_start else {
            return false;
        };
        self.marquee_rect = Some(Rect::from_points(start, point));
        true
    }

    /// Finish a marquee, selecting what it touches.
    pub fn pointer_up(&mut self, scene: &Scene) -> bool {
        self.marquee_start = None;
        let Some(area) = self.marquee_rect.take() else {
            return false;
        };
        let picked = hit_test_rect(scene, area)
            .into_iter()
            .filter(|id| {
                scene
                    .get_live(*id)
                    .is_some_and(|el| el.kind.as_text().is_none_or(|t| t.container_id.is_none()))
            });
        if !self.marquee_extends {
            self.selected.clear();
        }
        for id in picked {
            if !self.selected.contains(&id) {
                self.selected.push(id);
            }
        }
        true
    }

    pub fn select_all(&mut self, scene: &Scene) {
        self.selected = scene
            .iter_live()
            .filter(|el| el.kind.as_text().is_none_or(|t| t.container_id.is_none()))
            .map(|el| el.id)
            .collect();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.marquee_start = None;
        self.marquee_rect = None;
    }

    /// Forget selected elements that are gone.
    pub fn retain_live(&mut self, scene: &Scene) {
        self.selected.retain(|id| scene.get_live(*id).is_some());
    }
}

// ─── Shape Tool ──────────────────────────────────────────────────────────

/// Box-shaped elements sized by dragging a corner.
pub struct ShapeTool {
    kind: ToolKind,
    origin: Point,
    current: Option<ElementId>,
}

impl ShapeTool {
    pub fn new(kind: ToolKind) -> Self {
        Self {
            kind,
            origin: Point::ZERO,
            current: None,
        }
    }

    fn new_element(&self, scene: &Scene, at: Point) -> Option<Element> {
        let el = match self.kind {
            ToolKind::Rectangle => Element::rectangle(at.x, at.y, 0.0, 0.0),
            ToolKind::Diamond => Element::diamond(at.x, at.y, 0.0, 0.0),
            ToolKind::Ellipse => Element::ellipse(at.x, at.y, 0.0, 0.0),
            ToolKind::Frame => Element::frame(at.x, at.y, 0.0, 0.0),
            ToolKind::Cuboid => {
                let mut el = Element::cuboid(at.x, at.y, 0.0, 0.0);
                el.dual_view = Some(DualView {
                    current_view: scene.app_state.current_view,
                    ..DualView::default()
                });
                el
            }
            _ => return None,
        };
        Some(el)
    }

    fn finish(&self, scene: &mut Scene, id: ElementId) -> ToolEffect {
        let Some(el) = scene.get_live(id) else {
            return ToolEffect::Idle;
        };
        if el.width == 0.0 || el.height == 0.0 {
            return discard(scene, id);
        }
        if el.kind.is_frame() {
            // A new frame takes in the free elements it encloses.
            let area = el.rect();
            let enclosed: Vec<ElementId> = scene
                .iter_live()
                .filter(|e| e.id != id && e.frame_id.is_none() && !e.kind.is_frame())
                .filter(|e| area.contains_rect(e.bounds()))
                .map(|e| e.id)
                .collect();
            frame::add_to_frame(scene, &enclosed, id);
        } else {
            adopt_into_frame(scene, id);
        }
        ToolEffect::Finished(id)
    }
}

impl Tool for ShapeTool {
    fn kind(&self) -> ToolKind {
        self.kind
    }

    fn handle(
        &mut self,
        scene: &mut Scene,
        event: &InputEvent,
        _hit: Option<ElementId>,
    ) -> ToolEffect {
        match event {
            InputEvent::PointerDown { x, y, .. } => {
                let origin = Point::new(*x, *y);
                let Some(el) = self.new_element(scene, origin) else {
                    return ToolEffect::Idle;
                };
                let id = scene.insert(el).id;
                self.origin = origin;
                self.current = Some(id);
                ToolEffect::Created(id)
            }
            InputEvent::PointerMove {
                x, y, modifiers, ..
            } => {
                let Some(id) = self.current else {
                    return ToolEffect::Idle;
                };
                let opts = NewElementDrag {
                    maintain_aspect_ratio: modifiers.shift,
                    resize_from_center: modifiers.alt,
                    ..NewElementDrag::default()
                };
                if drag_new_element(scene, id, self.origin, Point::new(*x, *y), &opts) {
                    ToolEffect::Updated(id)
                } else {
                    ToolEffect::Idle
                }
            }
            InputEvent::PointerUp { .. } => match self.current.take() {
                Some(id) => self.finish(scene, id),
                None => ToolEffect::Idle,
            },
            InputEvent::PointerCancel => {
                self.cancel(scene);
                ToolEffect::Idle
            }
            InputEvent::Key { .. } => ToolEffect::Idle,
        }
    }

    fn cancel(&mut self, scene: &mut Scene) -> Option<ElementId> {
        let id = self.current.take()?;
        scene.delete(id);
        Some(id)
    }
}

// ─── Linear Tool ─────────────────────────────────────────────────────────

/// Lines and arrows drawn from press to release. Arrow ends that start or
/// stop on a bindable element are bound to it.
pub struct LinearTool {
    kind: ToolKind,
    binding_gap: f64,
    origin: Point,
    current: Option<ElementId>,
}

impl LinearTool {
    pub fn new(kind: ToolKind, binding_gap: f64) -> Self {
        Self {
            kind,
            binding_gap,
            origin: Point::ZERO,
            current: None,
        }
    }

    fn points_to(&self, end: Point, modifiers: Modifiers) -> Vec<Point> {
        let mut d = end - self.origin;
        if modifiers.shift {
            let (w, h) = perfect_size(&ElementKind::Line, d.x, d.y);
            d = kurbo::Vec2::new(w, h);
        }
        if self.kind == ToolKind::ElbowArrow {
            return binding::route_elbow(
                Point::ZERO,
                Heading::Horizontal,
                d.to_point(),
                Heading::Horizontal,
            );
        }
        vec![Point::ZERO, d.to_point()]
    }

    fn finish(&self, scene: &mut Scene, id: ElementId, end: Point) -> ToolEffect {
        let Some(el) = scene.get_live(id) else {
            return ToolEffect::Idle;
        };
        let length = el.width.hypot(el.height);
        if length < MIN_LINEAR_LENGTH {
            return discard(scene, id);
        }
        if el.kind.as_arrow().is_some() {
            let ends = [(ArrowEnd::Start, self.origin), (ArrowEnd::End, end)];
            for (which, at) in ends {
                let Some(target) = bindable_at(scene, at, id) else {
                    continue;
                };
                if let Err(err) = binding::bind_arrow(scene, id, which, target, self.binding_gap) {
                    log::debug!("could not bind new arrow {id}: {err}");
                }
            }
        }
        adopt_into_frame(scene, id);
        ToolEffect::Finished(id)
    }
}

impl Tool for LinearTool {
    fn kind(&self) -> ToolKind {
        self.kind
    }

    fn handle(
        &mut self,
        scene: &mut Scene,
        event: &InputEvent,
        _hit: Option<ElementId>,
    ) -> ToolEffect {
        match event {
            InputEvent::PointerDown { x, y, .. } => {
                let start = vec![Point::ZERO, Point::ZERO];
                let el = match self.kind {
                    ToolKind::Line => Element::line(*x, *y, start),
                    ToolKind::ElbowArrow => Element::elbow_arrow(*x, *y, start),
                    _ => Element::arrow(*x, *y, start),
                };
                let id = scene.insert(el).id;
                self.origin = Point::new(*x, *y);
                self.current = Some(id);
                ToolEffect::Created(id)
            }
            InputEvent::PointerMove {
                x, y, modifiers, ..
            } => {
                let Some(id) = self.current else {
                    return ToolEffect::Idle;
                };
                let points = self.points_to(Point::new(*x, *y), *modifiers);
                scene.mutate(id, ElementUpdate::default().with_points(points));
                ToolEffect::Updated(id)
            }
            InputEvent::PointerUp { x, y, .. } => match self.current.take() {
                Some(id) => {
                    let end = scene
                        .get_live(id)
                        .and_then(|el| canvas_core::geometry::absolute_points(&el).last().copied())
                        .unwrap_or(Point::new(*x, *y));
                    self.finish(scene, id, end)
                }
                None => ToolEffect::Idle,
            },
            InputEvent::PointerCancel => {
                self.cancel(scene);
                ToolEffect::Idle
            }
            InputEvent::Key { .. } => ToolEffect::Idle,
        }
    }

    fn cancel(&mut self, scene: &mut Scene) -> Option<ElementId> {
        let id = self.current.take()?;
        scene.delete(id);
        Some(id)
    }
}

// ─── Free Draw Tool ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct FreeDrawTool {
    origin: Point,
    points: Vec<Point>,
    current: Option<ElementId>,
}

impl Tool for FreeDrawTool {
    fn kind(&self) -> ToolKind {
        ToolKind::FreeDraw
    }

    fn handle(
        &mut self,
        scene: &mut Scene,
        event: &InputEvent,
        _hit: Option<ElementId>,
    ) -> ToolEffect {
        match event {
            InputEvent::PointerDown { x, y, .. } => {
                self.origin = Point::new(*x, *y);
                self.points = vec![Point::ZERO];
                let id = scene.insert(Element::freedraw(*x, *y, self.points.clone())).id;
                self.current = Some(id);
                ToolEffect::Created(id)
            }
            InputEvent::PointerMove { x, y, .. } => {
                let Some(id) = self.current else {
                    return ToolEffect::Idle;
                };
                let p = (Point::new(*x, *y) - self.origin).to_point();
                if self.points.last() == Some(&p) {
                    return ToolEffect::Idle;
                }
                self.points.push(p);
                scene.mutate(id, ElementUpdate::default().with_points(self.points.clone()));
                ToolEffect::Updated(id)
            }
            InputEvent::PointerUp { .. } => {
                let Some(id) = self.current.take() else {
                    return ToolEffect::Idle;
                };
                if std::mem::take(&mut self.points).len() < 2 {
                    return discard(scene, id);
                }
                adopt_into_frame(scene, id);
                ToolEffect::Finished(id)
            }
            InputEvent::PointerCancel => {
                self.cancel(scene);
                ToolEffect::Idle
            }
            InputEvent::Key { .. } => ToolEffect::Idle,
        }
    }

    fn cancel(&mut self, scene: &mut Scene) -> Option<ElementId> {
        self.points.clear();
        let id = self.current.take()?;
        scene.delete(id);
        Some(id)
    }
}

// ─── Text Tool ───────────────────────────────────────────────────────────

/// Places a text element on press. Pressing on a container without a
/// label makes the new text its label.
pub struct TextTool {
    padding: f64,
}

impl TextTool {
    pub fn new(padding: f64) -> Self {
        Self { padding }
    }
}

impl Tool for TextTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Text
    }

    fn handle(
        &mut self,
        scene: &mut Scene,
        event: &InputEvent,
        hit: Option<ElementId>,
    ) -> ToolEffect {
        let InputEvent::PointerDown { x, y, .. } = event else {
            return ToolEffect::Idle;
        };
        let container = hit
            .and_then(|id| scene.get_live(id))
            .filter(|el| el.kind.is_text_container() && el.bound_text_id().is_none())
            .map(|el| el.id);

        let id = scene
            .insert(Element::text(*x, *y, "Text", DEFAULT_FONT_SIZE))
            .id;
        match container {
            Some(container) => {
                if let Err(err) = binding::bind_text_to_container(scene, id, container, self.padding)
                {
                    log::debug!("could not label {container}: {err}");
                }
            }
            None => adopt_into_frame(scene, id),
        }
        ToolEffect::Finished(id)
    }

    fn cancel(&mut self, _scene: &mut Scene) -> Option<ElementId> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn shift() -> Modifiers {
        Modifiers {
            shift: true,
            ..Modifiers::NONE
        }
    }

    fn created(effect: ToolEffect) -> ElementId {
        match effect {
            ToolEffect::Created(id) => id,
            other => panic!("expected Created, got {other:?}"),
        }
    }

    #[test]
    fn select_tool_click_and_shift_toggle() {
        let mut scene = Scene::new();
        let a = scene.insert(Element::rectangle(0.0, 0.0, 10.0, 10.0)).id;
        let b = scene.insert(Element::rectangle(20.0, 0.0, 10.0, 10.0)).id;
        let mut tool = SelectTool::new();

        assert!(tool.pointer_down(&scene, Point::ZERO, Some(a), Modifiers::NONE));
        assert_eq!(tool.selected, vec![a]);
        assert!(tool.pointer_down(&scene, Point::ZERO, Some(b), shift()));
        assert_eq!(tool.selected, vec![a, b]);
        // Shift+click on a selected element removes it and starts no drag.
        assert!(!tool.pointer_down(&scene, Point::ZERO, Some(a), shift()));
        assert_eq!(tool.selected, vec![b]);
    }

    #[test]
    fn select_tool_marquee() {
        let mut scene = Scene::new();
        let a = scene.insert(Element::rectangle(10.0, 10.0, 10.0, 10.0)).id;
        scene.insert(Element::rectangle(200.0, 200.0, 10.0, 10.0));
        let mut tool = SelectTool::new();

        assert!(!tool.pointer_down(&scene, Point::ZERO, None, Modifiers::NONE));
        assert!(tool.pointer_move(Point::new(50.0, 50.0)));
        assert_eq!(tool.marquee_rect, Some(Rect::new(0.0, 0.0, 50.0, 50.0)));
        assert!(tool.pointer_up(&scene));
        assert_eq!(tool.selected, vec![a]);
        assert_eq!(tool.marquee_rect, None);
    }

    #[test]
    fn labels_are_selected_through_their_container() {
        let mut scene = Scene::new();
        let boxed = scene.insert(Element::rectangle(0.0, 0.0, 100.0, 50.0)).id;
        let label = scene.insert(Element::text(0.0, 0.0, "x", 20.0)).id;
        binding::bind_text_to_container(&mut scene, label, boxed, 5.0).unwrap();
        let mut tool = SelectTool::new();
        tool.pointer_down(&scene, Point::new(50.0, 25.0), Some(label), Modifiers::NONE);
        assert_eq!(tool.selected, vec![boxed]);
    }

    #[test]
    fn rect_tool_shift_draw_constrains_square() {
        let mut scene = Scene::new();
        let mut tool = ShapeTool::new(ToolKind::Rectangle);
        let id = created(tool.handle(&mut scene, &InputEvent::pointer_down(0.0, 0.0), None));

        let drag = InputEvent::PointerMove {
            x: 100.0,
            y: 60.0,
            pressure: 1.0,
            modifiers: shift(),
        };
        assert_eq!(tool.handle(&mut scene, &drag, None), ToolEffect::Updated(id));
        let el = scene.get(id).unwrap();
        assert_eq!((el.width, el.height), (100.0, 100.0));

        let up = tool.handle(&mut scene, &InputEvent::pointer_up(100.0, 60.0), None);
        assert_eq!(up, ToolEffect::Finished(id));
    }

    #[test]
    fn zero_size_shapes_are_discarded() {
        let mut scene = Scene::new();
        let mut tool = ShapeTool::new(ToolKind::Ellipse);
        let id = created(tool.handle(&mut scene, &InputEvent::pointer_down(5.0, 5.0), None));
        let up = tool.handle(&mut scene, &InputEvent::pointer_up(5.0, 5.0), None);
        assert_eq!(up, ToolEffect::Discarded(id));
        assert!(scene.get_live(id).is_none());
    }

    #[test]
    fn new_frame_takes_enclosed_elements() {
        let mut scene = Scene::new();
        let inside = scene.insert(Element::rectangle(20.0, 20.0, 30.0, 30.0)).id;
        let outside = scene.insert(Element::rectangle(500.0, 20.0, 30.0, 30.0)).id;
        let mut tool = ShapeTool::new(ToolKind::Frame);
        let frame_id = created(tool.handle(&mut scene, &InputEvent::pointer_down(0.0, 0.0), None));
        tool.handle(&mut scene, &InputEvent::pointer_move(200.0, 200.0), None);
        tool.handle(&mut scene, &InputEvent::pointer_up(200.0, 200.0), None);

        assert_eq!(scene.get(inside).unwrap().frame_id, Some(frame_id));
        assert_eq!(scene.get(outside).unwrap().frame_id, None);
    }

    #[test]
    fn arrow_binds_both_ends() {
        let mut scene = Scene::new();
        let a = scene.insert(Element::rectangle(0.0, 0.0, 100.0, 100.0)).id;
        let b = scene.insert(Element::rectangle(300.0, 0.0, 100.0, 100.0)).id;
        let mut tool = LinearTool::new(ToolKind::Arrow, 5.0);

        let id = created(tool.handle(&mut scene, &InputEvent::pointer_down(50.0, 50.0), None));
        tool.handle(&mut scene, &InputEvent::pointer_move(350.0, 50.0), None);
        let up = tool.handle(&mut scene, &InputEvent::pointer_up(350.0, 50.0), None);
        assert_eq!(up, ToolEffect::Finished(id));

        let arrow = scene.get(id).unwrap();
        let data = arrow.kind.as_arrow().unwrap();
        assert_eq!(data.start_binding.map(|b| b.element_id), Some(a));
        assert_eq!(data.end_binding.map(|b| b.element_id), Some(b));
    }

    #[test]
    fn elbow_arrow_draws_orthogonally() {
        let mut scene = Scene::new();
        let mut tool = LinearTool::new(ToolKind::ElbowArrow, 5.0);
        let id = created(tool.handle(&mut scene, &InputEvent::pointer_down(0.0, 0.0), None));
        tool.handle(&mut scene, &InputEvent::pointer_move(100.0, 60.0), None);
        let el = scene.get(id).unwrap();
        assert_eq!(
            el.points,
            vec![
                Point::ZERO,
                Point::new(50.0, 0.0),
                Point::new(50.0, 60.0),
                Point::new(100.0, 60.0)
            ]
        );
    }

    #[test]
    fn freedraw_collects_points() {
        let mut scene = Scene::new();
        let mut tool = FreeDrawTool::default();
        let id = created(tool.handle(&mut scene, &InputEvent::pointer_down(10.0, 10.0), None));
        tool.handle(&mut scene, &InputEvent::pointer_move(20.0, 15.0), None);
        tool.handle(&mut scene, &InputEvent::pointer_move(20.0, 15.0), None);
        tool.handle(&mut scene, &InputEvent::pointer_move(30.0, 5.0), None);
        assert_eq!(
            tool.handle(&mut scene, &InputEvent::pointer_up(30.0, 5.0), None),
            ToolEffect::Finished(id)
        );
        assert_eq!(scene.get(id).unwrap().points.len(), 3);
    }

    #[test]
    fn text_on_container_becomes_its_label() {
        let mut scene = Scene::new();
        let boxed = scene.insert(Element::rectangle(0.0, 0.0, 200.0, 100.0)).id;
        let mut tool = TextTool::new(5.0);
        let effect = tool.handle(&mut scene, &InputEvent::pointer_down(50.0, 50.0), Some(boxed));
        let ToolEffect::Finished(label) = effect else {
            panic!("expected Finished, got {effect:?}");
        };
        assert_eq!(scene.get(boxed).unwrap().bound_text_id(), Some(label));
    }
}
