//! Scene element data model.
//!
//! Every visual thing on the canvas is an [`Element`]. The per-kind payload
//! lives in the closed [`ElementKind`] enum so that bounds, bindability,
//! outline and shape generation are exhaustive `match`es: adding a kind
//! without teaching those sites about it does not compile.
//!
//! Elements are values. The store hands out `Arc<Element>` snapshots and
//! only the mutation gateway (`crate::mutate`) produces new ones.

use crate::cuboid::DualView;
use crate::geometry;
use crate::id::ElementId;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
    /// The literal `transparent` is accepted as well.
    pub fn from_hex(hex: &str) -> Option<Self> {
        if hex.eq_ignore_ascii_case("transparent") {
            return Some(Self::TRANSPARENT);
        }
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let pair = |i: usize| -> Option<f32> {
            Some((hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?) as f32 / 255.0)
        };

        match bytes.len() {
            3 => {
                let r = hex_val(bytes[0])?;
                let g = hex_val(bytes[1])?;
                let b = hex_val(bytes[2])?;
                Some(Self::rgba(
                    (r * 17) as f32 / 255.0,
                    (g * 17) as f32 / 255.0,
                    (b * 17) as f32 / 255.0,
                    1.0,
                ))
            }
            6 => Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, 1.0)),
            8 => Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, pair(6)?)),
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (
            channel(self.r),
            channel(self.g),
            channel(self.b),
            channel(self.a),
        );
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.a <= f32::EPSILON
    }
}

// ─── Style ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillStyle {
    #[default]
    Hachure,
    CrossHatch,
    Solid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// Corner rounding policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Roundness {
    /// Radius is a fixed fraction of the shorter side.
    Proportional,
    /// Proportional for small shapes, capped at a fixed radius for big ones.
    Adaptive,
}

/// Presentation attributes. They matter to shape generation, never to
/// binding geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementStyle {
    pub stroke_color: Color,
    pub background_color: Color,
    pub fill_style: FillStyle,
    pub stroke_width: f64,
    pub stroke_style: StrokeStyle,
    /// 0 = architect (clean), 1 = artist, 2 = cartoonist.
    pub roughness: f64,
    /// 0..=100
    pub opacity: f64,
    pub roundness: Option<Roundness>,
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            stroke_color: Color::BLACK,
            background_color: Color::TRANSPARENT,
            fill_style: FillStyle::Hachure,
            stroke_width: 2.0,
            stroke_style: StrokeStyle::Solid,
            roughness: 1.0,
            opacity: 100.0,
            roundness: None,
        }
    }
}

// ─── Text ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VerticalAlign {
    Top,
    #[default]
    Middle,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextData {
    /// Displayed text, already wrapped to the current width.
    pub text: String,
    /// Text as typed, before wrapping.
    pub original_text: String,
    pub font_size: f64,
    /// Line height as a multiple of `font_size`.
    pub line_height: f64,
    pub text_align: TextAlign,
    pub vertical_align: VerticalAlign,
    /// The element this label sits inside (shape or arrow).
    pub container_id: Option<ElementId>,
}

// ─── Linear ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Arrowhead {
    Arrow,
    Triangle,
    Dot,
    Bar,
}

/// Which end of a linear element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArrowEnd {
    Start,
    End,
}

/// Arrow endpoint anchored to another element.
///
/// The binding is a relation plus a recompute rule: the absolute endpoint is
/// derived from the target's current geometry every time it moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointBinding {
    pub element_id: ElementId,
    /// Anchor as a ratio of the target's unrotated bounds, `[fx, fy]`.
    pub fixed_point: [f64; 2],
    /// Distance kept between the outline and the endpoint.
    pub gap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowData {
    pub start_binding: Option<PointBinding>,
    pub end_binding: Option<PointBinding>,
    pub start_arrowhead: Option<Arrowhead>,
    pub end_arrowhead: Option<Arrowhead>,
    /// Orthogonal routing with rounded corners.
    pub elbowed: bool,
}

impl Default for ArrowData {
    fn default() -> Self {
        Self {
            start_binding: None,
            end_binding: None,
            start_arrowhead: None,
            end_arrowhead: Some(Arrowhead::Arrow),
            elbowed: false,
        }
    }
}

impl ArrowData {
    pub fn binding(&self, end: ArrowEnd) -> Option<&PointBinding> {
        match end {
            ArrowEnd::Start => self.start_binding.as_ref(),
            ArrowEnd::End => self.end_binding.as_ref(),
        }
    }

    pub fn binding_mut(&mut self, end: ArrowEnd) -> &mut Option<PointBinding> {
        match end {
            ArrowEnd::Start => &mut self.start_binding,
            ArrowEnd::End => &mut self.end_binding,
        }
    }

    pub fn is_bound_to(&self, target: ElementId) -> bool {
        self.start_binding.is_some_and(|b| b.element_id == target)
            || self.end_binding.is_some_and(|b| b.element_id == target)
    }
}

// ─── Kinds ───────────────────────────────────────────────────────────────

/// Closed set of element kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ElementKind {
    Rectangle,
    Diamond,
    Ellipse,
    Frame { name: Option<String> },
    /// Box with a plan ("top") and an elevation representation.
    Cuboid,
    Text(TextData),
    FreeDraw,
    Line,
    Arrow(ArrowData),
}

impl ElementKind {
    /// Prefix used for generated IDs.
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementKind::Rectangle => "rectangle",
            ElementKind::Diamond => "diamond",
            ElementKind::Ellipse => "ellipse",
            ElementKind::Frame { .. } => "frame",
            ElementKind::Cuboid => "cuboid",
            ElementKind::Text(_) => "text",
            ElementKind::FreeDraw => "freedraw",
            ElementKind::Line => "line",
            ElementKind::Arrow(_) => "arrow",
        }
    }

    /// Geometry is carried by `points` rather than width/height.
    pub fn is_linear(&self) -> bool {
        match self {
            ElementKind::FreeDraw | ElementKind::Line | ElementKind::Arrow(_) => true,
            ElementKind::Rectangle
            | ElementKind::Diamond
            | ElementKind::Ellipse
            | ElementKind::Frame { .. }
            | ElementKind::Cuboid
            | ElementKind::Text(_) => false,
        }
    }

    /// Can arrows anchor to this kind?
    pub fn is_bindable(&self) -> bool {
        match self {
            ElementKind::Rectangle
            | ElementKind::Diamond
            | ElementKind::Ellipse
            | ElementKind::Frame { .. }
            | ElementKind::Cuboid
            | ElementKind::Text(_) => true,
            ElementKind::FreeDraw | ElementKind::Line | ElementKind::Arrow(_) => false,
        }
    }

    /// Can this kind host a bound text label?
    pub fn is_text_container(&self) -> bool {
        match self {
            ElementKind::Rectangle
            | ElementKind::Diamond
            | ElementKind::Ellipse
            | ElementKind::Cuboid
            | ElementKind::Arrow(_) => true,
            ElementKind::Frame { .. }
            | ElementKind::Text(_)
            | ElementKind::FreeDraw
            | ElementKind::Line => false,
        }
    }

    pub fn is_frame(&self) -> bool {
        matches!(self, ElementKind::Frame { .. })
    }

    pub fn as_arrow(&self) -> Option<&ArrowData> {
        match self {
            ElementKind::Arrow(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextData> {
        match self {
            ElementKind::Text(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_elbow_arrow(&self) -> bool {
        self.as_arrow().is_some_and(|a| a.elbowed)
    }
}

/// What kind of relation a `bound_elements` entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundKind {
    Arrow,
    Text,
}

/// Back-reference from a target to an element bound to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundElement {
    pub id: ElementId,
    pub kind: BoundKind,
}

// ─── Element ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,

    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Rotation around the center, in radians.
    pub angle: f64,
    /// Local points relative to `(x, y)`; linear kinds only.
    pub points: Vec<Point>,

    pub style: ElementStyle,
    /// Seed for the hand-drawn jitter.
    pub seed: u32,

    pub version: u32,
    pub version_nonce: u32,
    pub is_deleted: bool,
    /// Unix time in milliseconds of the last mutation.
    pub updated: i64,

    pub frame_id: Option<ElementId>,
    pub bound_elements: SmallVec<[BoundElement; 2]>,

    pub locked: bool,
    pub hidden: bool,
    pub link: Option<String>,

    pub dual_view: Option<DualView>,
}

impl Element {
    /// Fresh element: new id, version 1, random nonce and seed.
    pub fn new(kind: ElementKind, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: ElementId::fresh(kind.type_name()),
            kind,
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
            angle: 0.0,
            points: Vec::new(),
            style: ElementStyle::default(),
            seed: rand::random(),
            version: 1,
            version_nonce: rand::random(),
            is_deleted: false,
            updated: chrono::Utc::now().timestamp_millis(),
            frame_id: None,
            bound_elements: SmallVec::new(),
            locked: false,
            hidden: false,
            link: None,
            dual_view: None,
        }
    }

    pub fn rectangle(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(ElementKind::Rectangle, x, y, width, height)
    }

    pub fn diamond(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(ElementKind::Diamond, x, y, width, height)
    }

    pub fn ellipse(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(ElementKind::Ellipse, x, y, width, height)
    }

    pub fn frame(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(ElementKind::Frame { name: None }, x, y, width, height)
    }

    pub fn cuboid(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(ElementKind::Cuboid, x, y, width, height)
    }

    /// Free-standing text sized to its content.
    pub fn text(x: f64, y: f64, content: &str, font_size: f64) -> Self {
        let line_height = crate::text::DEFAULT_LINE_HEIGHT;
        let (w, h) = crate::text::measure_text(content, font_size, line_height);
        Self::new(
            ElementKind::Text(TextData {
                text: content.to_string(),
                original_text: content.to_string(),
                font_size,
                line_height,
                text_align: TextAlign::Left,
                vertical_align: VerticalAlign::Top,
                container_id: None,
            }),
            x,
            y,
            w,
            h,
        )
    }

    pub fn line(x: f64, y: f64, points: Vec<Point>) -> Self {
        Self::new(ElementKind::Line, x, y, 0.0, 0.0).with_points(points)
    }

    pub fn arrow(x: f64, y: f64, points: Vec<Point>) -> Self {
        Self::new(ElementKind::Arrow(ArrowData::default()), x, y, 0.0, 0.0).with_points(points)
    }

    pub fn elbow_arrow(x: f64, y: f64, points: Vec<Point>) -> Self {
        let data = ArrowData {
            elbowed: true,
            ..ArrowData::default()
        };
        Self::new(ElementKind::Arrow(data), x, y, 0.0, 0.0).with_points(points)
    }

    pub fn freedraw(x: f64, y: f64, points: Vec<Point>) -> Self {
        Self::new(ElementKind::FreeDraw, x, y, 0.0, 0.0).with_points(points)
    }

    /// Set local points and derive width/height from their extent.
    pub fn with_points(mut self, points: Vec<Point>) -> Self {
        let (w, h) = geometry::points_extent(&points);
        self.points = points;
        self.width = w;
        self.height = h;
        self
    }

    pub fn with_style(mut self, style: ElementStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_angle(mut self, angle: f64) -> Self {
        self.angle = angle;
        self
    }

    pub fn is_live(&self) -> bool {
        !self.is_deleted
    }

    /// Live and not hidden by the visibility toggle.
    pub fn is_visible(&self) -> bool {
        !self.is_deleted && !self.hidden
    }

    /// Unrotated box `(x, y, x + width, y + height)`.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// Axis-aligned bounds in scene coordinates (rotation applied).
    pub fn bounds(&self) -> Rect {
        geometry::element_bounds(self)
    }

    /// Rotation center.
    pub fn center(&self) -> Point {
        geometry::unrotated_rect(self).center()
    }

    pub fn bound_text_id(&self) -> Option<ElementId> {
        self.bound_elements
            .iter()
            .find(|b| b.kind == BoundKind::Text)
            .map(|b| b.id)
    }
}
