//! Hand-drawn strokes and fills through `roughr`.
//!
//! Each element gets one set of roughr `Options` seeded from
//! `Element::seed`, so the same element always produces the same wobble.
//! Op sets come back as kurbo paths in the element's local frame.

use canvas_core::model::{Color, Element, ElementKind, FillStyle, StrokeStyle};
use kurbo::{BezPath, Point};
use roughr::Point2D;
use roughr::core::{OpSet, OpType, Options, OptionsBuilder};

/// Roughness at and above which vertices may wander.
const CARTOONIST: f64 = 2.0;

fn dash_dashed(stroke_width: f64) -> [f64; 2] {
    [8.0, 8.0 + stroke_width]
}

fn dash_dotted(stroke_width: f64) -> [f64; 2] {
    [1.5, 6.0 + stroke_width]
}

/// Small shapes get less jitter so they stay legible.
pub fn adjust_roughness(el: &Element) -> f64 {
    let roughness = el.style.roughness;
    let max_size = el.width.max(el.height);
    let min_size = el.width.min(el.height);

    let keep = (min_size >= 20.0 && max_size >= 50.0)
        || (min_size >= 15.0 && el.style.roundness.is_some() && can_change_roundness(&el.kind))
        || (el.kind.is_linear() && max_size >= 50.0);
    if keep {
        return roughness;
    }
    (roughness / if max_size < 10.0 { 3.0 } else { 2.0 }).min(2.5)
}

fn can_change_roundness(kind: &ElementKind) -> bool {
    match kind {
        ElementKind::Rectangle
        | ElementKind::Diamond
        | ElementKind::Cuboid
        | ElementKind::Line
        | ElementKind::Arrow(_) => true,
        ElementKind::Ellipse
        | ElementKind::Frame { .. }
        | ElementKind::Text(_)
        | ElementKind::FreeDraw => false,
    }
}

/// First and last point close enough to count as a closed path.
pub fn is_path_a_loop(points: &[Point]) -> bool {
    const LOOP_THRESHOLD: f64 = 8.0;
    match (points.first(), points.last()) {
        (Some(a), Some(b)) if points.len() >= 3 => (*a - *b).hypot() <= LOOP_THRESHOLD,
        _ => false,
    }
}

/// Seeded roughr options plus the paint an element's strokes carry.
#[derive(Clone)]
pub struct Sketch {
    options: Options,
    pub stroke: Color,
    pub stroke_width: f64,
    /// `[dash, gap]`
    pub dash: Option<[f64; 2]>,
    pub fill: Option<Color>,
    pub fill_style: FillStyle,
    pub fill_weight: f64,
}

impl Sketch {
    /// Sketch settings for `el`. `continuous_path` keeps vertices in place,
    /// which matters for paths with curved corners.
    pub fn for_element(el: &Element, continuous_path: bool) -> Self {
        let style = &el.style;
        let solid = style.stroke_style == StrokeStyle::Solid;
        let fill = (!style.background_color.is_transparent()).then_some(style.background_color);
        let fill = match &el.kind {
            ElementKind::Rectangle
            | ElementKind::Diamond
            | ElementKind::Ellipse
            | ElementKind::Cuboid => fill,
            ElementKind::Line | ElementKind::FreeDraw => fill.filter(|_| is_path_a_loop(&el.points)),
            ElementKind::Arrow(_) | ElementKind::Frame { .. } | ElementKind::Text(_) => None,
        };
        let stroke_width = if solid {
            style.stroke_width
        } else {
            style.stroke_width + 0.5
        };
        let curve_fitting = if matches!(el.kind, ElementKind::Ellipse) {
            1.0
        } else {
            0.95
        };

        let options = OptionsBuilder::default()
            // A zero seed makes roughr fall back to an unseeded generator.
            .seed(u64::from(el.seed.max(1)))
            .roughness(adjust_roughness(el) as f32)
            .bowing(1.0)
            .stroke_width(stroke_width as f32)
            .curve_fitting(curve_fitting)
            .fill_style(rough_fill(style.fill_style))
            .fill_weight((style.stroke_width / 2.0) as f32)
            .hachure_angle(-41.0)
            .hachure_gap((style.stroke_width * 4.0) as f32)
            .disable_multi_stroke(!solid)
            .preserve_vertices(continuous_path || style.roughness < CARTOONIST)
            .build()
            .unwrap_or_default();

        Self {
            options,
            stroke: style.stroke_color,
            stroke_width,
            dash: match style.stroke_style {
                StrokeStyle::Solid => None,
                StrokeStyle::Dashed => Some(dash_dashed(style.stroke_width)),
                StrokeStyle::Dotted => Some(dash_dotted(style.stroke_width)),
            },
            fill,
            fill_style: style.fill_style,
            fill_weight: style.stroke_width / 2.0,
        }
    }

    /// Calmer, undashed, unfilled variant for arrowheads.
    pub fn for_head(&self) -> Self {
        let mut head = self.clone();
        head.options.roughness = Some(head.options.roughness.unwrap_or(1.0).min(1.0));
        head.options.disable_multi_stroke = Some(false);
        head.dash = None;
        head.fill = None;
        head
    }

    pub fn line(&mut self, a: Point, b: Point) -> BezPath {
        to_path(&roughr::renderer::line::<f64>(a.x, a.y, b.x, b.y, &mut self.options))
    }

    pub fn rectangle(&mut self, width: f64, height: f64) -> BezPath {
        to_path(&roughr::renderer::rectangle::<f64>(0.0, 0.0, width, height, &mut self.options))
    }

    /// Closed outline through `points`.
    pub fn polygon(&mut self, points: &[Point]) -> BezPath {
        let points: Vec<Point2D<f64, euclid::UnknownUnit>> = points.iter().map(|p| to_point2d(*p)).collect();
        to_path(&roughr::renderer::polygon::<f64>(&points, &mut self.options))
    }

    pub fn ellipse(&mut self, center: Point, width: f64, height: f64) -> BezPath {
        to_path(&roughr::renderer::ellipse::<f64>(
            center.x,
            center.y,
            width,
            height,
            &mut self.options,
        ))
    }

    /// Rough rendition of an exact path, including its curves.
    pub fn path(&mut self, path: &BezPath) -> BezPath {
        if path.elements().is_empty() {
            return BezPath::new();
        }
        to_path(&roughr::renderer::svg_path::<f64>(path.to_svg(), &mut self.options))
    }

    /// Fill geometry for `polygon`: a jittered area for solid fills, hatch
    /// strokes otherwise.
    pub fn fill_polygon(&mut self, polygon: &[Point]) -> BezPath {
        if polygon.len() < 3 {
            return BezPath::new();
        }
        let mut polygons = vec![polygon.iter().map(|p| to_point2d(*p)).collect::<Vec<_>>()];
        let set = match self.fill_style {
            FillStyle::Solid => roughr::renderer::solid_fill_polygon(&polygons, &mut self.options),
            FillStyle::Hachure | FillStyle::CrossHatch => {
                roughr::renderer::pattern_fill_polygons(&mut polygons, &mut self.options)
            }
        };
        to_path(&set)
    }
}

fn rough_fill(style: FillStyle) -> roughr::core::FillStyle {
    match style {
        FillStyle::Solid => roughr::core::FillStyle::Solid,
        FillStyle::Hachure => roughr::core::FillStyle::Hachure,
        FillStyle::CrossHatch => roughr::core::FillStyle::CrossHatch,
    }
}

fn to_point2d(p: Point) -> Point2D<f64, euclid::UnknownUnit> {
    Point2D::new(p.x, p.y)
}

/// Op set → kurbo path. Ops with short data are skipped.
pub fn to_path(set: &OpSet<f64>) -> BezPath {
    let mut path = BezPath::new();
    let mut open = false;
    for op in &set.ops {
        let d = &op.data;
        match op.op {
            OpType::Move if d.len() >= 2 => {
                path.move_to((d[0], d[1]));
                open = true;
            }
            OpType::LineTo if d.len() >= 2 && open => path.line_to((d[0], d[1])),
            OpType::BCurveTo if d.len() >= 6 && open => {
                path.curve_to((d[0], d[1]), (d[2], d[3]), (d[4], d[5]))
            }
            _ => {}
        }
    }
    path
}
