//! Line object.

use super::{MapObjectTrait, ObjectId, visibility_alpha};
use crate::adjust::{AdjustOptions, AdjustmentPoint, HandleMode};
use crate::constraint::{ConstrainedPoint, PointKind};
use crate::error::ConstraintError;
use crate::geometry::{
    box_from_corners, distance_to_segment, length_and_unit, lerp_along, normal,
    segment_intersects_box,
};
use crate::registry::LineKind;
use crate::render::{DrawLayers, DrawStyle, Primitive};
use crate::scene::SceneView;
use crate::snap::{SnapKind, SnapPoint};
use kurbo::{BezPath, PathEl, Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Spacing of wave crests along the chord.
const WAVE_STEP: f64 = 32.0;
/// Distance of wave control points from their anchors.
const WAVE_AMPLITUDE: f64 = 8.0;
/// Flattening tolerance for the wave contour.
const WAVE_TOLERANCE: f64 = 0.25;
const DASH_LENGTH: f64 = 12.0;
const DASH_PERIOD: f64 = 20.0;
/// Half length of a barrier's end ticks.
const BARRIER_TICK: f64 = 20.0;
const BARRIER_TICK_WIDTH: f64 = 4.0;

/// A straight segment between two constrained endpoints.
///
/// How it renders and snaps depends on the [`LineKind`] registered for its
/// style name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub(crate) id: ObjectId,
    pub is_revealed: bool,
    #[serde(skip)]
    pub(crate) is_selected: bool,
    /// Start and end point.
    pub points: [ConstrainedPoint; 2],
    /// Line style name from the registry.
    pub style: String,
}

impl Line {
    /// Create a new revealed line.
    pub fn new(points: [ConstrainedPoint; 2], style: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            is_revealed: true,
            is_selected: false,
            points,
            style: style.to_string(),
        }
    }

    /// Resolved start and end point.
    pub fn endpoints(&self, view: &SceneView<'_>) -> (Point, Point) {
        (
            view.resolve(&self.points[0], PointKind::Line),
            view.resolve(&self.points[1], PointKind::Line),
        )
    }

    /// Resolved chord length.
    pub fn length(&self, view: &SceneView<'_>) -> f64 {
        let (a, b) = self.endpoints(view);
        (b - a).hypot()
    }

    fn kind(&self, view: &SceneView<'_>) -> LineKind {
        view.registry().line_kind(&self.style)
    }

    fn chord_path(a: Point, b: Point) -> BezPath {
        let mut path = BezPath::new();
        path.move_to(a);
        path.line_to(b);
        path
    }

    fn dash_path(a: Point, b: Point) -> BezPath {
        let mut path = BezPath::new();
        let Some((length, u)) = length_and_unit(b - a) else {
            return path;
        };
        let mut covered = 0.0;
        while covered < length {
            let dash = DASH_LENGTH.min(length - covered);
            path.move_to(a + u * covered);
            path.line_to(a + u * (covered + dash));
            covered += DASH_PERIOD;
        }
        path
    }

    fn snap_chord(&self, a: Point, b: Point, cursor: Point, radius: f64) -> Option<SnapPoint> {
        let distance = distance_to_segment(cursor, a, b, false)?;
        if distance > radius {
            return None;
        }
        let (length, u) = length_and_unit(b - a)?;
        let along = u.dot(cursor - a);
        Some(SnapPoint::new(a + u * along, self.id, along / length, SnapKind::Line))
    }

    fn snap_contour(&self, a: Point, b: Point, cursor: Point, radius: f64) -> Option<SnapPoint> {
        let (length, u) = length_and_unit(b - a)?;
        let along = u.dot(cursor - a);
        let point = contour_point(&wave_contour(a, b), a, u, along)?;
        if (point - cursor).hypot() > radius {
            return None;
        }
        Some(SnapPoint::new(point, self.id, along / length, SnapKind::LineContour))
    }
}

/// Wavy rendering of the chord `a`-`b`: cubic arcs with a crest every
/// [`WAVE_STEP`] units, alternating sides.
pub fn wave_path(a: Point, b: Point) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(a);
    let Some((length, u)) = length_and_unit(b - a) else {
        return path;
    };
    let mut n = normal(u);
    let intermediate = ((length - 16.0) / WAVE_STEP).floor().max(0.0) as usize;
    let anchors = (1..=intermediate)
        .map(|j| a + u * (WAVE_STEP * j as f64))
        .chain(std::iter::once(b));

    let mut prev = a;
    for next in anchors {
        let cp1 = prev + (u + n) * WAVE_AMPLITUDE;
        let cp2 = next + (-u + n) * WAVE_AMPLITUDE;
        path.curve_to(cp1, cp2, next);
        prev = next;
        n = -n;
    }
    path
}

/// The wave path flattened to a polyline.
fn wave_contour(a: Point, b: Point) -> Vec<Point> {
    let mut points = Vec::new();
    kurbo::flatten(wave_path(a, b), WAVE_TOLERANCE, |el| match el {
        PathEl::MoveTo(p) | PathEl::LineTo(p) => points.push(p),
        _ => {}
    });
    points
}

/// Point on a flattened contour whose projection onto the chord direction `u`
/// lies `along` units from `origin`.
///
/// Walks the polyline to the first piece whose projected extent brackets
/// `along`, then interpolates within it.
fn contour_point(contour: &[Point], origin: Point, u: Vec2, along: f64) -> Option<Point> {
    contour.windows(2).find_map(|piece| {
        let l1 = u.dot(piece[0] - origin);
        let l2 = u.dot(piece[1] - origin);
        (l1 <= along && l2 > along).then(|| piece[0].lerp(piece[1], (along - l1) / (l2 - l1)))
    })
}

impl MapObjectTrait for Line {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn is_revealed(&self) -> bool {
        self.is_revealed
    }

    fn set_revealed(&mut self, revealed: bool) {
        self.is_revealed = revealed;
    }

    fn is_selected(&self) -> bool {
        self.is_selected
    }

    fn set_selected(&mut self, selected: bool) {
        self.is_selected = selected;
    }

    fn sources(&self) -> Vec<ObjectId> {
        self.points.iter().filter_map(ConstrainedPoint::source).collect()
    }

    fn draw(&self, view: &SceneView<'_>, style: &DrawStyle, layers: &mut DrawLayers) {
        if !style.is_visible(self.is_revealed) {
            return;
        }
        let (a, b) = self.endpoints(view);
        let kind = self.kind(view);
        let color = style.current_color(self.is_selected);
        let alpha = visibility_alpha(self.is_revealed, kind.hidden_alpha());

        let path = match kind {
            LineKind::Solid | LineKind::Barrier => Self::chord_path(a, b),
            LineKind::Dashed => Self::dash_path(a, b),
            LineKind::Wavy => wave_path(a, b),
        };
        layers.lines.push(Primitive::Stroke {
            path,
            width: kind.stroke_width(),
            color,
            alpha,
        });

        if kind == LineKind::Barrier {
            if let Some((_, u)) = length_and_unit(b - a) {
                let n = normal(u) * BARRIER_TICK;
                let mut ticks = BezPath::new();
                for end in [a, b] {
                    ticks.move_to(end + n);
                    ticks.line_to(end - n);
                }
                layers.lines.push(Primitive::Stroke {
                    path: ticks,
                    width: BARRIER_TICK_WIDTH,
                    color,
                    alpha,
                });
            }
        }
    }

    fn hit_test(&self, view: &SceneView<'_>, point: Point, corner: Option<Point>) -> bool {
        let (a, b) = self.endpoints(view);
        match corner {
            Some(corner) => segment_intersects_box(a, b, box_from_corners(point, corner)),
            None => {
                let tolerance = view
                    .registry()
                    .line_style(&self.style)
                    .map(|s| s.select_tolerance)
                    .unwrap_or_default();
                distance_to_segment(point, a, b, true).is_some_and(|d| d <= tolerance)
            }
        }
    }

    fn snap_points(&self, view: &SceneView<'_>, cursor: Point, kinds: &[SnapKind]) -> Vec<SnapPoint> {
        let radii = view.registry().snap;
        let (a, b) = self.endpoints(view);
        let mut result = Vec::new();

        if kinds.contains(&SnapKind::LineEnd) {
            for (t, end) in [(0.0, a), (1.0, b)] {
                if (cursor - end).hypot() <= radii.line_end {
                    result.push(SnapPoint::new(end, self.id, t, SnapKind::LineEnd));
                }
            }
        }
        if !result.is_empty() {
            return result;
        }

        let wavy = self.kind(view) == LineKind::Wavy;
        if wavy && kinds.contains(&SnapKind::LineContour) {
            result.extend(self.snap_contour(a, b, cursor, radii.line));
        }
        let wants_chord = kinds.contains(&SnapKind::Line)
            || (!wavy && kinds.contains(&SnapKind::LineContour));
        if result.is_empty() && wants_chord {
            result.extend(self.snap_chord(a, b, cursor, radii.line));
        }
        result
    }

    fn adjustment_points(&self, view: &SceneView<'_>, _mode: HandleMode) -> Vec<AdjustmentPoint> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, cp)| {
                AdjustmentPoint::new(
                    self.id,
                    i,
                    view.resolve(cp, PointKind::Line),
                    PointKind::Line,
                    cp.is_bound(),
                )
            })
            .collect()
    }

    fn set_adjustment_point(
        &mut self,
        view: &SceneView<'_>,
        index: usize,
        point: &ConstrainedPoint,
        _options: AdjustOptions,
    ) -> Result<(), ConstraintError> {
        let owner = self.id;
        match self.points.get_mut(index) {
            Some(slot) => slot.set_from(point, owner, view),
            None => Ok(()),
        }
    }

    fn parametric_point(&self, view: &SceneView<'_>, t: f64, kind: PointKind) -> Point {
        let (a, b) = self.endpoints(view);
        if kind == PointKind::Line && self.kind(view) == LineKind::Wavy {
            if let Some((length, u)) = length_and_unit(b - a) {
                if let Some(p) = contour_point(&wave_contour(a, b), a, u, length * t) {
                    return p;
                }
            }
        }
        lerp_along(a, b, t)
    }

    fn parametric_orientation(&self, view: &SceneView<'_>, _t: f64) -> f64 {
        let (a, b) = self.endpoints(view);
        (b - a).atan2()
    }

    fn text_ascent(&self, view: &SceneView<'_>) -> f64 {
        self.kind(view).stroke_width() / 2.0 + 5.0
    }

    fn retain_known_sources(&mut self, known: &HashSet<ObjectId>) {
        for cp in &mut self.points {
            cp.retain_known(known);
        }
    }
}
