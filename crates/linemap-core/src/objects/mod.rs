//! Map objects: lines, areas, symbols, waypoints and text labels.

mod area;
mod line;
mod symbol;
mod text;

pub use area::{Area, MIN_AREA_VERTICES};
pub use line::Line;
pub use symbol::{Symbol, Waypoint};
pub use text::{Text, TextStyle};

use crate::adjust::{AdjustOptions, AdjustmentPoint, HandleMode};
use crate::constraint::{ConstrainedPoint, PointKind};
use crate::error::ConstraintError;
use crate::render::{DrawLayers, DrawStyle};
use crate::scene::SceneView;
use crate::snap::{SnapKind, SnapPoint};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Unique identifier for map objects.
pub type ObjectId = Uuid;

/// Opacity for a revealed object or a hidden one seen by a privileged user.
pub(crate) fn visibility_alpha(is_revealed: bool, hidden_alpha: f64) -> f64 {
    if is_revealed { 1.0 } else { hidden_alpha }
}

/// Capability interface shared by every object variant.
///
/// Geometry is evaluated through a [`SceneView`] because bound points resolve
/// through other objects.
pub trait MapObjectTrait {
    /// Get the unique identifier.
    fn id(&self) -> ObjectId;

    fn is_revealed(&self) -> bool;

    fn set_revealed(&mut self, revealed: bool);

    fn is_selected(&self) -> bool;

    fn set_selected(&mut self, selected: bool);

    /// Objects this one is directly bound to.
    fn sources(&self) -> Vec<ObjectId>;

    /// Emit rendering primitives. Emits nothing when not visible.
    fn draw(&self, view: &SceneView<'_>, style: &DrawStyle, layers: &mut DrawLayers);

    /// Point containment, or region intersection when `corner` is given.
    fn hit_test(&self, view: &SceneView<'_>, point: Point, corner: Option<Point>) -> bool;

    /// Snap targets near `cursor` of the allowed kinds.
    fn snap_points(&self, _view: &SceneView<'_>, _cursor: Point, _kinds: &[SnapKind]) -> Vec<SnapPoint> {
        Vec::new()
    }

    /// Editable coordinate slots.
    fn adjustment_points(&self, view: &SceneView<'_>, mode: HandleMode) -> Vec<AdjustmentPoint>;

    /// Move one slot. A returned [`ConstraintError::Cycle`] still means the
    /// point was moved (as a free point); other errors mean nothing changed.
    fn set_adjustment_point(
        &mut self,
        view: &SceneView<'_>,
        index: usize,
        point: &ConstrainedPoint,
        options: AdjustOptions,
    ) -> Result<(), ConstraintError>;

    /// Position at parameter `t` along this object.
    fn parametric_point(&self, view: &SceneView<'_>, t: f64, kind: PointKind) -> Point;

    /// Tangent angle at parameter `t`.
    fn parametric_orientation(&self, _view: &SceneView<'_>, _t: f64) -> f64 {
        0.0
    }

    /// Clearance a label needs to sit just outside this object.
    fn text_ascent(&self, _view: &SceneView<'_>) -> f64 {
        0.0
    }

    /// Free every binding whose source is not in `known`.
    fn retain_known_sources(&mut self, known: &HashSet<ObjectId>);
}

/// Closed set of object variants. Persisted with a `type` discriminator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MapObject {
    Line(Line),
    Area(Area),
    Symbol(Symbol),
    Waypoint(Waypoint),
    Text(Text),
}

impl MapObject {
    fn as_object(&self) -> &dyn MapObjectTrait {
        match self {
            MapObject::Line(o) => o,
            MapObject::Area(o) => o,
            MapObject::Symbol(o) => o,
            MapObject::Waypoint(o) => o,
            MapObject::Text(o) => o,
        }
    }

    fn as_object_mut(&mut self) -> &mut dyn MapObjectTrait {
        match self {
            MapObject::Line(o) => o,
            MapObject::Area(o) => o,
            MapObject::Symbol(o) => o,
            MapObject::Waypoint(o) => o,
            MapObject::Text(o) => o,
        }
    }

    /// Persisted type discriminator.
    pub fn type_name(&self) -> &'static str {
        match self {
            MapObject::Line(_) => "line",
            MapObject::Area(_) => "area",
            MapObject::Symbol(_) => "symbol",
            MapObject::Waypoint(_) => "waypoint",
            MapObject::Text(_) => "text",
        }
    }

    pub fn id(&self) -> ObjectId {
        self.as_object().id()
    }

    pub fn is_revealed(&self) -> bool {
        self.as_object().is_revealed()
    }

    pub fn set_revealed(&mut self, revealed: bool) {
        self.as_object_mut().set_revealed(revealed);
    }

    pub fn is_selected(&self) -> bool {
        self.as_object().is_selected()
    }

    pub fn set_selected(&mut self, selected: bool) {
        self.as_object_mut().set_selected(selected);
    }

    pub fn sources(&self) -> Vec<ObjectId> {
        self.as_object().sources()
    }

    /// Symbols and waypoints win hit-test ties over everything else.
    pub fn is_icon(&self) -> bool {
        matches!(self, MapObject::Symbol(_) | MapObject::Waypoint(_))
    }

    pub fn draw(&self, view: &SceneView<'_>, style: &DrawStyle, layers: &mut DrawLayers) {
        self.as_object().draw(view, style, layers);
    }

    pub fn hit_test(&self, view: &SceneView<'_>, point: Point, corner: Option<Point>) -> bool {
        self.as_object().hit_test(view, point, corner)
    }

    pub fn snap_points(&self, view: &SceneView<'_>, cursor: Point, kinds: &[SnapKind]) -> Vec<SnapPoint> {
        self.as_object().snap_points(view, cursor, kinds)
    }

    pub fn adjustment_points(&self, view: &SceneView<'_>, mode: HandleMode) -> Vec<AdjustmentPoint> {
        self.as_object().adjustment_points(view, mode)
    }

    pub fn set_adjustment_point(
        &mut self,
        view: &SceneView<'_>,
        index: usize,
        point: &ConstrainedPoint,
        options: AdjustOptions,
    ) -> Result<(), ConstraintError> {
        self.as_object_mut().set_adjustment_point(view, index, point, options)
    }

    pub fn parametric_point(&self, view: &SceneView<'_>, t: f64, kind: PointKind) -> Point {
        self.as_object().parametric_point(view, t, kind)
    }

    pub fn parametric_orientation(&self, view: &SceneView<'_>, t: f64) -> f64 {
        self.as_object().parametric_orientation(view, t)
    }

    pub fn text_ascent(&self, view: &SceneView<'_>) -> f64 {
        self.as_object().text_ascent(view)
    }

    pub fn retain_known_sources(&mut self, known: &HashSet<ObjectId>) {
        self.as_object_mut().retain_known_sources(known);
    }

    pub fn as_line(&self) -> Option<&Line> {
        match self {
            MapObject::Line(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_area(&self) -> Option<&Area> {
        match self {
            MapObject::Area(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_area_mut(&mut self) -> Option<&mut Area> {
        match self {
            MapObject::Area(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            MapObject::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut Text> {
        match self {
            MapObject::Text(t) => Some(t),
            _ => None,
        }
    }
}
