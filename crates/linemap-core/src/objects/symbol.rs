//! Icon objects: map symbols and line-attached waypoints.

use super::{MapObject, MapObjectTrait, ObjectId, visibility_alpha};
use crate::adjust::{AdjustOptions, AdjustmentPoint, HandleMode};
use crate::constraint::{ConstrainedPoint, PointKind};
use crate::error::ConstraintError;
use crate::geometry::{box_contains, box_from_corners, boxes_intersect};
use crate::registry::{IconEntry, Registry};
use crate::render::{DrawLayers, DrawStyle, Primitive};
use crate::scene::SceneView;
use crate::snap::{SnapKind, SnapPoint};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

const HIDDEN_ALPHA: f64 = 0.4;
/// Icons render at half their native size before the scene's symbol scale.
const BASE_SCALE: f64 = 0.5;
/// Gap between an icon's edge and a label placed next to it.
const TEXT_GAP: f64 = 5.0;

/// A single-point icon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    pub(crate) id: ObjectId,
    pub is_revealed: bool,
    #[serde(skip)]
    pub(crate) is_selected: bool,
    pub point: ConstrainedPoint,
    /// Icon kind name from the registry.
    pub symbol: String,
}

/// An icon that sits on a line and turns with it.
///
/// Waypoints only accept bound points whose source is a [`Line`](super::Line).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Waypoint(Symbol);

impl Symbol {
    /// Create a new revealed symbol.
    pub fn new(point: ConstrainedPoint, symbol: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            is_revealed: true,
            is_selected: false,
            point,
            symbol: symbol.to_string(),
        }
    }

    /// Resolved anchor position.
    pub fn position(&self, view: &SceneView<'_>) -> Point {
        view.resolve(&self.point, PointKind::Point)
    }

    fn entry<'r>(&self, registry: &'r Registry) -> Option<&'r IconEntry> {
        registry.symbol(&self.symbol)
    }

    fn draw_icon(
        &self,
        view: &SceneView<'_>,
        style: &DrawStyle,
        layers: &mut DrawLayers,
        entry: Option<&IconEntry>,
        rotation: f64,
    ) {
        let Some(entry) = entry else {
            log::warn!("No icon registered for {}", self.symbol);
            return;
        };
        if !style.is_visible(self.is_revealed) {
            return;
        }
        let center = self.position(view);
        let scale = icon_scale(view);
        layers.symbols.push(Primitive::Sprite {
            asset: entry.icon.clone(),
            center,
            rotation,
            scale,
            tint: style.current_color(self.is_selected),
            alpha: visibility_alpha(self.is_revealed, HIDDEN_ALPHA),
        });
        if let Some(footprint) = &entry.footprint {
            layers.footprints.push(Primitive::Sprite {
                asset: footprint.clone(),
                center,
                rotation,
                scale,
                tint: style.object_color(),
                alpha: 1.0,
            });
        }
    }

    fn sprite_size(view: &SceneView<'_>, entry: Option<&IconEntry>) -> Vec2 {
        entry
            .map(|e| Vec2::new(e.width, e.height) * icon_scale(view))
            .unwrap_or(Vec2::ZERO)
    }

    fn hit_sprite(
        &self,
        view: &SceneView<'_>,
        entry: Option<&IconEntry>,
        point: Point,
        corner: Option<Point>,
    ) -> bool {
        let half = Self::sprite_size(view, entry) / 2.0;
        let center = self.position(view);
        let sprite = Rect::from_points(center - half, center + half);
        match corner {
            Some(corner) => boxes_intersect(box_from_corners(point, corner), sprite),
            None => box_contains(sprite, point),
        }
    }

    fn ascent(view: &SceneView<'_>, entry: Option<&IconEntry>) -> f64 {
        Self::sprite_size(view, entry).y / 2.0 + TEXT_GAP
    }

    fn anchor_snap(&self, view: &SceneView<'_>, cursor: Point, kinds: &[SnapKind]) -> Vec<SnapPoint> {
        if !kinds.contains(&SnapKind::Symbol) {
            return Vec::new();
        }
        let anchor = self.position(view);
        if (cursor - anchor).hypot() <= view.registry().snap.symbol {
            vec![SnapPoint::new(anchor, self.id, 0.0, SnapKind::Symbol)]
        } else {
            Vec::new()
        }
    }

    fn handle(&self, view: &SceneView<'_>) -> Vec<AdjustmentPoint> {
        vec![AdjustmentPoint::new(
            self.id,
            0,
            self.position(view),
            PointKind::Point,
            self.point.is_bound(),
        )]
    }
}

fn icon_scale(view: &SceneView<'_>) -> f64 {
    BASE_SCALE * view.scene().symbol_scale()
}

impl MapObjectTrait for Symbol {
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
        self.point.source().into_iter().collect()
    }

    fn draw(&self, view: &SceneView<'_>, style: &DrawStyle, layers: &mut DrawLayers) {
        self.draw_icon(view, style, layers, self.entry(view.registry()), 0.0);
    }

    fn hit_test(&self, view: &SceneView<'_>, point: Point, corner: Option<Point>) -> bool {
        self.hit_sprite(view, self.entry(view.registry()), point, corner)
    }

    fn snap_points(&self, view: &SceneView<'_>, cursor: Point, kinds: &[SnapKind]) -> Vec<SnapPoint> {
        self.anchor_snap(view, cursor, kinds)
    }

    fn adjustment_points(&self, view: &SceneView<'_>, _mode: HandleMode) -> Vec<AdjustmentPoint> {
        self.handle(view)
    }

    fn set_adjustment_point(
        &mut self,
        view: &SceneView<'_>,
        _index: usize,
        point: &ConstrainedPoint,
        _options: AdjustOptions,
    ) -> Result<(), ConstraintError> {
        let owner = self.id;
        self.point.set_from(point, owner, view)
    }

    fn parametric_point(&self, view: &SceneView<'_>, _t: f64, _kind: PointKind) -> Point {
        self.position(view)
    }

    fn text_ascent(&self, view: &SceneView<'_>) -> f64 {
        Self::ascent(view, self.entry(view.registry()))
    }

    fn retain_known_sources(&mut self, known: &HashSet<ObjectId>) {
        self.point.retain_known(known);
    }
}

impl Waypoint {
    /// Create a new revealed waypoint.
    pub fn new(point: ConstrainedPoint, symbol: &str) -> Self {
        Self(Symbol::new(point, symbol))
    }

    pub fn point(&self) -> &ConstrainedPoint {
        &self.0.point
    }

    /// Waypoint kind name from the registry.
    pub fn symbol(&self) -> &str {
        &self.0.symbol
    }

    fn entry<'r>(&self, registry: &'r Registry) -> Option<&'r IconEntry> {
        registry.waypoint(&self.0.symbol)
    }

    /// Tangent of the source line at the attachment, 0 when free.
    pub fn orientation(&self, view: &SceneView<'_>) -> f64 {
        self.0
            .point
            .binding()
            .map(|b| view.parametric_orientation(b.source, b.t))
            .unwrap_or(0.0)
    }

    /// Switch to the registered reverse kind. Returns whether it changed.
    pub fn reverse_direction(&mut self, registry: &Registry) -> bool {
        match self.entry(registry).and_then(|e| e.reverse.clone()) {
            Some(reverse) => {
                self.0.symbol = reverse;
                true
            }
            None => false,
        }
    }
}

impl MapObjectTrait for Waypoint {
    fn id(&self) -> ObjectId {
        self.0.id
    }

    fn is_revealed(&self) -> bool {
        self.0.is_revealed
    }

    fn set_revealed(&mut self, revealed: bool) {
        self.0.is_revealed = revealed;
    }

    fn is_selected(&self) -> bool {
        self.0.is_selected
    }

    fn set_selected(&mut self, selected: bool) {
        self.0.is_selected = selected;
    }

    fn sources(&self) -> Vec<ObjectId> {
        self.0.sources()
    }

    fn draw(&self, view: &SceneView<'_>, style: &DrawStyle, layers: &mut DrawLayers) {
        let orientation = self.orientation(view);
        self.0
            .draw_icon(view, style, layers, self.entry(view.registry()), orientation);
    }

    fn hit_test(&self, view: &SceneView<'_>, point: Point, corner: Option<Point>) -> bool {
        self.0.hit_sprite(view, self.entry(view.registry()), point, corner)
    }

    fn snap_points(&self, view: &SceneView<'_>, cursor: Point, kinds: &[SnapKind]) -> Vec<SnapPoint> {
        self.0.anchor_snap(view, cursor, kinds)
    }

    fn adjustment_points(&self, view: &SceneView<'_>, _mode: HandleMode) -> Vec<AdjustmentPoint> {
        self.0.handle(view)
    }

    /// Only attachments to a line are accepted. Anything else leaves the
    /// waypoint untouched.
    fn set_adjustment_point(
        &mut self,
        view: &SceneView<'_>,
        _index: usize,
        point: &ConstrainedPoint,
        _options: AdjustOptions,
    ) -> Result<(), ConstraintError> {
        let owner = self.0.id;
        let Some(source) = point.source() else {
            return Err(ConstraintError::Unattached { owner });
        };
        match view.scene().get(source) {
            Some(MapObject::Line(_)) => self.0.point.set_from(point, owner, view),
            Some(_) => Err(ConstraintError::InvalidSource {
                owner,
                target: source,
            }),
            None => Err(ConstraintError::UnknownObject(source)),
        }
    }

    fn parametric_point(&self, view: &SceneView<'_>, _t: f64, _kind: PointKind) -> Point {
        self.0.position(view)
    }

    fn parametric_orientation(&self, view: &SceneView<'_>, _t: f64) -> f64 {
        self.orientation(view)
    }

    fn text_ascent(&self, view: &SceneView<'_>) -> f64 {
        Symbol::ascent(view, self.entry(view.registry()))
    }

    fn retain_known_sources(&mut self, known: &HashSet<ObjectId>) {
        self.0.point.retain_known(known);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Area, Line};
    use crate::scene::Scene;

    fn line(scene: &mut Scene, a: (f64, f64), b: (f64, f64)) -> ObjectId {
        scene.add(MapObject::Line(Line::new(
            [
                ConstrainedPoint::free(Point::new(a.0, a.1)),
                ConstrainedPoint::free(Point::new(b.0, b.1)),
            ],
            "major",
        )))
    }

    #[test]
    fn test_sprite_hit_box_follows_symbol_scale() {
        let registry = Registry::default();
        let mut scene = Scene::new();
        let id = scene.add(MapObject::Symbol(Symbol::new(
            ConstrainedPoint::free(Point::new(100.0, 100.0)),
            "major-site",
        )));
        {
            let view = SceneView::new(&scene, &registry);
            let symbol = scene.get(id).unwrap();
            // 64 px at half scale.
            assert!(symbol.hit_test(&view, Point::new(116.0, 84.0), None));
            assert!(!symbol.hit_test(&view, Point::new(117.0, 100.0), None));
            assert_eq!(symbol.text_ascent(&view), 21.0);
        }

        scene.set_symbol_scale(2.0);
        let view = SceneView::new(&scene, &registry);
        let symbol = scene.get(id).unwrap();
        assert!(symbol.hit_test(&view, Point::new(130.0, 100.0), None));
        assert!(symbol.hit_test(&view, Point::new(0.0, 0.0), Some(Point::new(70.0, 70.0))));
    }

    #[test]
    fn test_footprint_goes_to_mask_layer() {
        let registry = Registry::default();
        let mut scene = Scene::new();
        scene.add(MapObject::Symbol(Symbol::new(
            ConstrainedPoint::free(Point::ZERO),
            "major-danger",
        )));
        scene.add(MapObject::Symbol(Symbol::new(
            ConstrainedPoint::free(Point::ZERO),
            "curiosity",
        )));
        let view = SceneView::new(&scene, &registry);
        let mut layers = DrawLayers::new();
        for obj in scene.objects() {
            obj.draw(&view, &DrawStyle::default(), &mut layers);
        }
        assert_eq!(layers.symbols.len(), 2);
        assert_eq!(layers.footprints.len(), 1);
    }

    #[test]
    fn test_waypoint_only_attaches_to_lines() {
        let registry = Registry::default();
        let mut scene = Scene::new();
        let line_id = line(&mut scene, (0.0, 0.0), (0.0, 100.0));
        let area_id = scene.add(MapObject::Area(Area::rectangle(
            Point::new(50.0, 50.0),
            Point::new(60.0, 60.0),
            "dots",
        )));
        let mut waypoint = Waypoint::new(ConstrainedPoint::free(Point::new(0.0, 50.0)), "waypoint");

        let view = SceneView::new(&scene, &registry);
        let opts = AdjustOptions::default();
        let on_area = ConstrainedPoint::bound(Point::new(50.0, 50.0), area_id, 0.0);
        assert_eq!(
            waypoint.set_adjustment_point(&view, 0, &on_area, opts),
            Err(ConstraintError::InvalidSource {
                owner: waypoint.id(),
                target: area_id
            })
        );
        let free = ConstrainedPoint::free(Point::new(7.0, 7.0));
        assert!(waypoint.set_adjustment_point(&view, 0, &free, opts).is_err());
        assert!(!waypoint.point().is_bound());
        assert_eq!(waypoint.point().point(), Point::new(0.0, 50.0));

        let on_line = ConstrainedPoint::bound(Point::new(0.0, 25.0), line_id, 0.25);
        assert!(waypoint.set_adjustment_point(&view, 0, &on_line, opts).is_ok());
        assert_eq!(waypoint.point().source(), Some(line_id));
        assert_eq!(waypoint.parametric_point(&view, 0.0, PointKind::Point), Point::new(0.0, 25.0));
        assert!((waypoint.orientation(&view) - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_reverse_direction() {
        let registry = Registry::default();
        let mut waypoint = Waypoint::new(ConstrainedPoint::free(Point::ZERO), "elevation-left");
        assert!(waypoint.reverse_direction(&registry));
        assert_eq!(waypoint.symbol(), "elevation-right");
        assert!(waypoint.reverse_direction(&registry));
        assert_eq!(waypoint.symbol(), "elevation-left");

        let mut plain = Waypoint::new(ConstrainedPoint::free(Point::ZERO), "pass");
        assert!(!plain.reverse_direction(&registry));
        assert_eq!(plain.symbol(), "pass");
    }

    #[test]
    fn test_symbol_snap_radius() {
        let registry = Registry::default();
        let mut scene = Scene::new();
        let id = scene.add(MapObject::Symbol(Symbol::new(
            ConstrainedPoint::free(Point::new(0.0, 0.0)),
            "curiosity",
        )));
        let view = SceneView::new(&scene, &registry);
        let symbol = scene.get(id).unwrap();
        assert_eq!(symbol.snap_points(&view, Point::new(20.0, 0.0), &[SnapKind::Symbol]).len(), 1);
        assert!(symbol.snap_points(&view, Point::new(20.1, 0.0), &[SnapKind::Symbol]).is_empty());
        assert!(symbol.snap_points(&view, Point::ZERO, &[SnapKind::LineEnd]).is_empty());
    }
}
