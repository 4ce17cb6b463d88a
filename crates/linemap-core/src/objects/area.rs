//! Area object: a closed, pattern-filled polygon.

use super::{MapObjectTrait, ObjectId, visibility_alpha};
use crate::adjust::{AdjustOptions, AdjustmentPoint, HandleMode};
use crate::constraint::{ConstrainedPoint, PointKind};
use crate::error::ConstraintError;
use crate::geometry::{
    box_from_corners, distance_to_segment, lerp_along, polygon_contains, polygon_edges,
    polygon_intersects_box, project_onto_line,
};
use crate::render::{DrawLayers, DrawStyle, Primitive};
use crate::scene::SceneView;
use kurbo::{BezPath, Point};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Fewest vertices an area can have.
pub const MIN_AREA_VERTICES: usize = 3;
/// Distance within which a point counts as on an edge.
const EDGE_TOLERANCE: f64 = 5.0;
const OUTLINE_WIDTH: f64 = 4.0;
const HIDDEN_ALPHA: f64 = 0.2;

/// A polygon of free vertices filled with a named pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub(crate) id: ObjectId,
    pub is_revealed: bool,
    #[serde(skip)]
    pub(crate) is_selected: bool,
    points: Vec<Point>,
    /// Fill pattern name from the registry.
    pub pattern: String,
}

impl Area {
    /// Create an area from its vertices. Returns `None` for fewer than three.
    pub fn from_points(points: Vec<Point>, pattern: &str) -> Option<Self> {
        if points.len() < MIN_AREA_VERTICES {
            return None;
        }
        Some(Self {
            id: Uuid::new_v4(),
            is_revealed: true,
            is_selected: false,
            points,
            pattern: pattern.to_string(),
        })
    }

    /// Axis-aligned rectangle spanned by two corners, clockwise from `a`.
    pub fn rectangle(a: Point, b: Point, pattern: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            is_revealed: true,
            is_selected: false,
            points: vec![a, Point::new(b.x, a.y), b, Point::new(a.x, b.y)],
            pattern: pattern.to_string(),
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Edge under `point` as `(edge index, parameter along the edge)`.
    ///
    /// Edge `i` runs from vertex `i` to vertex `i + 1`, wrapping around.
    pub fn edge_hit_test(&self, point: Point) -> Option<(usize, f64)> {
        polygon_edges(&self.points)
            .enumerate()
            .find_map(|(i, (a, b))| {
                let distance = distance_to_segment(point, a, b, false)?;
                if distance >= EDGE_TOLERANCE {
                    return None;
                }
                project_onto_line(point, a, b).map(|(_, t)| (i, t))
            })
    }

    /// Remove a vertex. Refused when it would leave fewer than three.
    pub fn remove_vertex(&mut self, index: usize) -> bool {
        if index >= self.points.len() || self.points.len() <= MIN_AREA_VERTICES {
            return false;
        }
        self.points.remove(index);
        true
    }

    /// Insert a vertex on edge `index` at parameter `t`. Returns the new
    /// vertex's index.
    pub fn add_vertex(&mut self, index: usize, t: f64) -> Option<usize> {
        let n = self.points.len();
        if index >= n {
            return None;
        }
        let point = lerp_along(self.points[index], self.points[(index + 1) % n], t);
        self.points.insert(index + 1, point);
        Some(index + 1)
    }

    fn outline(&self) -> BezPath {
        let mut path = BezPath::new();
        let mut vertices = self.points.iter();
        if let Some(&first) = vertices.next() {
            path.move_to(first);
            for &p in vertices {
                path.line_to(p);
            }
            path.close_path();
        }
        path
    }
}

impl MapObjectTrait for Area {
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
        Vec::new()
    }

    fn draw(&self, view: &SceneView<'_>, style: &DrawStyle, layers: &mut DrawLayers) {
        if !style.is_visible(self.is_revealed) {
            return;
        }
        let alpha = visibility_alpha(self.is_revealed, HIDDEN_ALPHA);
        let texture = view
            .registry()
            .pattern(&self.pattern)
            .and_then(|p| p.texture.clone());
        layers.areas.push(Primitive::PatternFill {
            polygon: self.points.clone(),
            pattern: self.pattern.clone(),
            texture,
            alpha,
        });
        layers.areas.push(Primitive::Stroke {
            path: self.outline(),
            width: OUTLINE_WIDTH,
            color: style.current_color(self.is_selected),
            alpha,
        });
    }

    fn hit_test(&self, _view: &SceneView<'_>, point: Point, corner: Option<Point>) -> bool {
        match corner {
            Some(corner) => polygon_intersects_box(&self.points, box_from_corners(point, corner)),
            None => polygon_contains(&self.points, point),
        }
    }

    fn adjustment_points(&self, _view: &SceneView<'_>, _mode: HandleMode) -> Vec<AdjustmentPoint> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, &p)| AdjustmentPoint::new(self.id, i, p, PointKind::Line, false))
            .collect()
    }

    /// Vertices are always free: a bound request stores its resolved position.
    fn set_adjustment_point(
        &mut self,
        view: &SceneView<'_>,
        index: usize,
        point: &ConstrainedPoint,
        _options: AdjustOptions,
    ) -> Result<(), ConstraintError> {
        if let Some(slot) = self.points.get_mut(index) {
            *slot = view.resolve(point, PointKind::Line);
        }
        Ok(())
    }

    fn parametric_point(&self, _view: &SceneView<'_>, _t: f64, _kind: PointKind) -> Point {
        self.points.first().copied().unwrap_or(Point::ZERO)
    }

    fn retain_known_sources(&mut self, _known: &HashSet<ObjectId>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Area {
        Area::rectangle(Point::new(0.0, 0.0), Point::new(10.0, 10.0), "dots")
    }

    #[test]
    fn test_rectangle_vertices() {
        let area = square();
        assert_eq!(
            area.points(),
            &[
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
            ]
        );
        assert!(Area::from_points(vec![Point::ZERO, Point::new(1.0, 0.0)], "dots").is_none());
    }

    #[test]
    fn test_edge_hit_and_insert() {
        let mut area = square();
        let (edge, t) = area.edge_hit_test(Point::new(5.0, 0.0)).unwrap();
        assert_eq!(edge, 0);
        assert!((t - 0.5).abs() < f64::EPSILON);

        assert_eq!(area.add_vertex(edge, t), Some(1));
        assert_eq!(area.points().len(), 5);
        assert_eq!(area.points()[1], Point::new(5.0, 0.0));

        // Closing edge from the last vertex back to the first.
        let (edge, _) = area.edge_hit_test(Point::new(0.0, 5.0)).unwrap();
        assert_eq!(edge, 4);
        assert!(area.edge_hit_test(Point::new(5.0, 5.0)).is_none());
    }

    #[test]
    fn test_never_below_three_vertices() {
        let mut area = square();
        assert!(area.remove_vertex(0));
        for _ in 0..5 {
            assert!(!area.remove_vertex(0));
        }
        assert_eq!(area.points().len(), MIN_AREA_VERTICES);
        assert!(!area.remove_vertex(7));
    }

    #[test]
    fn test_containment() {
        let area = square();
        let registry = crate::registry::Registry::default();
        let scene = crate::scene::Scene::new();
        let view = SceneView::new(&scene, &registry);
        assert!(area.hit_test(&view, Point::new(5.0, 5.0), None));
        assert!(!area.hit_test(&view, Point::new(15.0, 5.0), None));
        assert!(area.hit_test(&view, Point::new(8.0, 8.0), Some(Point::new(20.0, 20.0))));
        assert!(area.hit_test(&view, Point::new(-5.0, -5.0), Some(Point::new(20.0, 20.0))));
        assert!(!area.hit_test(&view, Point::new(11.0, 11.0), Some(Point::new(20.0, 20.0))));
    }
}
