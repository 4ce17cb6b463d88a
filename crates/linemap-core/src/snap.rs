//! Snap resolution against scene objects.

use crate::objects::ObjectId;
use crate::scene::SceneView;
use kurbo::Point;

/// Kind of attachment target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapKind {
    /// Projection onto a line's straight chord.
    Line,
    /// Projection onto a line's rendered contour (wavy lines follow the curve).
    LineContour,
    /// A line endpoint.
    LineEnd,
    /// A symbol or waypoint anchor.
    Symbol,
}

/// A candidate attachment target near the cursor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapPoint {
    /// Where the snapped point would land.
    pub point: Point,
    /// The object offering the target.
    pub object: ObjectId,
    /// Parameter along `object`.
    pub t: f64,
    pub kind: SnapKind,
}

impl SnapPoint {
    pub fn new(point: Point, object: ObjectId, t: f64, kind: SnapKind) -> Self {
        Self {
            point,
            object,
            t,
            kind,
        }
    }
}

/// Every snap candidate of the allowed kinds, in draw order.
pub fn snap_candidates(
    view: &SceneView<'_>,
    cursor: Point,
    kinds: &[SnapKind],
    exclude: &[ObjectId],
) -> Vec<SnapPoint> {
    view.scene()
        .objects()
        .filter(|obj| !exclude.contains(&obj.id()))
        .flat_map(|obj| obj.snap_points(view, cursor, kinds))
        .collect()
}

/// Best snap target for `cursor`.
///
/// Symbol anchors dominate: when any is in range, all other candidates are
/// discarded before distances are compared. Among the survivors the nearest
/// wins and ties keep the first candidate found.
pub fn find_snap(
    view: &SceneView<'_>,
    cursor: Point,
    kinds: &[SnapKind],
    exclude: &[ObjectId],
) -> Option<SnapPoint> {
    let mut candidates = snap_candidates(view, cursor, kinds, exclude);
    if candidates.iter().any(|s| s.kind == SnapKind::Symbol) {
        candidates.retain(|s| s.kind == SnapKind::Symbol);
    }

    candidates.into_iter().fold(None, |best: Option<SnapPoint>, snap| match best {
        Some(cur) if (cur.point - cursor).hypot() <= (snap.point - cursor).hypot() => Some(cur),
        _ => Some(snap),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::ConstrainedPoint;
    use crate::objects::{Line, MapObject, Symbol};
    use crate::registry::Registry;
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
    fn test_symbol_dominates_nearer_line() {
        let registry = Registry::default();
        let mut scene = Scene::new();
        let line_id = line(&mut scene, (0.0, 0.0), (100.0, 0.0));
        let symbol_id = scene.add(MapObject::Symbol(Symbol::new(
            ConstrainedPoint::free(Point::new(50.0, 15.0)),
            "curiosity",
        )));

        let view = SceneView::new(&scene, &registry);
        let cursor = Point::new(50.0, 1.0);
        let all = [SnapKind::Line, SnapKind::Symbol];
        let snap = find_snap(&view, cursor, &all, &[]).unwrap();
        assert_eq!(snap.kind, SnapKind::Symbol);
        assert_eq!(snap.object, symbol_id);

        let snap = find_snap(&view, cursor, &[SnapKind::Line], &[]).unwrap();
        assert_eq!(snap.object, line_id);
        assert_eq!(snap.point, Point::new(50.0, 0.0));
    }

    #[test]
    fn test_nearest_wins_and_ties_keep_first() {
        let registry = Registry::default();
        let mut scene = Scene::new();
        let first = line(&mut scene, (0.0, 0.0), (10.0, 0.0));
        let _second = line(&mut scene, (10.0, 0.0), (20.0, 0.0));
        let third = line(&mut scene, (30.0, 0.0), (40.0, 0.0));

        let view = SceneView::new(&scene, &registry);
        let snap = find_snap(&view, Point::new(10.0, 1.0), &[SnapKind::LineEnd], &[]).unwrap();
        assert_eq!(snap.object, first);
        assert_eq!(snap.t, 1.0);

        let snap = find_snap(&view, Point::new(29.0, 0.0), &[SnapKind::LineEnd], &[]).unwrap();
        assert_eq!(snap.object, third);
    }

    #[test]
    fn test_excluded_objects_do_not_snap() {
        let registry = Registry::default();
        let mut scene = Scene::new();
        let id = line(&mut scene, (0.0, 0.0), (10.0, 0.0));
        let view = SceneView::new(&scene, &registry);
        assert!(find_snap(&view, Point::new(0.0, 0.0), &[SnapKind::LineEnd], &[id]).is_none());
    }

    #[test]
    fn test_no_candidates_is_no_snap() {
        let registry = Registry::default();
        let scene = Scene::new();
        let view = SceneView::new(&scene, &registry);
        assert!(find_snap(&view, Point::ZERO, &[SnapKind::Line], &[]).is_none());
    }
}
