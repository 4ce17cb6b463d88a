//! Constrained points: free coordinates or parametric bindings to another object.

use crate::error::ConstraintError;
use crate::objects::ObjectId;
use crate::scene::SceneView;
use crate::snap::SnapPoint;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How a bound point is evaluated on its source.
///
/// Line endpoints follow a wavy source along its rendered contour; every other
/// point uses the straight chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointKind {
    Point,
    Line,
}

/// A parametric attachment to another object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Binding {
    pub source: ObjectId,
    /// Position along the source, 0..=1.
    pub t: f64,
}

/// A point that is either free or bound to a position on another object.
///
/// The explicit coordinate is always kept, so a binding that can no longer be
/// resolved degrades to the last known position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConstrainedPointData", into = "ConstrainedPointData")]
pub struct ConstrainedPoint {
    point: Point,
    binding: Option<Binding>,
}

/// Persisted form: `{ point, sourceId?, sourceT? }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConstrainedPointData {
    point: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source_t: Option<f64>,
}

impl From<ConstrainedPointData> for ConstrainedPoint {
    fn from(data: ConstrainedPointData) -> Self {
        let binding = match (data.source_id, data.source_t) {
            (Some(source), Some(t)) => Some(Binding { source, t }),
            (Some(source), None) => Some(Binding { source, t: 0.0 }),
            _ => None,
        };
        Self {
            point: data.point,
            binding,
        }
    }
}

impl From<ConstrainedPoint> for ConstrainedPointData {
    fn from(cp: ConstrainedPoint) -> Self {
        Self {
            point: cp.point,
            source_id: cp.binding.map(|b| b.source),
            source_t: cp.binding.map(|b| b.t),
        }
    }
}

impl ConstrainedPoint {
    /// A free point.
    pub fn free(point: Point) -> Self {
        Self {
            point,
            binding: None,
        }
    }

    /// A point bound to `source` at parameter `t`, remembering `point` as fallback.
    pub fn bound(point: Point, source: ObjectId, t: f64) -> Self {
        Self {
            point,
            binding: Some(Binding { source, t }),
        }
    }

    /// Bound to the snap target if there is one, free otherwise.
    pub fn from_snap(point: Point, snap: Option<&SnapPoint>) -> Self {
        match snap {
            Some(snap) => Self::bound(point, snap.object, snap.t),
            None => Self::free(point),
        }
    }

    /// The explicit coordinate. For bound points this is only the fallback;
    /// use [`SceneView::resolve`] for the live position.
    pub fn point(&self) -> Point {
        self.point
    }

    pub fn binding(&self) -> Option<Binding> {
        self.binding
    }

    pub fn source(&self) -> Option<ObjectId> {
        self.binding.map(|b| b.source)
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Copy `other` into this point on behalf of `owner`.
    ///
    /// The coordinate is always taken over. The binding is only taken over when
    /// the source does not already depend on `owner`; otherwise the point
    /// becomes free and a [`ConstraintError::Cycle`] is returned.
    pub fn set_from(
        &mut self,
        other: &ConstrainedPoint,
        owner: ObjectId,
        view: &SceneView<'_>,
    ) -> Result<(), ConstraintError> {
        self.point = other.point;
        self.binding = None;

        let Some(binding) = other.binding else {
            return Ok(());
        };
        if !view.scene().contains(binding.source) {
            return Err(ConstraintError::UnknownObject(binding.source));
        }
        if binding.source == owner || view.has_constraint_to(binding.source, owner) {
            return Err(ConstraintError::Cycle {
                owner,
                target: binding.source,
            });
        }
        self.binding = Some(binding);
        Ok(())
    }

    /// Drop the binding, keeping the fallback coordinate.
    pub(crate) fn release(&mut self) {
        self.binding = None;
    }

    /// Free this point if its source is not among `known`.
    pub(crate) fn retain_known(&mut self, known: &HashSet<ObjectId>) {
        if let Some(source) = self.source() {
            if !known.contains(&source) {
                log::warn!("Releasing binding to {}", source);
                self.release();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_free_point_serializes_without_source() {
        let cp = ConstrainedPoint::free(Point::new(1.0, 2.0));
        let json = serde_json::to_value(&cp).unwrap();
        assert_eq!(json["point"]["x"], 1.0);
        assert!(json.get("sourceId").is_none());
        assert!(json.get("sourceT").is_none());
    }

    #[test]
    fn test_bound_point_keeps_fallback_coordinate() {
        let source = Uuid::new_v4();
        let cp = ConstrainedPoint::bound(Point::new(3.0, 4.0), source, 0.5);
        let json = serde_json::to_string(&cp).unwrap();
        let parsed: ConstrainedPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cp);
        assert_eq!(parsed.point(), Point::new(3.0, 4.0));
        assert_eq!(parsed.source(), Some(source));
    }

    #[test]
    fn test_retain_known_drops_dangling_binding() {
        let mut cp = ConstrainedPoint::bound(Point::new(3.0, 4.0), Uuid::new_v4(), 1.0);
        cp.retain_known(&HashSet::new());
        assert!(!cp.is_bound());
        assert_eq!(cp.point(), Point::new(3.0, 4.0));
    }
}
