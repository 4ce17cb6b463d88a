//! Adjustment points: the editable coordinate slots tools drag around.

use crate::constraint::PointKind;
use crate::geometry::compare_distance;
use crate::objects::ObjectId;
use kurbo::Point;

/// Radius of an adjustment handle in pixels.
pub const HANDLE_RADIUS: f64 = 10.0;

/// Which text handles an object exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandleMode {
    /// Anchor and offset handles are separate slots.
    #[default]
    Separate,
    /// A single handle standing for whichever slot is meaningful.
    Combined,
}

/// Flags for a single adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdjustOptions {
    /// The gesture is being committed rather than previewed.
    pub is_final: bool,
    /// Linked adjustment is enabled.
    pub linked: bool,
}

/// One editable coordinate slot of an object.
#[derive(Debug, Clone, Copy)]
pub struct AdjustmentPoint {
    pub object: ObjectId,
    /// Slot index within the object.
    pub index: usize,
    /// Position when the point was collected.
    pub original: Point,
    /// Position after the latest accepted move.
    pub current: Point,
    pub kind: PointKind,
    pub is_constrained: bool,
}

impl AdjustmentPoint {
    pub fn new(
        object: ObjectId,
        index: usize,
        original: Point,
        kind: PointKind,
        is_constrained: bool,
    ) -> Self {
        Self {
            object,
            index,
            original,
            current: original,
            kind,
            is_constrained,
        }
    }

    /// Whether the handle covers `point`.
    pub fn covers(&self, point: Point) -> bool {
        compare_distance(self.original, point, HANDLE_RADIUS) <= 0.0
    }
}

/// Same object, same slot and exactly the same original coordinate.
impl PartialEq for AdjustmentPoint {
    fn eq(&self, other: &Self) -> bool {
        self.object == other.object && self.index == other.index && self.original == other.original
    }
}

/// Group points by exact original coordinate, keeping first-seen order.
pub fn group_by_coordinate(points: &[AdjustmentPoint]) -> Vec<Vec<AdjustmentPoint>> {
    let mut groups: Vec<Vec<AdjustmentPoint>> = Vec::new();
    for pt in points {
        match groups.iter_mut().find(|g| g[0].original == pt.original) {
            Some(group) => group.push(*pt),
            None => groups.push(vec![*pt]),
        }
    }
    groups
}

/// The points that actually receive a move.
///
/// Linked: the unconstrained members of each coincident group; bound members
/// follow their source. Unlinked: only the first constrained member, which
/// gets detached by the move. A group without candidates moves as a whole.
pub fn affected_points(points: &[AdjustmentPoint], linked: bool) -> Vec<AdjustmentPoint> {
    group_by_coordinate(points)
        .into_iter()
        .flat_map(|group| {
            let candidates: Vec<AdjustmentPoint> = if linked {
                group.iter().filter(|pt| !pt.is_constrained).copied().collect()
            } else {
                group.iter().filter(|pt| pt.is_constrained).take(1).copied().collect()
            };
            if candidates.is_empty() { group } else { candidates }
        })
        .collect()
}

/// Append the points of `extra` not already in `selection`.
pub fn extend_unique(selection: &mut Vec<AdjustmentPoint>, extra: &[AdjustmentPoint]) {
    for pt in extra {
        if !selection.contains(pt) {
            selection.push(*pt);
        }
    }
}
