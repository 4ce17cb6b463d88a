//! Adjust tool: per-vertex editing with snapping.

use super::{PREVIEW_THRESHOLD, Tool, ToolContext, ToolKind};
use crate::adjust::{AdjustmentPoint, HANDLE_RADIUS, HandleMode, affected_points, extend_unique};
use crate::constraint::ConstrainedPoint;
use crate::geometry::{box_contains, box_from_corners};
use crate::input::Interaction;
use crate::objects::ObjectId;
use crate::render::{HANDLE_COLOR, INDICATOR_COLOR, Primitive, RenderQuality, SELECTION_COLOR};
use crate::scene::SceneView;
use crate::snap::{SnapKind, SnapPoint};
use kurbo::{Point, Vec2};

const SNAP_KINDS: [SnapKind; 3] = [SnapKind::Line, SnapKind::LineEnd, SnapKind::Symbol];
const SELECTED_HANDLE_WIDTH: f64 = 4.0;
const HANDLE_WIDTH: f64 = 2.0;
const MARQUEE_WIDTH: f64 = 2.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
enum DragOperation {
    #[default]
    None,
    Marquee,
    Move,
}

/// Edits individual adjustment points of any object.
#[derive(Debug, Default)]
pub struct AdjustTool {
    /// Every handle in the scene.
    points: Vec<AdjustmentPoint>,
    selected: Vec<AdjustmentPoint>,
    drag: DragOperation,
    /// Press position relative to the grabbed handle.
    point_offset: Vec2,
    marquee: Option<(Point, Point)>,
    snap: Option<SnapPoint>,
}

impl AdjustTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Points currently selected for editing.
    pub fn selected_points(&self) -> &[AdjustmentPoint] {
        &self.selected
    }

    /// Recollect handles. With `preserve`, selected handles that still
    /// exist (same object and slot) stay selected at their new position.
    fn update_points(&mut self, view: &SceneView<'_>, preserve: bool) {
        self.points = view
            .scene()
            .objects()
            .flat_map(|obj| obj.adjustment_points(view, HandleMode::Separate))
            .collect();
        self.selected = if preserve {
            self.points
                .iter()
                .filter(|pt| {
                    self.selected
                        .iter()
                        .any(|sel| sel.object == pt.object && sel.index == pt.index)
                })
                .copied()
                .collect()
        } else {
            Vec::new()
        };
    }

    fn covered(&self, point: Point) -> Vec<AdjustmentPoint> {
        self.points.iter().filter(|pt| pt.covers(point)).copied().collect()
    }

    fn find_snap(&self, ctx: &ToolContext<'_>, cursor: Point) -> Option<SnapPoint> {
        let mut exclude: Vec<ObjectId> = self.selected.iter().map(|pt| pt.object).collect();
        exclude.dedup();
        ctx.snap(cursor, &SNAP_KINDS, &exclude)
    }

    /// Move the affected handles so the grabbed one lands on `target`.
    fn move_selected(&mut self, ctx: &mut ToolContext<'_>, interaction: &Interaction, target: Point, is_final: bool) {
        let d = target - interaction.origin + self.point_offset;
        let affected = affected_points(&self.selected, ctx.settings.adjust_linked);
        for pt in affected {
            let moved = pt.original + d;
            let snap = self.snap.filter(|snap| snap.point == moved);
            let request = ConstrainedPoint::from_snap(moved, snap.as_ref());
            if ctx.adjust(pt.object, pt.index, &request, is_final) {
                if let Some(sel) = self.selected.iter_mut().find(|sel| **sel == pt) {
                    sel.current = moved;
                }
            }
        }
    }
}

impl Tool for AdjustTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Adjust
    }

    fn activate(&mut self, ctx: &mut ToolContext<'_>) {
        ctx.select(&[]);
        self.update_points(&ctx.view(), false);
    }

    fn deactivate(&mut self, _ctx: &mut ToolContext<'_>) {
        self.points.clear();
        self.selected.clear();
        self.drag = DragOperation::None;
        self.marquee = None;
        self.snap = None;
    }

    fn state_invalidated(&mut self, ctx: &mut ToolContext<'_>) {
        self.update_points(&ctx.view(), true);
    }

    fn on_pointer_out(&mut self, _ctx: &mut ToolContext<'_>) {
        self.drag = DragOperation::None;
        self.marquee = None;
        self.snap = None;
    }

    fn on_click(&mut self, ctx: &mut ToolContext<'_>, interaction: &Interaction) {
        let covered = self.covered(interaction.origin);
        if interaction.modifiers.shift {
            extend_unique(&mut self.selected, &covered);
        } else {
            self.selected = covered;
        }
        ctx.redraw(RenderQuality::Full);
    }

    fn on_drag_start(&mut self, _ctx: &mut ToolContext<'_>, interaction: &Interaction) {
        let covered = self.covered(interaction.origin);
        let grabbed = covered.first().map(|pt| pt.original);
        self.point_offset = grabbed.map_or(Vec2::ZERO, |p| interaction.origin - p);

        let covered_equal = grabbed.is_some_and(|p| covered.iter().all(|pt| pt.original == p));
        let mut selected_matching = grabbed.is_some_and(|p| self.selected.iter().any(|pt| pt.original == p));
        if !selected_matching && !covered.is_empty() {
            self.selected = covered;
            selected_matching = true;
        }

        self.drag = if grabbed.is_some() && covered_equal && selected_matching {
            DragOperation::Move
        } else {
            DragOperation::Marquee
        };
    }

    fn on_drag_move(&mut self, ctx: &mut ToolContext<'_>, interaction: &Interaction) {
        match self.drag {
            DragOperation::None => {}
            DragOperation::Marquee => {
                let d = interaction.destination - interaction.origin;
                self.marquee = (d.hypot() > PREVIEW_THRESHOLD).then_some((interaction.origin, interaction.destination));
            }
            DragOperation::Move => {
                self.snap = self.find_snap(ctx, interaction.destination);
                let target = self.snap.map_or(interaction.destination, |s| s.point);
                self.move_selected(ctx, interaction, target, false);
                ctx.redraw(RenderQuality::Fast);
            }
        }
    }

    fn on_drop(&mut self, ctx: &mut ToolContext<'_>, interaction: &Interaction) {
        match std::mem::take(&mut self.drag) {
            DragOperation::None => {}
            DragOperation::Marquee => {
                self.marquee = None;
                let area = box_from_corners(interaction.origin, interaction.destination);
                let contained: Vec<AdjustmentPoint> = self
                    .points
                    .iter()
                    .filter(|pt| box_contains(area, pt.original))
                    .copied()
                    .collect();
                if interaction.modifiers.shift {
                    extend_unique(&mut self.selected, &contained);
                } else {
                    self.selected = contained;
                }
                ctx.redraw(RenderQuality::Full);
            }
            DragOperation::Move => {
                self.snap = self.find_snap(ctx, interaction.destination);
                let target = self.snap.map_or(interaction.destination, |s| s.point);
                self.move_selected(ctx, interaction, target, true);
                self.snap = None;
                self.update_points(&ctx.view(), true);
                ctx.register_history();
                ctx.redraw(RenderQuality::Full);
            }
        }
    }

    fn overlay(&self, _view: &SceneView<'_>) -> Vec<Primitive> {
        let mut overlay = Vec::new();
        if self.drag != DragOperation::Move {
            overlay.extend(
                self.points
                    .iter()
                    .filter(|pt| !self.selected.contains(pt))
                    .map(|pt| Primitive::circle(pt.original, HANDLE_RADIUS, HANDLE_WIDTH, HANDLE_COLOR)),
            );
        }
        overlay.extend(
            self.selected
                .iter()
                .map(|pt| Primitive::circle(pt.current, HANDLE_RADIUS, SELECTED_HANDLE_WIDTH, SELECTION_COLOR)),
        );
        if let Some((a, b)) = self.marquee {
            overlay.push(Primitive::rect(a, b, MARQUEE_WIDTH, INDICATOR_COLOR));
        }
        if let Some(snap) = self.snap {
            overlay.push(Primitive::snap_cross(snap.point));
        }
        overlay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Line, MapObject, Symbol, Waypoint};
    use crate::tools::test_support::{Harness, interaction, shifted};

    fn line(h: &mut Harness, a: (f64, f64), b: (f64, f64)) -> ObjectId {
        h.scene.add(MapObject::Line(Line::new(
            [
                ConstrainedPoint::free(Point::new(a.0, a.1)),
                ConstrainedPoint::free(Point::new(b.0, b.1)),
            ],
            "major",
        )))
    }

    fn points_of(h: &Harness, id: ObjectId) -> [ConstrainedPoint; 2] {
        h.scene.get(id).unwrap().as_line().unwrap().points.clone()
    }

    fn activated(h: &mut Harness) -> AdjustTool {
        let mut tool = AdjustTool::new();
        h.with(|ctx| tool.activate(ctx));
        tool
    }

    fn drag(h: &mut Harness, tool: &mut AdjustTool, from: (f64, f64), to: (f64, f64)) {
        let i = interaction(from, to);
        h.with(|ctx| tool.on_drag_start(ctx, &i));
        h.with(|ctx| tool.on_drag_move(ctx, &i));
        h.with(|ctx| tool.on_drop(ctx, &i));
    }

    #[test]
    fn test_linked_drag_moves_shared_endpoint() {
        let mut h = Harness::new();
        let a = line(&mut h, (0.0, 0.0), (10.0, 10.0));
        let b = line(&mut h, (10.0, 10.0), (40.0, -20.0));
        let mut tool = activated(&mut h);

        drag(&mut h, &mut tool, (10.0, 10.0), (15.0, 15.0));
        assert!(h.effects.history);

        assert_eq!(points_of(&h, a)[1].point(), Point::new(15.0, 15.0));
        assert_eq!(points_of(&h, b)[0].point(), Point::new(15.0, 15.0));
        assert_eq!(points_of(&h, a)[0].point(), Point::new(0.0, 0.0));
        // Both handles stay selected at their new position.
        assert_eq!(tool.selected_points().len(), 2);
        assert!(tool.selected_points().iter().all(|pt| pt.original == Point::new(15.0, 15.0)));
    }

    #[test]
    fn test_grabbed_handle_lands_on_cursor() {
        let mut h = Harness::new();
        let a = line(&mut h, (0.0, 0.0), (100.0, 0.0));
        let mut tool = activated(&mut h);

        // Grabbed 3 units to the right of the handle.
        drag(&mut h, &mut tool, (103.0, 0.0), (103.0, 50.0));
        assert_eq!(points_of(&h, a)[1].point(), Point::new(103.0, 50.0));
    }

    #[test]
    fn test_unlinked_drag_detaches_constrained_member() {
        let mut h = Harness::new();
        h.settings.adjust_linked = false;
        let a = line(&mut h, (0.0, 0.0), (100.0, 0.0));
        let b = h.scene.add(MapObject::Line(Line::new(
            [
                ConstrainedPoint::bound(Point::new(100.0, 0.0), a, 1.0),
                ConstrainedPoint::free(Point::new(100.0, 100.0)),
            ],
            "minor",
        )));
        let mut tool = activated(&mut h);

        drag(&mut h, &mut tool, (100.0, 0.0), (130.0, 0.0));

        let moved = &points_of(&h, b)[0];
        assert!(!moved.is_bound());
        assert_eq!(moved.point(), Point::new(130.0, 0.0));
        assert_eq!(points_of(&h, a)[1].point(), Point::new(100.0, 0.0));
    }

    #[test]
    fn test_linked_drag_leaves_bound_member_following() {
        let mut h = Harness::new();
        let a = line(&mut h, (0.0, 0.0), (100.0, 0.0));
        let b = h.scene.add(MapObject::Line(Line::new(
            [
                ConstrainedPoint::bound(Point::new(100.0, 0.0), a, 1.0),
                ConstrainedPoint::free(Point::new(100.0, 100.0)),
            ],
            "minor",
        )));
        let mut tool = activated(&mut h);

        drag(&mut h, &mut tool, (100.0, 0.0), (130.0, 0.0));

        let view = h.view();
        let follower = &points_of(&h, b)[0];
        assert!(follower.is_bound());
        assert_eq!(view.resolve(follower, crate::constraint::PointKind::Line), Point::new(130.0, 0.0));
    }

    #[test]
    fn test_drop_on_snap_binds_point() {
        let mut h = Harness::new();
        let a = line(&mut h, (0.0, 0.0), (100.0, 0.0));
        let b = line(&mut h, (200.0, 0.0), (200.0, 100.0));
        let mut tool = activated(&mut h);

        drag(&mut h, &mut tool, (200.0, 0.0), (104.0, 3.0));

        let start = &points_of(&h, b)[0];
        assert_eq!(start.source(), Some(a));
        assert_eq!(start.binding().unwrap().t, 1.0);
        assert_eq!(start.point(), Point::new(100.0, 0.0));
    }

    #[test]
    fn test_waypoint_refuses_free_drop() {
        let mut h = Harness::new();
        let a = line(&mut h, (0.0, 0.0), (100.0, 0.0));
        let w = h.scene.add(MapObject::Waypoint(Waypoint::new(
            ConstrainedPoint::bound(Point::new(50.0, 0.0), a, 0.5),
            "waypoint",
        )));
        let mut tool = activated(&mut h);

        drag(&mut h, &mut tool, (50.0, 0.0), (50.0, 300.0));

        let MapObject::Waypoint(waypoint) = h.scene.get(w).unwrap() else {
            panic!("expected waypoint");
        };
        assert_eq!(waypoint.point().source(), Some(a));
    }

    #[test]
    fn test_click_and_marquee_selection() {
        let mut h = Harness::new();
        line(&mut h, (0.0, 0.0), (100.0, 0.0));
        h.scene.add(MapObject::Symbol(Symbol::new(
            ConstrainedPoint::free(Point::new(50.0, 50.0)),
            "major-settlement",
        )));
        let mut tool = activated(&mut h);
        assert_eq!(tool.overlay(&h.view()).len(), 3);

        h.with(|ctx| tool.on_click(ctx, &interaction((2.0, 1.0), (2.0, 1.0))));
        assert_eq!(tool.selected_points().len(), 1);
        h.with(|ctx| tool.on_click(ctx, &shifted(interaction((99.0, 0.0), (99.0, 0.0)))));
        assert_eq!(tool.selected_points().len(), 2);

        // Marquee from empty space replaces the selection.
        let i = interaction((-10.0, 20.0), (60.0, 60.0));
        h.with(|ctx| tool.on_drag_start(ctx, &i));
        h.with(|ctx| tool.on_drag_move(ctx, &i));
        assert!(tool.overlay(&h.view()).len() > 3);
        h.with(|ctx| tool.on_drop(ctx, &i));
        assert_eq!(tool.selected_points().len(), 1);
        assert_eq!(tool.selected_points()[0].original, Point::new(50.0, 50.0));
        assert!(!h.effects.history);
    }

    #[test]
    fn test_activate_clears_object_selection() {
        let mut h = Harness::new();
        let a = line(&mut h, (0.0, 0.0), (100.0, 0.0));
        h.scene.set_selection(&[a]);
        let tool = activated(&mut h);
        assert!(h.scene.selection().is_empty());
        assert!(tool.selected_points().is_empty());
    }
}
