//! Draw-icon tools: place symbols and waypoints with a click.

use super::{Tool, ToolContext, ToolKind};
use crate::constraint::ConstrainedPoint;
use crate::input::Interaction;
use crate::objects::{MapObject, Symbol, Waypoint};
use crate::render::Primitive;
use crate::scene::SceneView;
use crate::snap::{SnapKind, SnapPoint};
use kurbo::Point;

/// Which kind of icon a tool places.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconFamily {
    /// Free-standing symbols, snapping to line ends.
    Symbol,
    /// Waypoints, snapping anywhere along a line.
    Waypoint,
}

impl IconFamily {
    fn snap_kinds(self) -> &'static [SnapKind] {
        match self {
            IconFamily::Symbol => &[SnapKind::LineEnd],
            IconFamily::Waypoint => &[SnapKind::Line],
        }
    }

    fn create(self, point: ConstrainedPoint, name: &str) -> MapObject {
        match self {
            IconFamily::Symbol => MapObject::Symbol(Symbol::new(point, name)),
            IconFamily::Waypoint => MapObject::Waypoint(Waypoint::new(point, name)),
        }
    }
}

/// Places one icon per click using the active icon kind.
#[derive(Debug)]
pub struct DrawIconTool {
    family: IconFamily,
    active_symbol: String,
    snap: Option<SnapPoint>,
}

impl DrawIconTool {
    pub fn new(family: IconFamily, symbol: &str) -> Self {
        Self {
            family,
            active_symbol: symbol.to_string(),
            snap: None,
        }
    }

    pub fn family(&self) -> IconFamily {
        self.family
    }

    pub fn active_symbol(&self) -> &str {
        &self.active_symbol
    }

    pub fn set_active_symbol(&mut self, symbol: &str) {
        self.active_symbol = symbol.to_string();
    }
}

impl Tool for DrawIconTool {
    fn kind(&self) -> ToolKind {
        match self.family {
            IconFamily::Symbol => ToolKind::DrawSymbol,
            IconFamily::Waypoint => ToolKind::DrawWaypoint,
        }
    }

    fn activate(&mut self, ctx: &mut ToolContext<'_>) {
        ctx.select(&[]);
    }

    fn deactivate(&mut self, _ctx: &mut ToolContext<'_>) {
        self.snap = None;
    }

    fn on_hover(&mut self, ctx: &mut ToolContext<'_>, point: Point) {
        self.snap = ctx.snap(point, self.family.snap_kinds(), &[]);
    }

    fn on_pointer_out(&mut self, _ctx: &mut ToolContext<'_>) {
        self.snap = None;
    }

    fn on_click(&mut self, ctx: &mut ToolContext<'_>, interaction: &Interaction) {
        self.snap = ctx.snap(interaction.destination, self.family.snap_kinds(), &[]);
        let point = self.snap.map_or(interaction.destination, |s| s.point);
        let object = self
            .family
            .create(ConstrainedPoint::from_snap(point, self.snap.as_ref()), &self.active_symbol);
        ctx.add_object(object);
        self.snap = None;
    }

    fn overlay(&self, _view: &SceneView<'_>) -> Vec<Primitive> {
        self.snap.map(|s| Primitive::snap_cross(s.point)).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Line, ObjectId};
    use crate::tools::test_support::{Harness, interaction};

    fn line(h: &mut Harness, a: (f64, f64), b: (f64, f64)) -> ObjectId {
        h.scene.add(MapObject::Line(Line::new(
            [
                ConstrainedPoint::free(Point::new(a.0, a.1)),
                ConstrainedPoint::free(Point::new(b.0, b.1)),
            ],
            "major",
        )))
    }

    fn click(h: &mut Harness, tool: &mut DrawIconTool, at: (f64, f64)) -> MapObject {
        h.with(|ctx| tool.on_click(ctx, &interaction(at, at)));
        h.scene.objects().last().cloned().unwrap()
    }

    #[test]
    fn test_symbol_snaps_to_line_end() {
        let mut h = Harness::new();
        let l = line(&mut h, (0.0, 0.0), (100.0, 0.0));
        let mut tool = DrawIconTool::new(IconFamily::Symbol, "major-site");

        let MapObject::Symbol(symbol) = click(&mut h, &mut tool, (95.0, 5.0)) else {
            panic!("expected symbol");
        };
        assert!(h.effects.history);
        assert_eq!(symbol.symbol, "major-site");
        assert_eq!(symbol.point.source(), Some(l));
        assert_eq!(symbol.point.binding().unwrap().t, 1.0);
        assert_eq!(symbol.point.point(), Point::new(100.0, 0.0));
        assert!(h.scene.has_constraint_to(symbol.id, l));
        assert!(!h.scene.has_constraint_to(l, symbol.id));

        // Mid-line is not a symbol target.
        let MapObject::Symbol(free) = click(&mut h, &mut tool, (50.0, 2.0)) else {
            panic!("expected symbol");
        };
        assert!(!free.point.is_bound());
        assert_eq!(free.point.point(), Point::new(50.0, 2.0));
    }

    #[test]
    fn test_waypoint_snaps_along_line() {
        let mut h = Harness::new();
        let l = line(&mut h, (0.0, 0.0), (100.0, 0.0));
        let mut tool = DrawIconTool::new(IconFamily::Waypoint, "pass");
        assert_eq!(tool.kind(), ToolKind::DrawWaypoint);

        let MapObject::Waypoint(waypoint) = click(&mut h, &mut tool, (25.0, 3.0)) else {
            panic!("expected waypoint");
        };
        assert_eq!(waypoint.symbol(), "pass");
        assert_eq!(waypoint.point().source(), Some(l));
        assert!((waypoint.point().binding().unwrap().t - 0.25).abs() < 1e-9);
        assert_eq!(waypoint.point().point(), Point::new(25.0, 0.0));
    }

    #[test]
    fn test_new_icons_follow_reveal_setting() {
        let mut h = Harness::new();
        h.settings.reveal_new_objects = false;
        let mut tool = DrawIconTool::new(IconFamily::Symbol, "curiosity");
        let symbol = click(&mut h, &mut tool, (10.0, 10.0));
        assert!(!symbol.is_revealed());
    }

    #[test]
    fn test_hover_snap_overlay() {
        let mut h = Harness::new();
        line(&mut h, (0.0, 0.0), (100.0, 0.0));
        let mut tool = DrawIconTool::new(IconFamily::Symbol, "curiosity");
        h.with(|ctx| tool.on_hover(ctx, Point::new(2.0, 2.0)));
        assert_eq!(tool.overlay(&h.view()).len(), 1);
        h.with(|ctx| tool.on_hover(ctx, Point::new(50.0, 2.0)));
        assert!(tool.overlay(&h.view()).is_empty());
    }
}
