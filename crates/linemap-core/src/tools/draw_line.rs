//! Draw-line tool: drag out a two-point line, snapping both ends.

use super::{Tool, ToolContext, ToolKind};
use crate::constraint::ConstrainedPoint;
use crate::input::Interaction;
use crate::objects::{Line, MapObject, MapObjectTrait};
use crate::render::{DrawLayers, DrawStyle, Primitive};
use crate::scene::SceneView;
use crate::snap::{SnapKind, SnapPoint};
use kurbo::Point;

const SNAP_KINDS: [SnapKind; 3] = [SnapKind::LineContour, SnapKind::LineEnd, SnapKind::Symbol];
/// Shortest line that gets committed.
const MIN_LINE_LENGTH: f64 = 10.0;

/// Draws lines in the active style.
#[derive(Debug)]
pub struct DrawLineTool {
    active_style: String,
    stroke: Option<[ConstrainedPoint; 2]>,
    snap: Option<SnapPoint>,
}

impl DrawLineTool {
    pub fn new(style: &str) -> Self {
        Self {
            active_style: style.to_string(),
            stroke: None,
            snap: None,
        }
    }

    pub fn active_style(&self) -> &str {
        &self.active_style
    }

    pub fn set_active_style(&mut self, style: &str) {
        self.active_style = style.to_string();
    }

    fn preview_line(&self) -> Option<Line> {
        self.stroke.clone().map(|stroke| Line::new(stroke, &self.active_style))
    }
}

impl Tool for DrawLineTool {
    fn kind(&self) -> ToolKind {
        ToolKind::DrawLine
    }

    fn activate(&mut self, ctx: &mut ToolContext<'_>) {
        ctx.select(&[]);
    }

    fn deactivate(&mut self, _ctx: &mut ToolContext<'_>) {
        self.stroke = None;
        self.snap = None;
    }

    fn on_hover(&mut self, ctx: &mut ToolContext<'_>, point: Point) {
        self.snap = ctx.snap(point, &SNAP_KINDS, &[]);
    }

    fn on_pointer_out(&mut self, _ctx: &mut ToolContext<'_>) {
        self.stroke = None;
        self.snap = None;
    }

    fn on_drag_start(&mut self, ctx: &mut ToolContext<'_>, interaction: &Interaction) {
        self.snap = ctx.snap(interaction.origin, &SNAP_KINDS, &[]);
        let start = ConstrainedPoint::from_snap(interaction.origin, self.snap.as_ref());
        self.stroke = Some([start.clone(), start]);
    }

    fn on_drag_move(&mut self, ctx: &mut ToolContext<'_>, interaction: &Interaction) {
        self.snap = ctx.snap(interaction.destination, &SNAP_KINDS, &[]);
        if let Some(stroke) = self.stroke.as_mut() {
            stroke[1] = ConstrainedPoint::from_snap(interaction.destination, self.snap.as_ref());
        }
    }

    fn on_drop(&mut self, ctx: &mut ToolContext<'_>, _interaction: &Interaction) {
        let line = self.preview_line();
        self.stroke = None;
        let Some(line) = line else {
            return;
        };
        let length = line.length(&ctx.view());
        if length > MIN_LINE_LENGTH {
            ctx.add_object(MapObject::Line(line));
        } else {
            log::debug!("Discarding {:.1} unit stroke", length);
        }
    }

    fn overlay(&self, view: &SceneView<'_>) -> Vec<Primitive> {
        let mut layers = DrawLayers::new();
        if let Some(line) = self.preview_line() {
            let style = DrawStyle {
                privileged: true,
                light_mode: view.scene().is_light_mode(),
            };
            line.draw(view, &style, &mut layers);
        }
        let mut overlay = layers.lines;
        if let Some(snap) = self.snap {
            overlay.push(Primitive::snap_cross(snap.point));
        }
        overlay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{ObjectId, Symbol};
    use crate::tools::test_support::{Harness, interaction};

    fn drag(h: &mut Harness, tool: &mut DrawLineTool, from: (f64, f64), to: (f64, f64)) {
        let i = interaction(from, to);
        h.with(|ctx| tool.on_drag_start(ctx, &i));
        h.with(|ctx| tool.on_drag_move(ctx, &i));
        h.with(|ctx| tool.on_drop(ctx, &i));
    }

    fn only_line(h: &Harness) -> (ObjectId, Line) {
        let lines: Vec<_> = h.scene.objects().filter_map(MapObject::as_line).collect();
        assert_eq!(lines.len(), 1);
        (lines[0].id(), lines[0].clone())
    }

    #[test]
    fn test_commits_line_in_active_style() {
        let mut h = Harness::new();
        let mut tool = DrawLineTool::new("major");
        tool.set_active_style("rough");

        drag(&mut h, &mut tool, (0.0, 0.0), (100.0, 0.0));
        assert!(h.effects.history);

        let (_, line) = only_line(&h);
        assert_eq!(line.style, "rough");
        assert_eq!(line.endpoints(&h.view()), (Point::new(0.0, 0.0), Point::new(100.0, 0.0)));
        assert!(tool.overlay(&h.view()).is_empty());
    }

    #[test]
    fn test_short_stroke_is_discarded() {
        let mut h = Harness::new();
        let mut tool = DrawLineTool::new("major");
        drag(&mut h, &mut tool, (0.0, 0.0), (6.0, 8.0));
        assert!(h.scene.is_empty());
        assert!(!h.effects.history);
    }

    #[test]
    fn test_endpoints_snap_to_line_end_and_symbol() {
        let mut h = Harness::new();
        let mut tool = DrawLineTool::new("major");
        drag(&mut h, &mut tool, (0.0, 0.0), (100.0, 0.0));
        let (first, _) = only_line(&h);
        let s = h.scene.add(MapObject::Symbol(Symbol::new(
            ConstrainedPoint::free(Point::new(100.0, 200.0)),
            "major-settlement",
        )));

        drag(&mut h, &mut tool, (103.0, 4.0), (110.0, 190.0));

        let view = h.view();
        let second = h
            .scene
            .objects()
            .filter_map(MapObject::as_line)
            .find(|l| l.id() != first)
            .unwrap();
        assert_eq!(second.points[0].source(), Some(first));
        assert_eq!(second.points[0].binding().unwrap().t, 1.0);
        // The raw press position is kept as fallback.
        assert_eq!(second.points[0].point(), Point::new(103.0, 4.0));
        assert_eq!(second.points[1].source(), Some(s));
        assert_eq!(second.endpoints(&view), (Point::new(100.0, 0.0), Point::new(100.0, 200.0)));
    }

    #[test]
    fn test_hover_shows_snap_cross() {
        let mut h = Harness::new();
        let mut tool = DrawLineTool::new("major");
        drag(&mut h, &mut tool, (0.0, 0.0), (100.0, 0.0));

        h.with(|ctx| tool.on_hover(ctx, Point::new(50.0, 3.0)));
        assert_eq!(tool.overlay(&h.view()).len(), 1);
        h.with(|ctx| tool.on_hover(ctx, Point::new(50.0, 300.0)));
        assert!(tool.overlay(&h.view()).is_empty());
    }
}
