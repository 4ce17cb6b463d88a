//! Select tool: pick, marquee, move, delete and visibility hotkeys.

use super::{PREVIEW_THRESHOLD, Tool, ToolContext, ToolHotkey, ToolKind};
use crate::adjust::{AdjustmentPoint, HandleMode, affected_points};
use crate::constraint::ConstrainedPoint;
use crate::input::Interaction;
use crate::objects::{MapObject, ObjectId};
use crate::render::{INDICATOR_COLOR, Primitive, RenderQuality};
use crate::scene::SceneView;
use kurbo::Point;

const MARQUEE_WIDTH: f64 = 2.0;

#[derive(Debug, Clone, Default)]
enum DragOperation {
    #[default]
    None,
    /// Box selection from the drag origin.
    Marquee { origin: Point, corner: Option<Point> },
    /// Moving the selection's handles.
    Move { points: Vec<AdjustmentPoint> },
}

/// Object selection and whole-object moves.
#[derive(Debug, Default)]
pub struct SelectTool {
    drag: DragOperation,
    /// Text whose content is being re-entered.
    editing: Option<ObjectId>,
}

impl SelectTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the selection from a click at `point` or a box to `corner`.
    fn update_selection(ctx: &mut ToolContext<'_>, preserve: bool, point: Point, corner: Option<Point>) {
        let mut selection = if preserve { ctx.scene.selection() } else { Vec::new() };
        match corner {
            Some(corner) => {
                for id in ctx.view().objects_at(point, Some(corner)) {
                    if !selection.contains(&id) {
                        selection.push(id);
                    }
                }
            }
            None => {
                let target = hits_icons_first(&ctx.view(), point).first().copied();
                if preserve {
                    if let Some(target) = target {
                        match selection.iter().position(|&id| id == target) {
                            Some(i) => {
                                selection.remove(i);
                            }
                            None => selection.push(target),
                        }
                    }
                } else {
                    selection.extend(target);
                }
            }
        }
        ctx.select(&selection);
    }

    fn begin_move(ctx: &mut ToolContext<'_>) -> Vec<AdjustmentPoint> {
        let view = ctx.view();
        let (selected, others): (Vec<&MapObject>, Vec<&MapObject>) =
            view.scene().objects().partition(|obj| obj.is_selected());
        let mut points: Vec<AdjustmentPoint> = selected
            .iter()
            .flat_map(|obj| obj.adjustment_points(&view, HandleMode::Combined))
            .collect();
        let shared: Vec<AdjustmentPoint> = others
            .iter()
            .flat_map(|obj| obj.adjustment_points(&view, HandleMode::Combined))
            .filter(|candidate| points.iter().any(|pt| pt.original == candidate.original))
            .collect();

        if ctx.settings.adjust_linked {
            points.extend(shared);
        } else {
            for pt in shared.iter().filter(|pt| pt.is_constrained) {
                ctx.adjust(pt.object, pt.index, &ConstrainedPoint::free(pt.original), false);
            }
        }
        points
    }

    fn move_points(ctx: &mut ToolContext<'_>, points: &[AdjustmentPoint], interaction: &Interaction, is_final: bool) {
        let d = interaction.destination - interaction.origin;
        for pt in affected_points(points, ctx.settings.adjust_linked) {
            ctx.adjust(pt.object, pt.index, &ConstrainedPoint::free(pt.original + d), is_final);
        }
    }

    fn set_revealed(ctx: &mut ToolContext<'_>, revealed: bool) {
        let selection = ctx.scene.selection();
        if selection.is_empty() {
            return;
        }
        for id in &selection {
            if let Some(obj) = ctx.scene.get_mut(*id) {
                obj.set_revealed(revealed);
            }
        }
        log::debug!("Set {} object(s) revealed={}", selection.len(), revealed);
        ctx.register_history();
        ctx.redraw(RenderQuality::Full);
    }

    fn reverse_waypoints(ctx: &mut ToolContext<'_>) {
        let mut changed = false;
        for id in ctx.scene.selection() {
            if let Some(MapObject::Waypoint(waypoint)) = ctx.scene.get_mut(id) {
                changed |= waypoint.reverse_direction(ctx.registry);
            }
        }
        if changed {
            ctx.register_history();
            ctx.redraw(RenderQuality::Full);
        }
    }
}

/// Objects hit at `point`, symbols and waypoints ahead of everything else.
pub(crate) fn hits_icons_first(view: &SceneView<'_>, point: Point) -> Vec<ObjectId> {
    let mut hits = view.objects_at(point, None);
    // Stable: draw order is kept within each class.
    hits.sort_by_key(|id| !view.scene().get(*id).is_some_and(MapObject::is_icon));
    hits
}

impl Tool for SelectTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Select
    }

    fn deactivate(&mut self, _ctx: &mut ToolContext<'_>) {
        self.drag = DragOperation::None;
        self.editing = None;
    }

    fn on_pointer_out(&mut self, _ctx: &mut ToolContext<'_>) {
        self.drag = DragOperation::None;
    }

    fn on_click(&mut self, ctx: &mut ToolContext<'_>, interaction: &Interaction) {
        Self::update_selection(ctx, interaction.modifiers.shift, interaction.origin, None);
    }

    fn on_double_click(&mut self, ctx: &mut ToolContext<'_>, interaction: &Interaction) {
        let view = ctx.view();
        let hit = view
            .objects_at(interaction.destination, None)
            .into_iter()
            .find_map(|id| view.scene().get(id).and_then(MapObject::as_text).map(|t| (id, t.text.clone())));
        if let Some((id, content)) = hit {
            self.editing = Some(id);
            ctx.request_prompt(content);
        }
    }

    fn on_drag_start(&mut self, ctx: &mut ToolContext<'_>, interaction: &Interaction) {
        let target = hits_icons_first(&ctx.view(), interaction.origin).first().copied();
        let selected = target
            .and_then(|id| ctx.scene.get(id))
            .is_some_and(MapObject::is_selected);

        self.drag = if selected {
            DragOperation::Move {
                points: Self::begin_move(ctx),
            }
        } else {
            DragOperation::Marquee {
                origin: interaction.origin,
                corner: None,
            }
        };
    }

    fn on_drag_move(&mut self, ctx: &mut ToolContext<'_>, interaction: &Interaction) {
        match &mut self.drag {
            DragOperation::None => {}
            DragOperation::Marquee { corner, .. } => {
                let d = interaction.destination - interaction.origin;
                *corner = (d.hypot() > PREVIEW_THRESHOLD).then_some(interaction.destination);
            }
            DragOperation::Move { points } => {
                Self::move_points(ctx, points, interaction, false);
                ctx.redraw(RenderQuality::Fast);
            }
        }
    }

    fn on_drop(&mut self, ctx: &mut ToolContext<'_>, interaction: &Interaction) {
        match std::mem::take(&mut self.drag) {
            DragOperation::None => {}
            DragOperation::Marquee { .. } => {
                Self::update_selection(
                    ctx,
                    interaction.modifiers.shift,
                    interaction.origin,
                    Some(interaction.destination),
                );
            }
            DragOperation::Move { points } => {
                Self::move_points(ctx, &points, interaction, true);
                ctx.register_history();
                ctx.redraw(RenderQuality::Full);
            }
        }
    }

    fn on_delete_key(&mut self, ctx: &mut ToolContext<'_>) {
        let selection = ctx.scene.selection();
        ctx.delete_objects(&selection);
    }

    fn hotkey_pressed(&mut self, ctx: &mut ToolContext<'_>, key: ToolHotkey) {
        match key {
            ToolHotkey::Reveal => Self::set_revealed(ctx, true),
            ToolHotkey::Hide => Self::set_revealed(ctx, false),
            ToolHotkey::Reverse => Self::reverse_waypoints(ctx),
            ToolHotkey::Bold => ctx.toggle_text_style(true),
            ToolHotkey::Italic => ctx.toggle_text_style(false),
        }
    }

    fn prompt_resolved(&mut self, ctx: &mut ToolContext<'_>, answer: Option<&str>) {
        let Some(id) = self.editing.take() else {
            return;
        };
        let Some(content) = answer.filter(|s| !s.is_empty()) else {
            return;
        };
        if let Some(text) = ctx.scene.get_mut(id).and_then(MapObject::as_text_mut) {
            text.set_text(content);
            ctx.register_history();
            ctx.redraw(RenderQuality::Full);
        }
    }

    fn overlay(&self, _view: &SceneView<'_>) -> Vec<Primitive> {
        match &self.drag {
            DragOperation::Marquee {
                origin,
                corner: Some(corner),
            } => vec![Primitive::rect(*origin, *corner, MARQUEE_WIDTH, INDICATOR_COLOR)],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Line, Symbol, Text, TextStyle, Waypoint};
    use crate::tools::test_support::{Harness, interaction, shifted};
    use kurbo::Vec2;

    fn line(h: &mut Harness, a: (f64, f64), b: (f64, f64)) -> ObjectId {
        h.scene.add(MapObject::Line(Line::new(
            [
                ConstrainedPoint::free(Point::new(a.0, a.1)),
                ConstrainedPoint::free(Point::new(b.0, b.1)),
            ],
            "major",
        )))
    }

    fn endpoints(h: &Harness, id: ObjectId) -> (Point, Point) {
        h.scene.get(id).unwrap().as_line().unwrap().endpoints(&h.view())
    }

    fn drag(h: &mut Harness, tool: &mut SelectTool, from: (f64, f64), to: (f64, f64)) {
        let i = interaction(from, to);
        h.with(|ctx| tool.on_drag_start(ctx, &i));
        h.with(|ctx| tool.on_drag_move(ctx, &i));
        h.with(|ctx| tool.on_drop(ctx, &i));
    }

    #[test]
    fn test_click_prefers_symbols() {
        let mut h = Harness::new();
        let s = h.scene.add(MapObject::Symbol(Symbol::new(
            ConstrainedPoint::free(Point::new(50.0, 0.0)),
            "major-settlement",
        )));
        // The line is on top in draw order but the symbol still wins.
        let l = line(&mut h, (0.0, 0.0), (100.0, 0.0));

        let mut tool = SelectTool::new();
        h.with(|ctx| tool.on_click(ctx, &interaction((50.0, 0.0), (50.0, 0.0))));
        assert_eq!(h.scene.selection(), vec![s]);

        h.with(|ctx| tool.on_click(ctx, &shifted(interaction((10.0, 0.0), (10.0, 0.0)))));
        assert_eq!(h.scene.selection(), vec![s, l]);

        // Shift-click toggles membership off.
        h.with(|ctx| tool.on_click(ctx, &shifted(interaction((50.0, 0.0), (50.0, 0.0)))));
        assert_eq!(h.scene.selection(), vec![l]);

        h.with(|ctx| tool.on_click(ctx, &interaction((500.0, 500.0), (500.0, 500.0))));
        assert!(h.scene.selection().is_empty());
    }

    #[test]
    fn test_marquee_selects_intersecting_objects() {
        let mut h = Harness::new();
        let a = line(&mut h, (0.0, 0.0), (100.0, 0.0));
        let b = line(&mut h, (0.0, 50.0), (100.0, 50.0));
        let c = line(&mut h, (0.0, 200.0), (100.0, 200.0));

        let mut tool = SelectTool::new();
        let i = interaction((-10.0, -10.0), (60.0, 60.0));
        h.with(|ctx| tool.on_drag_start(ctx, &i));
        h.with(|ctx| tool.on_drag_move(ctx, &i));
        assert_eq!(tool.overlay(&h.view()).len(), 1);
        h.with(|ctx| tool.on_drop(ctx, &i));
        assert!(tool.overlay(&h.view()).is_empty());
        assert_eq!(h.scene.selection(), vec![a, b]);

        let i = shifted(interaction((-10.0, 190.0), (60.0, 210.0)));
        h.with(|ctx| tool.on_drag_start(ctx, &i));
        h.with(|ctx| tool.on_drop(ctx, &i));
        assert_eq!(h.scene.selection(), vec![a, b, c]);
        // Marquee selection alone records no history.
        assert!(!h.effects.history);
    }

    #[test]
    fn test_linked_move_drags_shared_points() {
        let mut h = Harness::new();
        let a = line(&mut h, (0.0, 0.0), (10.0, 10.0));
        let b = line(&mut h, (10.0, 10.0), (30.0, 0.0));
        h.scene.set_selection(&[a]);

        let mut tool = SelectTool::new();
        drag(&mut h, &mut tool, (5.0, 5.0), (10.0, 10.0));
        assert!(h.effects.history);

        assert_eq!(endpoints(&h, a), (Point::new(5.0, 5.0), Point::new(15.0, 15.0)));
        assert_eq!(endpoints(&h, b), (Point::new(15.0, 15.0), Point::new(30.0, 0.0)));
    }

    #[test]
    fn test_unlinked_move_detaches_bound_neighbors() {
        let mut h = Harness::new();
        h.settings.adjust_linked = false;
        let a = line(&mut h, (0.0, 0.0), (100.0, 0.0));
        let s = h.scene.add(MapObject::Symbol(Symbol::new(
            ConstrainedPoint::bound(Point::new(100.0, 0.0), a, 1.0),
            "major-settlement",
        )));
        h.scene.set_selection(&[a]);

        let mut tool = SelectTool::new();
        drag(&mut h, &mut tool, (50.0, 0.0), (50.0, 20.0));

        assert_eq!(endpoints(&h, a), (Point::new(0.0, 20.0), Point::new(100.0, 20.0)));
        let view = h.view();
        let MapObject::Symbol(symbol) = h.scene.get(s).unwrap() else {
            panic!("expected symbol");
        };
        assert!(!symbol.point.is_bound());
        assert_eq!(symbol.position(&view), Point::new(100.0, 0.0));
    }

    #[test]
    fn test_bound_symbol_follows_moved_line() {
        let mut h = Harness::new();
        let a = line(&mut h, (0.0, 0.0), (100.0, 0.0));
        let s = h.scene.add(MapObject::Symbol(Symbol::new(
            ConstrainedPoint::bound(Point::new(100.0, 0.0), a, 1.0),
            "major-settlement",
        )));
        h.scene.set_selection(&[a]);

        let mut tool = SelectTool::new();
        drag(&mut h, &mut tool, (50.0, 0.0), (50.0, 20.0));

        let view = h.view();
        let MapObject::Symbol(symbol) = h.scene.get(s).unwrap() else {
            panic!("expected symbol");
        };
        assert!(symbol.point.is_bound());
        assert_eq!(symbol.position(&view), Point::new(100.0, 20.0));
    }

    #[test]
    fn test_delete_and_visibility_hotkeys() {
        let mut h = Harness::new();
        let a = line(&mut h, (0.0, 0.0), (100.0, 0.0));
        let b = line(&mut h, (0.0, 50.0), (100.0, 50.0));
        h.scene.set_selection(&[a]);
        let mut tool = SelectTool::new();

        h.with(|ctx| tool.hotkey_pressed(ctx, ToolHotkey::Hide));
        assert!(h.effects.history);
        assert!(!h.scene.get(a).unwrap().is_revealed());
        assert!(h.scene.get(b).unwrap().is_revealed());
        h.with(|ctx| tool.hotkey_pressed(ctx, ToolHotkey::Reveal));
        assert!(h.scene.get(a).unwrap().is_revealed());

        h.with(|ctx| tool.on_delete_key(ctx));
        assert!(h.effects.history);
        assert!(!h.scene.contains(a));
        assert!(h.scene.contains(b));

        // Nothing selected: nothing recorded.
        h.with(|ctx| tool.on_delete_key(ctx));
        assert!(!h.effects.history);
    }

    #[test]
    fn test_reverse_and_text_style_hotkeys() {
        let mut h = Harness::new();
        let l = line(&mut h, (0.0, 0.0), (100.0, 0.0));
        let w = h.scene.add(MapObject::Waypoint(Waypoint::new(
            ConstrainedPoint::bound(Point::new(50.0, 0.0), l, 0.5),
            "elevation-left",
        )));
        let t = h.scene.add(MapObject::Text(Text::new(
            ConstrainedPoint::free(Point::new(0.0, 100.0)),
            Vec2::ZERO,
            "Mirkwood",
        )));
        h.scene.set_selection(&[w, t]);
        let mut tool = SelectTool::new();

        h.with(|ctx| tool.hotkey_pressed(ctx, ToolHotkey::Reverse));
        assert!(h.effects.history);
        let MapObject::Waypoint(waypoint) = h.scene.get(w).unwrap() else {
            panic!("expected waypoint");
        };
        assert_eq!(waypoint.symbol(), "elevation-right");

        h.with(|ctx| tool.hotkey_pressed(ctx, ToolHotkey::Bold));
        h.with(|ctx| tool.hotkey_pressed(ctx, ToolHotkey::Italic));
        assert_eq!(h.scene.get(t).unwrap().as_text().unwrap().style, TextStyle::BoldItalic);
    }

    #[test]
    fn test_double_click_edits_text() {
        let mut h = Harness::new();
        let t = h.scene.add(MapObject::Text(Text::new(
            ConstrainedPoint::free(Point::new(0.0, 0.0)),
            Vec2::ZERO,
            "Old",
        )));
        let mut tool = SelectTool::new();

        h.with(|ctx| tool.on_double_click(ctx, &interaction((0.0, 0.0), (0.0, 0.0))));
        assert_eq!(h.effects.prompt.as_deref(), Some("Old"));

        // An empty answer leaves the text alone.
        h.with(|ctx| tool.prompt_resolved(ctx, Some("")));
        assert!(!h.effects.history);

        h.with(|ctx| tool.on_double_click(ctx, &interaction((0.0, 0.0), (0.0, 0.0))));
        h.with(|ctx| tool.prompt_resolved(ctx, Some("New")));
        assert!(h.effects.history);
        assert_eq!(h.scene.get(t).unwrap().as_text().unwrap().text, "New");
    }
}
