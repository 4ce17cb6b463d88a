//! Draw-text tool: place labels, optionally anchored to lines and symbols.

use super::{Tool, ToolContext, ToolHotkey, ToolKind};
use crate::constraint::ConstrainedPoint;
use crate::input::Interaction;
use crate::objects::{MapObject, ObjectId, Text};
use crate::render::{Primitive, RenderQuality};
use crate::scene::SceneView;
use crate::snap::{SnapKind, SnapPoint};
use kurbo::Point;

const SNAP_KINDS: [SnapKind; 2] = [SnapKind::LineContour, SnapKind::Symbol];

/// What the open prompt is for.
#[derive(Debug, Clone)]
enum Pending {
    /// A new label at this anchor.
    Create(ConstrainedPoint),
    /// New content for an existing label.
    Edit(ObjectId),
}

#[derive(Debug, Default)]
pub struct DrawTextTool {
    pending: Option<Pending>,
    snap: Option<SnapPoint>,
}

impl DrawTextTool {
    pub fn new() -> Self {
        Self::default()
    }

    fn text_at(view: &SceneView<'_>, point: Point) -> Option<(ObjectId, String)> {
        view.objects_at(point, None)
            .into_iter()
            .find_map(|id| view.scene().get(id)?.as_text().map(|t| (id, t.text.clone())))
    }

    fn create(&self, ctx: &mut ToolContext<'_>, point: ConstrainedPoint, content: &str) {
        let offset = Text::initial_offset(&ctx.view(), &point, content);
        let id = ctx.add_object(MapObject::Text(Text::new(point, offset, content)));
        ctx.select(&[id]);
    }
}

impl Tool for DrawTextTool {
    fn kind(&self) -> ToolKind {
        ToolKind::DrawText
    }

    fn activate(&mut self, ctx: &mut ToolContext<'_>) {
        ctx.select(&[]);
    }

    fn deactivate(&mut self, _ctx: &mut ToolContext<'_>) {
        self.pending = None;
        self.snap = None;
    }

    fn on_hover(&mut self, ctx: &mut ToolContext<'_>, point: Point) {
        self.snap = ctx.snap(point, &SNAP_KINDS, &[]);
    }

    fn on_pointer_out(&mut self, _ctx: &mut ToolContext<'_>) {
        self.snap = None;
    }

    fn on_click(&mut self, ctx: &mut ToolContext<'_>, interaction: &Interaction) {
        if let Some((id, _)) = Self::text_at(&ctx.view(), interaction.destination) {
            ctx.select(&[id]);
            return;
        }

        self.snap = ctx.snap(interaction.destination, &SNAP_KINDS, &[]);
        let point = self.snap.map_or(interaction.destination, |s| s.point);
        self.pending = Some(Pending::Create(ConstrainedPoint::from_snap(point, self.snap.as_ref())));
        ctx.request_prompt("");
    }

    fn on_double_click(&mut self, ctx: &mut ToolContext<'_>, interaction: &Interaction) {
        if let Some((id, content)) = Self::text_at(&ctx.view(), interaction.destination) {
            ctx.select(&[id]);
            self.pending = Some(Pending::Edit(id));
            ctx.request_prompt(content);
        }
    }

    fn hotkey_pressed(&mut self, ctx: &mut ToolContext<'_>, key: ToolHotkey) {
        match key {
            ToolHotkey::Bold => ctx.toggle_text_style(true),
            ToolHotkey::Italic => ctx.toggle_text_style(false),
            _ => {}
        }
    }

    fn prompt_resolved(&mut self, ctx: &mut ToolContext<'_>, answer: Option<&str>) {
        self.snap = None;
        let Some(pending) = self.pending.take() else {
            return;
        };
        let Some(content) = answer.filter(|s| !s.is_empty()) else {
            ctx.select(&[]);
            return;
        };
        match pending {
            Pending::Create(point) => self.create(ctx, point, content),
            Pending::Edit(id) => {
                if let Some(text) = ctx.scene.get_mut(id).and_then(MapObject::as_text_mut) {
                    text.set_text(content);
                    ctx.register_history();
                    ctx.redraw(RenderQuality::Full);
                }
            }
        }
    }

    fn overlay(&self, _view: &SceneView<'_>) -> Vec<Primitive> {
        self.snap.map(|s| Primitive::snap_cross(s.point)).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{Line, TextStyle};
    use crate::tools::test_support::{Harness, interaction};
    use kurbo::Vec2;

    fn click(h: &mut Harness, tool: &mut DrawTextTool, at: (f64, f64)) {
        h.with(|ctx| tool.on_click(ctx, &interaction(at, at)));
    }

    fn only_text(h: &Harness) -> Text {
        let texts: Vec<_> = h.scene.objects().filter_map(MapObject::as_text).collect();
        assert_eq!(texts.len(), 1);
        texts[0].clone()
    }

    #[test]
    fn test_free_label() {
        let mut h = Harness::new();
        let mut tool = DrawTextTool::new();
        click(&mut h, &mut tool, (300.0, 300.0));
        assert_eq!(h.effects.prompt.as_deref(), Some(""));
        assert!(h.scene.is_empty());

        h.with(|ctx| tool.prompt_resolved(ctx, Some("Old Mill")));
        assert!(h.effects.history);
        let text = only_text(&h);
        assert_eq!(text.text, "Old Mill");
        assert!(!text.point.is_bound());
        assert_eq!(text.point.point(), Point::new(300.0, 300.0));
        assert_eq!(text.offset, Vec2::ZERO);
        assert_eq!(h.scene.selection(), vec![text.id]);
    }

    #[test]
    fn test_anchored_label_is_offset_outside_source() {
        let mut h = Harness::new();
        let line = h.scene.add(MapObject::Line(Line::new(
            [
                ConstrainedPoint::free(Point::new(0.0, 0.0)),
                ConstrainedPoint::free(Point::new(200.0, 0.0)),
            ],
            "major",
        )));
        let mut tool = DrawTextTool::new();
        click(&mut h, &mut tool, (100.0, 4.0));
        h.with(|ctx| tool.prompt_resolved(ctx, Some("River")));

        let text = only_text(&h);
        assert_eq!(text.point.source(), Some(line));
        let (_, height) = Text::measure("River");
        let ascent = h.view().text_ascent(line);
        assert_eq!(text.offset, Vec2::new(0.0, -(ascent + height / 2.0)));
        assert!(text.offset.y < 0.0);
    }

    #[test]
    fn test_cancel_or_empty_answer_creates_nothing() {
        let mut h = Harness::new();
        let mut tool = DrawTextTool::new();
        click(&mut h, &mut tool, (10.0, 10.0));
        h.with(|ctx| tool.prompt_resolved(ctx, None));
        assert!(h.scene.is_empty());
        assert!(!h.effects.history);

        click(&mut h, &mut tool, (10.0, 10.0));
        h.with(|ctx| tool.prompt_resolved(ctx, Some("")));
        assert!(h.scene.is_empty());

        // A stray answer with nothing pending is ignored.
        h.with(|ctx| tool.prompt_resolved(ctx, Some("x")));
        assert!(h.scene.is_empty());
    }

    #[test]
    fn test_click_selects_and_double_click_edits() {
        let mut h = Harness::new();
        let id = h.scene.add(MapObject::Text(Text::new(
            ConstrainedPoint::free(Point::new(0.0, 0.0)),
            Vec2::ZERO,
            "Ford",
        )));
        let mut tool = DrawTextTool::new();

        click(&mut h, &mut tool, (0.0, 0.0));
        assert_eq!(h.scene.selection(), vec![id]);
        assert!(h.effects.prompt.is_none());

        h.with(|ctx| tool.on_double_click(ctx, &interaction((0.0, 0.0), (0.0, 0.0))));
        assert_eq!(h.effects.prompt.as_deref(), Some("Ford"));
        h.with(|ctx| tool.prompt_resolved(ctx, Some("Ferry")));
        assert!(h.effects.history);
        assert_eq!(h.scene.len(), 1);
        assert_eq!(h.scene.get(id).unwrap().as_text().unwrap().text, "Ferry");
    }

    #[test]
    fn test_hotkeys_style_selected_text() {
        let mut h = Harness::new();
        let id = h.scene.add(MapObject::Text(Text::new(
            ConstrainedPoint::free(Point::new(0.0, 0.0)),
            Vec2::ZERO,
            "Ford",
        )));
        h.scene.set_selection(&[id]);
        let mut tool = DrawTextTool::new();

        h.with(|ctx| tool.hotkey_pressed(ctx, ToolHotkey::Italic));
        assert!(h.effects.history);
        assert_eq!(h.scene.get(id).unwrap().as_text().unwrap().style, TextStyle::Italic);

        h.with(|ctx| tool.hotkey_pressed(ctx, ToolHotkey::Reveal));
        assert!(!h.effects.history);
    }
}
