//! Draw-area tool: rubber-band rectangles and vertex editing of the selected area.

use super::{PREVIEW_THRESHOLD, Tool, ToolContext, ToolKind};
use crate::adjust::{AdjustmentPoint, HANDLE_RADIUS, HandleMode};
use crate::constraint::ConstrainedPoint;
use crate::input::Interaction;
use crate::objects::{Area, MapObject, ObjectId};
use crate::render::{DrawStyle, HANDLE_COLOR, Primitive, RenderQuality, SELECTION_COLOR};
use crate::scene::SceneView;
use kurbo::Point;

const SELECTED_HANDLE_WIDTH: f64 = 4.0;
const HANDLE_WIDTH: f64 = 2.0;
const RUBBER_BAND_WIDTH: f64 = 4.0;

/// Creates areas and edits the vertices of the selected one.
#[derive(Debug)]
pub struct DrawAreaTool {
    active_pattern: String,
    selected_vertex: Option<AdjustmentPoint>,
    /// Rectangle being dragged out.
    rubber_band: Option<(Point, Point)>,
}

impl DrawAreaTool {
    pub fn new(pattern: &str) -> Self {
        Self {
            active_pattern: pattern.to_string(),
            selected_vertex: None,
            rubber_band: None,
        }
    }

    pub fn active_pattern(&self) -> &str {
        &self.active_pattern
    }

    /// Change the pattern for new areas. The selected area is re-patterned.
    pub fn set_active_pattern(&mut self, ctx: &mut ToolContext<'_>, pattern: &str) {
        self.active_pattern = pattern.to_string();
        let Some(id) = selected_area(ctx.scene.selection(), &ctx.view()) else {
            return;
        };
        if let Some(area) = ctx.scene.get_mut(id).and_then(MapObject::as_area_mut) {
            area.pattern = pattern.to_string();
            ctx.register_history();
            ctx.redraw(RenderQuality::Full);
        }
    }

    pub fn selected_vertex(&self) -> Option<usize> {
        self.selected_vertex.map(|pt| pt.index)
    }

    fn handle_at(view: &SceneView<'_>, area: Option<ObjectId>, point: Point) -> Option<AdjustmentPoint> {
        let area = view.scene().get(area?)?;
        area.adjustment_points(view, HandleMode::Separate)
            .into_iter()
            .find(|pt| pt.covers(point))
    }

    /// Handle of the selected area to remove on double-click. Besides
    /// covering `point`, the vertex must lie nearer to it than the midpoints
    /// of both adjacent edges.
    fn removal_at(view: &SceneView<'_>, area: Option<ObjectId>, point: Point) -> Option<AdjustmentPoint> {
        let obj = view.scene().get(area?)?;
        let points = obj.as_area()?.points();
        let n = points.len();
        obj.adjustment_points(view, HandleMode::Separate)
            .into_iter()
            .find(|pt| {
                let distance = (point - pt.original).hypot();
                let neighbours = [points[(pt.index + n - 1) % n], points[(pt.index + 1) % n]];
                pt.covers(point)
                    && neighbours
                        .iter()
                        .all(|&q| distance < (point - pt.original.midpoint(q)).hypot())
            })
    }

    fn edge_hit(view: &SceneView<'_>, point: Point) -> Option<(ObjectId, usize, f64)> {
        view.scene().objects().find_map(|obj| {
            let area = obj.as_area()?;
            area.edge_hit_test(point).map(|(edge, t)| (obj.id(), edge, t))
        })
    }
}

/// The first selected object, when it is an area.
fn selected_area(selection: Vec<ObjectId>, view: &SceneView<'_>) -> Option<ObjectId> {
    let first = *selection.first()?;
    view.scene().get(first)?.as_area().map(|_| first)
}

impl Tool for DrawAreaTool {
    fn kind(&self) -> ToolKind {
        ToolKind::DrawArea
    }

    fn activate(&mut self, ctx: &mut ToolContext<'_>) {
        ctx.select(&[]);
        self.selected_vertex = None;
    }

    fn deactivate(&mut self, _ctx: &mut ToolContext<'_>) {
        self.selected_vertex = None;
        self.rubber_band = None;
    }

    fn state_invalidated(&mut self, _ctx: &mut ToolContext<'_>) {
        self.selected_vertex = None;
    }

    fn on_pointer_out(&mut self, _ctx: &mut ToolContext<'_>) {
        self.rubber_band = None;
    }

    fn on_click(&mut self, ctx: &mut ToolContext<'_>, interaction: &Interaction) {
        let view = ctx.view();
        let current = selected_area(view.scene().selection(), &view);
        if let Some(handle) = Self::handle_at(&view, current, interaction.origin) {
            self.selected_vertex = Some(handle);
            ctx.redraw(RenderQuality::Full);
            return;
        }

        self.selected_vertex = None;
        match Self::edge_hit(&view, interaction.origin) {
            Some((id, _, _)) => {
                if let Some(area) = view.scene().get(id).and_then(MapObject::as_area) {
                    self.active_pattern = area.pattern.clone();
                }
                ctx.select(&[id]);
            }
            None => ctx.select(&[]),
        }
    }

    /// Removes the vertex of the selected area under the pointer, otherwise
    /// inserts a vertex on the edge under the pointer.
    fn on_double_click(&mut self, ctx: &mut ToolContext<'_>, interaction: &Interaction) {
        let view = ctx.view();
        let current = selected_area(view.scene().selection(), &view);
        let removal = Self::removal_at(&view, current, interaction.origin);
        let insertion = Self::edge_hit(&view, interaction.origin);

        // Indices shift either way.
        self.selected_vertex = None;
        let changed = match (removal, insertion) {
            (Some(vertex), _) => ctx
                .scene
                .get_mut(vertex.object)
                .and_then(MapObject::as_area_mut)
                .is_some_and(|area| area.remove_vertex(vertex.index)),
            (None, Some((id, edge, t))) => ctx
                .scene
                .get_mut(id)
                .and_then(MapObject::as_area_mut)
                .and_then(|area| area.add_vertex(edge, t))
                .is_some(),
            (None, None) => false,
        };
        if changed {
            ctx.register_history();
        }
        ctx.redraw(RenderQuality::Full);
    }

    fn on_drag_start(&mut self, ctx: &mut ToolContext<'_>, interaction: &Interaction) {
        let view = ctx.view();
        let current = selected_area(view.scene().selection(), &view);
        self.selected_vertex = Self::handle_at(&view, current, interaction.origin);
        self.rubber_band = None;
    }

    fn on_drag_move(&mut self, ctx: &mut ToolContext<'_>, interaction: &Interaction) {
        let d = interaction.destination - interaction.origin;
        match self.selected_vertex.as_mut() {
            Some(vertex) => {
                let moved = vertex.original + d;
                if ctx.adjust(vertex.object, vertex.index, &ConstrainedPoint::free(moved), false) {
                    vertex.current = moved;
                }
                ctx.redraw(RenderQuality::Fast);
            }
            None => {
                self.rubber_band = (d.hypot() > PREVIEW_THRESHOLD).then_some((interaction.origin, interaction.destination));
            }
        }
    }

    fn on_drop(&mut self, ctx: &mut ToolContext<'_>, interaction: &Interaction) {
        self.rubber_band = None;
        let d = interaction.destination - interaction.origin;
        match self.selected_vertex.take() {
            Some(vertex) => {
                ctx.adjust(vertex.object, vertex.index, &ConstrainedPoint::free(vertex.original + d), true);
                ctx.register_history();
                ctx.redraw(RenderQuality::Full);
            }
            None => {
                let area = Area::rectangle(interaction.origin, interaction.destination, &self.active_pattern);
                let id = ctx.add_object(MapObject::Area(area));
                ctx.select(&[id]);
            }
        }
    }

    fn on_delete_key(&mut self, ctx: &mut ToolContext<'_>) {
        let Some(vertex) = self.selected_vertex.take() else {
            return;
        };
        let removed = ctx
            .scene
            .get_mut(vertex.object)
            .and_then(MapObject::as_area_mut)
            .is_some_and(|area| area.remove_vertex(vertex.index));
        if removed {
            ctx.register_history();
            ctx.redraw(RenderQuality::Full);
        }
    }

    fn overlay(&self, view: &SceneView<'_>) -> Vec<Primitive> {
        let mut overlay: Vec<Primitive> = selected_area(view.scene().selection(), view)
            .and_then(|id| view.scene().get(id))
            .map(|area| area.adjustment_points(view, HandleMode::Separate))
            .unwrap_or_default()
            .into_iter()
            .map(|pt| {
                if self.selected_vertex.is_some_and(|v| v.index == pt.index) {
                    Primitive::circle(pt.original, HANDLE_RADIUS, SELECTED_HANDLE_WIDTH, SELECTION_COLOR)
                } else {
                    Primitive::circle(pt.original, HANDLE_RADIUS, HANDLE_WIDTH, HANDLE_COLOR)
                }
            })
            .collect();

        if let Some((a, b)) = self.rubber_band {
            let width = view
                .registry()
                .pattern(&self.active_pattern)
                .and_then(|p| p.line_width)
                .unwrap_or(RUBBER_BAND_WIDTH);
            let style = DrawStyle {
                privileged: true,
                light_mode: view.scene().is_light_mode(),
            };
            overlay.push(Primitive::rect(a, b, width, style.object_color()));
        }
        overlay
    }
}
