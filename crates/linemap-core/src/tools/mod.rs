//! Tool system for the map editor.
//!
//! Each tool is a small state machine driven by the gestures produced in
//! [`crate::input`]. Handlers receive a [`ToolContext`] giving them the scene
//! and configuration, and record their side effects (redraw, history, user
//! notifications, text prompts) in [`Effects`] for the editor to carry out.

mod adjust;
mod draw_area;
mod draw_icon;
mod draw_line;
mod draw_text;
mod select;

pub use adjust::AdjustTool;
pub use draw_area::DrawAreaTool;
pub use draw_icon::{DrawIconTool, IconFamily};
pub use draw_line::DrawLineTool;
pub use draw_text::DrawTextTool;
pub use select::SelectTool;

use crate::adjust::AdjustOptions;
use crate::constraint::ConstrainedPoint;
use crate::error::ConstraintError;
use crate::input::Interaction;
use crate::objects::{MapObject, ObjectId};
use crate::registry::{EditorSettings, Registry};
use crate::render::{Primitive, RenderQuality};
use crate::scene::{Scene, SceneView};
use crate::snap::{SnapKind, SnapPoint, find_snap};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Pointer travel in world units before a marquee or rubber band is shown.
pub(crate) const PREVIEW_THRESHOLD: f64 = 3.0;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ToolKind {
    #[default]
    Select,
    Adjust,
    DrawLine,
    DrawSymbol,
    DrawWaypoint,
    DrawArea,
    DrawText,
}

/// Tool-specific keyboard shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ToolHotkey {
    Reveal,
    Hide,
    Reverse,
    Bold,
    Italic,
}

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// A message for the host to show to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Side effects requested by a tool handler.
#[derive(Debug, Default)]
pub struct Effects {
    /// Highest redraw quality requested.
    pub redraw: Option<RenderQuality>,
    /// A committed mutation should be persisted and snapshotted.
    pub history: bool,
    pub notifications: Vec<Notification>,
    /// Text prompt to open, with its initial content.
    pub prompt: Option<String>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a redraw. A full redraw wins over a fast one.
    pub fn request_redraw(&mut self, quality: RenderQuality) {
        self.redraw = Some(self.redraw.map_or(quality, |q| q.max(quality)));
    }
}

/// Everything a tool handler may read or change.
pub struct ToolContext<'a> {
    pub scene: &'a mut Scene,
    pub registry: &'a Registry,
    pub settings: &'a EditorSettings,
    pub effects: &'a mut Effects,
}

impl<'a> ToolContext<'a> {
    pub fn new(
        scene: &'a mut Scene,
        registry: &'a Registry,
        settings: &'a EditorSettings,
        effects: &'a mut Effects,
    ) -> Self {
        Self {
            scene,
            registry,
            settings,
            effects,
        }
    }

    pub fn view(&self) -> SceneView<'_> {
        SceneView::new(self.scene, self.registry)
    }

    /// Best snap target for `cursor` among `kinds`.
    pub fn snap(&self, cursor: Point, kinds: &[SnapKind], exclude: &[ObjectId]) -> Option<SnapPoint> {
        find_snap(&self.view(), cursor, kinds, exclude)
    }

    /// Ask object `id` to move slot `index` to `request`.
    ///
    /// Returns whether the object took the request. A cyclic binding is taken
    /// as a free point, so it counts as accepted; committed ones also warn
    /// the user.
    pub fn adjust(&mut self, id: ObjectId, index: usize, request: &ConstrainedPoint, is_final: bool) -> bool {
        let options = AdjustOptions {
            is_final,
            linked: self.settings.adjust_linked,
        };
        match self.scene.set_adjustment_point(self.registry, id, index, request, options) {
            Ok(()) => true,
            Err(err @ ConstraintError::Cycle { .. }) => {
                if is_final {
                    log::warn!("{}", err);
                    self.warn("Cannot attach an object to something that depends on it");
                } else {
                    log::debug!("{}", err);
                }
                true
            }
            Err(err) => {
                log::debug!("Adjustment refused: {}", err);
                false
            }
        }
    }

    /// Add a freshly drawn object, honoring the reveal-new-objects setting.
    pub fn add_object(&mut self, mut object: MapObject) -> ObjectId {
        object.set_revealed(self.settings.reveal_new_objects);
        let id = self.scene.add(object);
        log::debug!("Added object {}", id);
        self.register_history();
        self.redraw(RenderQuality::Full);
        id
    }

    /// Remove objects and record the change.
    pub fn delete_objects(&mut self, ids: &[ObjectId]) {
        let mut removed = false;
        for &id in ids {
            removed |= self.scene.remove(id).is_some();
        }
        if removed {
            log::debug!("Deleted {} object(s)", ids.len());
            self.register_history();
            self.redraw(RenderQuality::Full);
        }
    }

    /// Replace the selection.
    pub fn select(&mut self, ids: &[ObjectId]) {
        self.scene.set_selection(ids);
        self.redraw(RenderQuality::Full);
    }

    /// Toggle bold (or italic) on every selected text.
    pub fn toggle_text_style(&mut self, bold: bool) {
        let mut changed = false;
        for id in self.scene.selection() {
            if let Some(text) = self.scene.get_mut(id).and_then(MapObject::as_text_mut) {
                let style = if bold {
                    text.style.toggle_bold()
                } else {
                    text.style.toggle_italic()
                };
                text.set_style(style);
                changed = true;
            }
        }
        if changed {
            self.register_history();
            self.redraw(RenderQuality::Full);
        }
    }

    pub fn register_history(&mut self) {
        self.effects.history = true;
    }

    pub fn redraw(&mut self, quality: RenderQuality) {
        self.effects.request_redraw(quality);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.effects.notifications.push(Notification {
            level: NotificationLevel::Warning,
            message: message.into(),
        });
    }

    /// Open the text prompt. The answer arrives in [`Tool::prompt_resolved`].
    pub fn request_prompt(&mut self, initial: impl Into<String>) {
        self.effects.prompt = Some(initial.into());
    }
}

/// A pointer tool.
///
/// Every handler defaults to doing nothing; tools override the gestures they
/// react to.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// The tool became active.
    fn activate(&mut self, _ctx: &mut ToolContext<'_>) {}

    /// The tool is being switched away from.
    fn deactivate(&mut self, _ctx: &mut ToolContext<'_>) {}

    /// The scene was replaced under the tool (undo, remote update).
    fn state_invalidated(&mut self, _ctx: &mut ToolContext<'_>) {}

    fn on_hover(&mut self, _ctx: &mut ToolContext<'_>, _point: Point) {}

    /// The pointer left the canvas; any gesture in progress is abandoned.
    fn on_pointer_out(&mut self, _ctx: &mut ToolContext<'_>) {}

    fn on_click(&mut self, _ctx: &mut ToolContext<'_>, _interaction: &Interaction) {}

    fn on_double_click(&mut self, _ctx: &mut ToolContext<'_>, _interaction: &Interaction) {}

    fn on_drag_start(&mut self, _ctx: &mut ToolContext<'_>, _interaction: &Interaction) {}

    fn on_drag_move(&mut self, _ctx: &mut ToolContext<'_>, _interaction: &Interaction) {}

    fn on_drop(&mut self, _ctx: &mut ToolContext<'_>, _interaction: &Interaction) {}

    fn on_delete_key(&mut self, _ctx: &mut ToolContext<'_>) {}

    fn hotkey_pressed(&mut self, _ctx: &mut ToolContext<'_>, _key: ToolHotkey) {}

    /// Answer to a prompt this tool requested. `None` means cancelled.
    fn prompt_resolved(&mut self, _ctx: &mut ToolContext<'_>, _answer: Option<&str>) {}

    /// Indicators drawn on top of the scene.
    fn overlay(&self, _view: &SceneView<'_>) -> Vec<Primitive> {
        Vec::new()
    }
}

/// Owns one instance of every tool and tracks the active one.
#[derive(Debug)]
pub struct ToolManager {
    active: ToolKind,
    select: SelectTool,
    adjust: AdjustTool,
    draw_line: DrawLineTool,
    draw_symbol: DrawIconTool,
    draw_waypoint: DrawIconTool,
    draw_area: DrawAreaTool,
    draw_text: DrawTextTool,
}

impl ToolManager {
    /// Create the tools with the registry's default styles active.
    pub fn new(registry: &Registry) -> Self {
        Self {
            active: ToolKind::default(),
            select: SelectTool::new(),
            adjust: AdjustTool::new(),
            draw_line: DrawLineTool::new(registry.default_line_style()),
            draw_symbol: DrawIconTool::new(IconFamily::Symbol, registry.default_symbol()),
            draw_waypoint: DrawIconTool::new(IconFamily::Waypoint, registry.default_waypoint()),
            draw_area: DrawAreaTool::new(registry.default_pattern()),
            draw_text: DrawTextTool::new(),
        }
    }

    pub fn active_kind(&self) -> ToolKind {
        self.active
    }

    /// Make `kind` the active tool. Activation hooks are the caller's job.
    pub fn set_active(&mut self, kind: ToolKind) {
        self.active = kind;
    }

    pub fn active(&self) -> &dyn Tool {
        self.tool(self.active)
    }

    pub fn active_mut(&mut self) -> &mut dyn Tool {
        self.tool_mut(self.active)
    }

    pub fn tool(&self, kind: ToolKind) -> &dyn Tool {
        match kind {
            ToolKind::Select => &self.select,
            ToolKind::Adjust => &self.adjust,
            ToolKind::DrawLine => &self.draw_line,
            ToolKind::DrawSymbol => &self.draw_symbol,
            ToolKind::DrawWaypoint => &self.draw_waypoint,
            ToolKind::DrawArea => &self.draw_area,
            ToolKind::DrawText => &self.draw_text,
        }
    }

    pub fn tool_mut(&mut self, kind: ToolKind) -> &mut dyn Tool {
        match kind {
            ToolKind::Select => &mut self.select,
            ToolKind::Adjust => &mut self.adjust,
            ToolKind::DrawLine => &mut self.draw_line,
            ToolKind::DrawSymbol => &mut self.draw_symbol,
            ToolKind::DrawWaypoint => &mut self.draw_waypoint,
            ToolKind::DrawArea => &mut self.draw_area,
            ToolKind::DrawText => &mut self.draw_text,
        }
    }

    pub fn draw_line_mut(&mut self) -> &mut DrawLineTool {
        &mut self.draw_line
    }

    pub fn draw_area_mut(&mut self) -> &mut DrawAreaTool {
        &mut self.draw_area
    }

    /// The icon tool for `family`.
    pub fn draw_icon_mut(&mut self, family: IconFamily) -> &mut DrawIconTool {
        match family {
            IconFamily::Symbol => &mut self.draw_symbol,
            IconFamily::Waypoint => &mut self.draw_waypoint,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::input::Modifiers;

    /// Scene plus configuration for driving tools directly.
    pub struct Harness {
        pub scene: Scene,
        pub registry: Registry,
        pub settings: EditorSettings,
        pub effects: Effects,
    }

    impl Harness {
        pub fn new() -> Self {
            Self {
                scene: Scene::new(),
                registry: Registry::default(),
                settings: EditorSettings::default(),
                effects: Effects::new(),
            }
        }

        /// Run `f` with a fresh context, returning the effects it produced.
        pub fn with<R>(&mut self, f: impl FnOnce(&mut ToolContext<'_>) -> R) -> R {
            self.effects = Effects::new();
            let mut ctx = ToolContext::new(&mut self.scene, &self.registry, &self.settings, &mut self.effects);
            f(&mut ctx)
        }

        pub fn view(&self) -> SceneView<'_> {
            SceneView::new(&self.scene, &self.registry)
        }
    }

    pub fn interaction(origin: (f64, f64), destination: (f64, f64)) -> Interaction {
        Interaction {
            screen_origin: Point::new(origin.0, origin.1),
            origin: Point::new(origin.0, origin.1),
            destination: Point::new(destination.0, destination.1),
            modifiers: Modifiers::default(),
            is_dragging: origin != destination,
        }
    }

    pub fn shifted(mut interaction: Interaction) -> Interaction {
        interaction.modifiers.shift = true;
        interaction
    }
}
