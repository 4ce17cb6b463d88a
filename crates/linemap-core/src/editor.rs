//! The editor: owns the scene and wires input, tools, history, persistence
//! and rendering together.

use crate::history::History;
use crate::input::{Gesture, GestureTracker, Modifiers};
use crate::objects::ObjectId;
use crate::registry::{EditorSettings, Registry};
use crate::render::{DrawStyle, Primitive, RenderQuality, Renderer};
use crate::scene::{Scene, SceneData, SceneView};
use crate::storage::{SCENE_KEY, SaveQueue, Storage, StorageResult, StoredScene};
use crate::tools::{
    Effects, IconFamily, Notification, NotificationLevel, Tool, ToolContext, ToolHotkey, ToolKind,
    ToolManager,
};
use kurbo::Point;
use std::sync::Arc;
use uuid::Uuid;

#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// A map editing session.
///
/// All handlers run synchronously; only [`Editor::flush`] and
/// [`Editor::load`] touch storage.
pub struct Editor {
    /// Stamped on everything this editor persists.
    id: Uuid,
    scene: Scene,
    registry: Registry,
    settings: EditorSettings,
    tools: ToolManager,
    history: History,
    input: GestureTracker,
    queue: SaveQueue,
    renderer: Box<dyn Renderer>,
    notifications: Vec<Notification>,
    /// Initial content of the open text prompt.
    pending_prompt: Option<String>,
}

impl Editor {
    pub fn new(
        registry: Registry,
        settings: EditorSettings,
        storage: Arc<dyn Storage>,
        renderer: Box<dyn Renderer>,
    ) -> Self {
        let tools = ToolManager::new(&registry);
        let mut history = History::new();
        history.reset(SceneData::default());
        Self {
            id: Uuid::new_v4(),
            scene: Scene::new(),
            registry,
            settings,
            tools,
            history,
            input: GestureTracker::new(),
            queue: SaveQueue::new(storage, SCENE_KEY),
            renderer,
            notifications: Vec::new(),
            pending_prompt: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn active_tool(&self) -> ToolKind {
        self.tools.active_kind()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Whether unsaved state is waiting for [`Editor::flush`].
    pub fn is_dirty(&self) -> bool {
        self.queue.is_dirty()
    }

    /// Initial content of the open text prompt, if one is open.
    pub fn pending_prompt(&self) -> Option<&str> {
        self.pending_prompt.as_deref()
    }

    /// Start editing: the current scene becomes the undo floor.
    pub fn activate(&mut self) {
        self.history.reset(self.scene.to_data());
        self.run_tool(|tool, ctx| tool.activate(ctx));
        self.redraw(RenderQuality::Full);
        log::info!("Editor {} active with {} objects", self.id, self.scene.len());
    }

    pub fn deactivate(&mut self) {
        self.cancel_prompt();
        self.run_tool(|tool, ctx| tool.deactivate(ctx));
    }

    /// Switch tools. The old tool is deactivated first.
    pub fn activate_tool(&mut self, kind: ToolKind) {
        self.cancel_prompt();
        self.input = GestureTracker::new();
        self.run_tool(|tool, ctx| tool.deactivate(ctx));
        self.tools.set_active(kind);
        self.run_tool(|tool, ctx| tool.activate(ctx));
        log::debug!("Activated {:?} tool", kind);
    }

    pub fn pointer_down(&mut self, screen: Point, world: Point, modifiers: Modifiers) {
        if self.pending_prompt.is_some() {
            return;
        }
        self.input.pointer_down(screen, world, modifiers);
    }

    pub fn pointer_move(&mut self, screen: Point, world: Point, modifiers: Modifiers) {
        if self.pending_prompt.is_some() {
            return;
        }
        for gesture in self.input.pointer_move(screen, world, modifiers) {
            self.dispatch(gesture);
        }
    }

    pub fn pointer_up(&mut self, world: Point, modifiers: Modifiers) {
        self.pointer_up_at(world, modifiers, Instant::now());
    }

    /// [`Editor::pointer_up`] with an explicit timestamp.
    pub fn pointer_up_at(&mut self, world: Point, modifiers: Modifiers, now: Instant) {
        if self.pending_prompt.is_some() {
            return;
        }
        if let Some(gesture) = self.input.pointer_up_at(world, modifiers, now) {
            self.dispatch(gesture);
        }
    }

    /// The pointer left the canvas. A drag in progress is abandoned and the
    /// scene goes back to its last committed state.
    pub fn pointer_out(&mut self) {
        let gesture = self.input.pointer_out();
        self.dispatch(gesture);
    }

    fn dispatch(&mut self, gesture: Gesture) {
        match gesture {
            Gesture::Hover(point) => self.run_tool(|tool, ctx| tool.on_hover(ctx, point)),
            Gesture::Click(i) => self.run_tool(|tool, ctx| tool.on_click(ctx, &i)),
            Gesture::DoubleClick(i) => self.run_tool(|tool, ctx| tool.on_double_click(ctx, &i)),
            Gesture::DragStart(i) => self.run_tool(|tool, ctx| tool.on_drag_start(ctx, &i)),
            Gesture::DragMove(i) => self.run_tool(|tool, ctx| tool.on_drag_move(ctx, &i)),
            Gesture::Drop(i) => self.run_tool(|tool, ctx| tool.on_drop(ctx, &i)),
            Gesture::PointerOut(interaction) => {
                self.run_tool(|tool, ctx| tool.on_pointer_out(ctx));
                if interaction.is_some_and(|i| i.is_dragging) {
                    log::debug!("Drag abandoned, restoring last committed state");
                    self.restore_current();
                    self.run_tool(|tool, ctx| tool.state_invalidated(ctx));
                    self.redraw(RenderQuality::Full);
                }
            }
        }
    }

    pub fn hotkey_pressed(&mut self, key: ToolHotkey) {
        if self.pending_prompt.is_some() {
            return;
        }
        self.run_tool(|tool, ctx| tool.hotkey_pressed(ctx, key));
    }

    pub fn on_delete_key(&mut self) {
        if self.pending_prompt.is_some() {
            return;
        }
        self.run_tool(|tool, ctx| tool.on_delete_key(ctx));
    }

    /// Step back one snapshot. Does nothing at the undo floor.
    pub fn undo(&mut self) -> bool {
        let selection = self.scene.selection();
        let Some(data) = self.history.undo().cloned() else {
            log::debug!("Nothing to undo");
            return false;
        };
        self.scene.apply_data(data);
        self.scene.set_selection(&selection);
        self.persist();
        self.run_tool(|tool, ctx| tool.state_invalidated(ctx));
        self.redraw(RenderQuality::Full);
        log::info!("Undo ({} snapshots left)", self.history.len());
        true
    }

    /// Deliver the answer to the open prompt. `None` cancels it.
    pub fn resolve_prompt(&mut self, answer: Option<&str>) {
        if self.pending_prompt.take().is_none() {
            log::warn!("Prompt answer with no prompt open");
            return;
        }
        self.run_tool(|tool, ctx| tool.prompt_resolved(ctx, answer));
    }

    fn cancel_prompt(&mut self) {
        if self.pending_prompt.is_some() {
            self.resolve_prompt(None);
        }
    }

    /// Accept a scene written by another editor. Our own writes are ignored.
    pub fn apply_remote(&mut self, stored: StoredScene) -> bool {
        if stored.origin == self.id {
            log::debug!("Ignoring remote update from this editor");
            return false;
        }
        let selection = self.scene.selection();
        self.scene.apply_data(stored.data);
        self.scene.set_selection(&selection);
        self.history.push(self.scene.to_data());
        self.run_tool(|tool, ctx| tool.state_invalidated(ctx));
        self.redraw(RenderQuality::Full);
        log::info!("Applied remote update from {}", stored.origin);
        true
    }

    /// Replace the scene with the stored one, if any. The loaded scene
    /// becomes the undo floor.
    pub async fn load(&mut self) -> StorageResult<bool> {
        let Some(stored) = self.queue.load().await? else {
            log::info!("No stored scene under '{}'", self.queue.key());
            return Ok(false);
        };
        self.scene.apply_data(stored.data);
        self.history.reset(self.scene.to_data());
        self.run_tool(|tool, ctx| tool.state_invalidated(ctx));
        self.redraw(RenderQuality::Full);
        Ok(true)
    }

    /// Write queued state to storage. Failures are also reported as a
    /// notification.
    pub async fn flush(&mut self) -> StorageResult<bool> {
        match self.queue.flush().await {
            Ok(saved) => Ok(saved),
            Err(err) => {
                self.notifications.push(Notification {
                    level: NotificationLevel::Error,
                    message: format!("Could not save the map: {}", err),
                });
                Err(err)
            }
        }
    }

    /// Flip linked adjustment. Returns the new setting.
    pub fn toggle_linked(&mut self) -> bool {
        self.settings.adjust_linked = !self.settings.adjust_linked;
        self.settings.adjust_linked
    }

    pub fn set_reveal_new_objects(&mut self, reveal: bool) {
        self.settings.reveal_new_objects = reveal;
    }

    pub fn set_light_mode(&mut self, light_mode: bool) {
        if self.scene.is_light_mode() != light_mode {
            self.scene.set_light_mode(light_mode);
            self.commit();
            self.redraw(RenderQuality::Full);
        }
    }

    pub fn set_symbol_scale(&mut self, scale: f64) {
        if scale > 0.0 && self.scene.symbol_scale() != scale {
            self.scene.set_symbol_scale(scale);
            self.commit();
            self.redraw(RenderQuality::Full);
        }
    }

    /// Remove every object.
    pub fn clear(&mut self) {
        if self.scene.is_empty() {
            return;
        }
        self.scene.clear();
        self.commit();
        self.run_tool(|tool, ctx| tool.state_invalidated(ctx));
        self.redraw(RenderQuality::Full);
    }

    pub fn set_line_style(&mut self, style: &str) {
        self.tools.draw_line_mut().set_active_style(style);
    }

    /// Set the pattern for new areas; a selected area is re-patterned.
    pub fn set_area_pattern(&mut self, pattern: &str) {
        let mut effects = Effects::new();
        let mut ctx = ToolContext::new(&mut self.scene, &self.registry, &self.settings, &mut effects);
        self.tools.draw_area_mut().set_active_pattern(&mut ctx, pattern);
        self.apply_effects(effects);
    }

    pub fn set_active_symbol(&mut self, family: IconFamily, symbol: &str) {
        self.tools.draw_icon_mut(family).set_active_symbol(symbol);
    }

    /// Notifications raised since the last call.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Indicators of the active tool.
    pub fn overlay(&self) -> Vec<Primitive> {
        self.tools.active().overlay(&SceneView::new(&self.scene, &self.registry))
    }

    /// Draw the whole scene, then the tool overlay.
    pub fn redraw(&mut self, quality: RenderQuality) {
        let style = DrawStyle {
            privileged: self.settings.privileged,
            light_mode: self.scene.is_light_mode(),
        };
        let layers = SceneView::new(&self.scene, &self.registry).draw(&style);
        self.renderer.render(&layers, quality);
        self.refresh_overlay();
    }

    fn refresh_overlay(&mut self) {
        let overlay = self.overlay();
        self.renderer.render_overlay(&overlay);
    }

    /// Selected object ids.
    pub fn selection(&self) -> Vec<ObjectId> {
        self.scene.selection()
    }

    fn run_tool(&mut self, f: impl FnOnce(&mut dyn Tool, &mut ToolContext<'_>)) {
        let mut effects = Effects::new();
        let mut ctx = ToolContext::new(&mut self.scene, &self.registry, &self.settings, &mut effects);
        f(self.tools.active_mut(), &mut ctx);
        self.apply_effects(effects);
    }

    fn apply_effects(&mut self, effects: Effects) {
        if effects.history {
            self.commit();
        }
        self.notifications.extend(effects.notifications);
        if let Some(initial) = effects.prompt {
            self.pending_prompt = Some(initial);
        }
        match effects.redraw {
            Some(quality) => self.redraw(quality),
            None => self.refresh_overlay(),
        }
    }

    /// Persist the live scene and push it as a new snapshot.
    fn commit(&mut self) {
        self.persist();
        self.history.push(self.scene.to_data());
    }

    fn persist(&mut self) {
        self.queue.enqueue(StoredScene::new(self.id, self.scene.to_data()));
    }

    /// Put the scene back to the newest snapshot, keeping the selection.
    fn restore_current(&mut self) {
        let Some(data) = self.history.current().cloned() else {
            return;
        };
        let selection = self.scene.selection();
        self.scene.apply_data(data);
        self.scene.set_selection(&selection);
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("id", &self.id)
            .field("objects", &self.scene.len())
            .field("tool", &self.tools.active_kind())
            .field("history", &self.history.len())
            .field("queue", &self.queue)
            .finish()
    }
}
