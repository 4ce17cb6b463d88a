//! Gesture recognition for pointer events.
//!
//! Raw press/move/release events are turned into the gesture vocabulary the
//! tools understand: hover, click, double-click and drag start/move/drop.

use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// Use web_time for WASM compatibility
#[cfg(target_arch = "wasm32")]
use web_time::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// Screen distance the pointer must travel before a press becomes a drag.
pub const DRAG_THRESHOLD: f64 = 3.0;
/// Screen distance between two presses that still counts as a double-click.
pub const DOUBLE_CLICK_DISTANCE: f64 = 3.0;
/// Time after a release during which the next release can be a double-click.
pub const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(250);

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// State of one press-to-release interaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interaction {
    /// Press position in screen pixels.
    pub screen_origin: Point,
    /// Press position in world coordinates.
    pub origin: Point,
    /// Latest pointer position in world coordinates.
    pub destination: Point,
    pub modifiers: Modifiers,
    pub is_dragging: bool,
}

/// A recognized gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Pointer moved without dragging. Rounded to whole world units.
    Hover(Point),
    DragStart(Interaction),
    DragMove(Interaction),
    Drop(Interaction),
    Click(Interaction),
    DoubleClick(Interaction),
    /// Pointer left the canvas, abandoning any interaction in progress.
    PointerOut(Option<Interaction>),
}

/// Turns raw pointer events into gestures.
#[derive(Debug, Clone, Default)]
pub struct GestureTracker {
    current: Option<Interaction>,
    /// Screen origin and time of the last click or drop.
    last_release: Option<(Point, Instant)>,
}

impl GestureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a press is in progress.
    pub fn is_pressed(&self) -> bool {
        self.current.is_some()
    }

    /// Whether the press in progress has become a drag.
    pub fn is_dragging(&self) -> bool {
        self.current.is_some_and(|i| i.is_dragging)
    }

    /// Primary button pressed.
    pub fn pointer_down(&mut self, screen: Point, world: Point, modifiers: Modifiers) {
        self.current = Some(Interaction {
            screen_origin: screen,
            origin: world,
            destination: world,
            modifiers,
            is_dragging: false,
        });
    }

    /// Pointer moved.
    pub fn pointer_move(&mut self, screen: Point, world: Point, modifiers: Modifiers) -> Vec<Gesture> {
        let mut gestures = Vec::new();
        if let Some(interaction) = self.current.as_mut() {
            interaction.destination = world;
            interaction.modifiers = modifiers;
            if interaction.is_dragging {
                gestures.push(Gesture::DragMove(*interaction));
            } else if (screen - interaction.screen_origin).hypot() > DRAG_THRESHOLD {
                interaction.is_dragging = true;
                gestures.push(Gesture::DragStart(*interaction));
            }
        }
        if !self.is_dragging() {
            gestures.push(Gesture::Hover(Point::new(world.x.round(), world.y.round())));
        }
        gestures
    }

    /// Primary button released.
    pub fn pointer_up(&mut self, world: Point, modifiers: Modifiers) -> Option<Gesture> {
        self.pointer_up_at(world, modifiers, Instant::now())
    }

    /// [`Self::pointer_up`] with an explicit timestamp.
    pub fn pointer_up_at(&mut self, world: Point, modifiers: Modifiers, now: Instant) -> Option<Gesture> {
        let mut interaction = self.current.take()?;
        interaction.destination = world;
        interaction.modifiers = modifiers;

        if let Some((origin, at)) = self.last_release.take() {
            let recent = now.saturating_duration_since(at) <= DOUBLE_CLICK_WINDOW;
            if recent && (interaction.screen_origin - origin).hypot() <= DOUBLE_CLICK_DISTANCE {
                return Some(Gesture::DoubleClick(interaction));
            }
        }

        self.last_release = Some((interaction.screen_origin, now));
        Some(if interaction.is_dragging {
            Gesture::Drop(interaction)
        } else {
            Gesture::Click(interaction)
        })
    }

    /// Pointer left the canvas.
    pub fn pointer_out(&mut self) -> Gesture {
        Gesture::PointerOut(self.current.take())
    }
}
