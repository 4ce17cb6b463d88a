//! Linemap Core Library
//!
//! Platform-agnostic object model, snapping, tools and undo for the line map
//! editor.

pub mod adjust;
pub mod constraint;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod history;
pub mod input;
pub mod objects;
pub mod registry;
pub mod render;
pub mod scene;
pub mod snap;
pub mod storage;
pub mod tools;

pub use adjust::{AdjustOptions, AdjustmentPoint, HandleMode};
pub use constraint::{ConstrainedPoint, PointKind};
pub use editor::Editor;
pub use error::{ConstraintError, RegistryError};
pub use history::History;
pub use input::{Gesture, GestureTracker, Interaction, Modifiers};
pub use objects::{Area, Line, MapObject, MapObjectTrait, ObjectId, Symbol, Text, TextStyle, Waypoint};
pub use registry::{EditorSettings, Registry};
pub use render::{DrawLayers, DrawStyle, Primitive, RenderQuality, Renderer};
pub use scene::{Scene, SceneData, SceneView};
pub use snap::{SnapKind, SnapPoint, find_snap};
pub use storage::{MemoryStorage, SaveQueue, Storage, StorageError, StorageResult, StoredScene};
pub use tools::{Notification, NotificationLevel, ToolHotkey, ToolKind};
