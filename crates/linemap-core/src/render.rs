//! Draw buckets and the renderer seam.
//!
//! Objects emit [`Primitive`]s into a [`DrawLayers`]; a [`Renderer`]
//! rasterizes them. Buckets composite areas, then lines, then symbols.
//! Footprints are a mask that knocks lines out underneath symbols.

use kurbo::{BezPath, Circle, Point, Rect, Shape as _};
use peniko::Color;

/// Highlight color for selected objects and handles.
pub const SELECTION_COLOR: Color = Color::from_rgba8(0xff, 0x98, 0x29, 0xff);
/// Color of snap crosses and marquee rectangles.
pub const INDICATOR_COLOR: Color = Color::from_rgba8(0x00, 0xff, 0xff, 0xff);
/// Color of unselected handles.
pub const HANDLE_COLOR: Color = Color::from_rgba8(0xff, 0xff, 0xff, 0xff);

/// Font description for text labels.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: &'static str,
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
}

/// A single drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Stroked path.
    Stroke {
        path: BezPath,
        width: f64,
        color: Color,
        alpha: f64,
    },
    /// Closed polygon filled with a repeating pattern texture.
    PatternFill {
        polygon: Vec<Point>,
        pattern: String,
        texture: Option<String>,
        alpha: f64,
    },
    /// Centered, tinted sprite.
    Sprite {
        asset: String,
        center: Point,
        rotation: f64,
        scale: f64,
        tint: Color,
        alpha: f64,
    },
    /// Centered text label.
    Label {
        text: String,
        font: FontSpec,
        center: Point,
        rotation: f64,
        color: Color,
        alpha: f64,
    },
}

impl Primitive {
    /// Stroked circle outline.
    pub fn circle(center: Point, radius: f64, width: f64, color: Color) -> Self {
        Primitive::Stroke {
            path: Circle::new(center, radius).to_path(0.1),
            width,
            color,
            alpha: 1.0,
        }
    }

    /// Stroked rectangle outline.
    pub fn rect(a: Point, b: Point, width: f64, color: Color) -> Self {
        Primitive::Stroke {
            path: Rect::from_points(a, b).to_path(0.1),
            width,
            color,
            alpha: 1.0,
        }
    }

    /// Diagonal cross marking a snap target.
    pub fn snap_cross(center: Point) -> Self {
        const SIZE: f64 = 20.0;
        let mut path = BezPath::new();
        path.move_to((center.x - SIZE, center.y - SIZE));
        path.line_to((center.x + SIZE, center.y + SIZE));
        path.move_to((center.x - SIZE, center.y + SIZE));
        path.line_to((center.x + SIZE, center.y - SIZE));
        Primitive::Stroke {
            path,
            width: 2.0,
            color: INDICATOR_COLOR,
            alpha: 1.0,
        }
    }
}

/// Externally composited draw buckets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawLayers {
    pub areas: Vec<Primitive>,
    pub lines: Vec<Primitive>,
    pub footprints: Vec<Primitive>,
    pub symbols: Vec<Primitive>,
}

impl DrawLayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
            && self.lines.is_empty()
            && self.footprints.is_empty()
            && self.symbols.is_empty()
    }

    /// All primitives in composite order, footprints excluded.
    pub fn composite(&self) -> impl Iterator<Item = &Primitive> {
        self.areas.iter().chain(self.lines.iter()).chain(self.symbols.iter())
    }
}

/// Redraw quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum RenderQuality {
    /// Live dragging: skip the footprint mask pass.
    Fast,
    /// Full composite with masking.
    #[default]
    Full,
}

/// Per-frame drawing parameters shared by all objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawStyle {
    /// Hidden objects are drawn faded instead of skipped.
    pub privileged: bool,
    pub light_mode: bool,
}

impl DrawStyle {
    /// Base object color: white on light maps, black otherwise.
    pub fn object_color(&self) -> Color {
        if self.light_mode {
            Color::from_rgba8(0xff, 0xff, 0xff, 0xff)
        } else {
            Color::from_rgba8(0x00, 0x00, 0x00, 0xff)
        }
    }

    /// Selection color for selected objects, object color otherwise.
    pub fn current_color(&self, is_selected: bool) -> Color {
        if is_selected {
            SELECTION_COLOR
        } else {
            self.object_color()
        }
    }

    pub fn is_visible(&self, is_revealed: bool) -> bool {
        is_revealed || self.privileged
    }
}

/// Rasterizes draw buckets. Implemented by the host.
pub trait Renderer {
    /// Draw a full frame of scene objects.
    fn render(&mut self, layers: &DrawLayers, quality: RenderQuality);

    /// Draw the active tool's indicators on top of the scene.
    fn render_overlay(&mut self, _overlay: &[Primitive]) {}
}

/// Renderer that discards everything.
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _layers: &DrawLayers, _quality: RenderQuality) {}
}
