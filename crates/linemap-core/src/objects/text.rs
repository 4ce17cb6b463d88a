//! Text label object.

use super::{MapObjectTrait, ObjectId, visibility_alpha};
use crate::adjust::{AdjustOptions, AdjustmentPoint, HandleMode};
use crate::constraint::{ConstrainedPoint, PointKind};
use crate::error::ConstraintError;
use crate::geometry::{box_contains, box_from_corners, boxes_intersect};
use crate::render::{DrawLayers, DrawStyle, FontSpec, Primitive};
use crate::scene::SceneView;
use kurbo::{Affine, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f64::consts::FRAC_PI_2;
use std::sync::RwLock;
use uuid::Uuid;

const HIDDEN_ALPHA: f64 = 0.4;

/// Font weight and slant of a label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextStyle {
    #[default]
    Normal,
    Bold,
    Italic,
    BoldItalic,
}

impl TextStyle {
    pub fn is_bold(self) -> bool {
        matches!(self, TextStyle::Bold | TextStyle::BoldItalic)
    }

    pub fn is_italic(self) -> bool {
        matches!(self, TextStyle::Italic | TextStyle::BoldItalic)
    }

    fn from_flags(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (false, false) => TextStyle::Normal,
            (true, false) => TextStyle::Bold,
            (false, true) => TextStyle::Italic,
            (true, true) => TextStyle::BoldItalic,
        }
    }

    pub fn toggle_bold(self) -> Self {
        Self::from_flags(!self.is_bold(), self.is_italic())
    }

    pub fn toggle_italic(self) -> Self {
        Self::from_flags(self.is_bold(), !self.is_italic())
    }
}

/// A label anchored to a constrained point.
///
/// `offset` is expressed in the anchor's local frame: it is rotated by the
/// label's orientation before being added to the anchor.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Text {
    pub(crate) id: ObjectId,
    pub is_revealed: bool,
    #[serde(skip)]
    pub(crate) is_selected: bool,
    pub point: ConstrainedPoint,
    pub offset: Vec2,
    pub text: String,
    #[serde(default)]
    pub style: TextStyle,
    /// Laid-out size reported by the renderer.
    #[serde(skip)]
    cached_size: RwLock<Option<(f64, f64)>>,
}

impl Clone for Text {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            is_revealed: self.is_revealed,
            is_selected: self.is_selected,
            point: self.point.clone(),
            offset: self.offset,
            text: self.text.clone(),
            style: self.style,
            cached_size: RwLock::new(self.cached_size.read().ok().and_then(|guard| *guard)),
        }
    }
}

impl Text {
    pub const FONT_FAMILY: &'static str = "Noticia Text";
    pub const FONT_SIZE: f64 = 36.0;
    /// Approximate glyph advance relative to the font size.
    const CHAR_WIDTH_FACTOR: f64 = 0.55;
    const LINE_HEIGHT_FACTOR: f64 = 1.2;

    /// Create a new revealed label.
    pub fn new(point: ConstrainedPoint, offset: Vec2, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            is_revealed: true,
            is_selected: false,
            point,
            offset,
            text: text.into(),
            style: TextStyle::Normal,
            cached_size: RwLock::new(None),
        }
    }

    pub fn with_style(mut self, style: TextStyle) -> Self {
        self.style = style;
        self
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.invalidate_cache();
    }

    pub fn set_style(&mut self, style: TextStyle) {
        self.style = style;
        self.invalidate_cache();
    }

    pub fn font(&self, style: TextStyle) -> FontSpec {
        FontSpec {
            family: Self::FONT_FAMILY,
            size: Self::FONT_SIZE,
            bold: style.is_bold(),
            italic: style.is_italic(),
        }
    }

    /// Set the cached layout size (computed by the renderer).
    /// Uses interior mutability so this can be called during rendering.
    pub fn set_cached_size(&self, width: f64, height: f64) {
        if let Ok(mut cache) = self.cached_size.write() {
            *cache = Some((width, height));
        }
    }

    /// Clear the cached size (call when text properties change).
    pub fn invalidate_cache(&self) {
        if let Ok(mut cache) = self.cached_size.write() {
            *cache = None;
        }
    }

    /// Rendered width and height, approximated until the renderer reports
    /// the real layout.
    pub fn size(&self) -> (f64, f64) {
        self.cached_size
            .read()
            .ok()
            .and_then(|guard| *guard)
            .unwrap_or_else(|| Self::measure(&self.text))
    }

    /// Approximate laid-out size of `content` in the label font.
    pub fn measure(content: &str) -> (f64, f64) {
        let lines = content.lines().count().max(1);
        let longest = content.lines().map(|l| l.chars().count()).max().unwrap_or(0);
        (
            longest as f64 * Self::FONT_SIZE * Self::CHAR_WIDTH_FACTOR,
            lines as f64 * Self::FONT_SIZE * Self::LINE_HEIGHT_FACTOR,
        )
    }

    /// Resolved anchor position.
    pub fn anchor(&self, view: &SceneView<'_>) -> Point {
        view.resolve(&self.point, PointKind::Point)
    }

    /// Orientation of the source at the anchor, flipped by half a turn when
    /// the label would otherwise read upside down.
    pub fn orientation(&self, view: &SceneView<'_>) -> f64 {
        let orientation = self
            .point
            .binding()
            .map(|b| view.parametric_orientation(b.source, b.t))
            .unwrap_or(0.0);
        if orientation.abs() > FRAC_PI_2 {
            orientation + std::f64::consts::PI
        } else {
            orientation
        }
    }

    /// Map from label-local coordinates to anchor-relative world coordinates.
    fn transform(&self, view: &SceneView<'_>) -> Affine {
        Affine::rotate(self.orientation(view)) * Affine::translate(self.offset)
    }

    /// `offset` rotated into world space.
    pub fn visual_offset(&self, view: &SceneView<'_>) -> Vec2 {
        (self.transform(view) * Point::ORIGIN).to_vec2()
    }

    /// Label center.
    pub fn center(&self, view: &SceneView<'_>) -> Point {
        self.anchor(view) + self.visual_offset(view)
    }

    /// Offset that puts the label just outside the object it is bound to.
    pub fn initial_offset(view: &SceneView<'_>, point: &ConstrainedPoint, content: &str) -> Vec2 {
        match point.source() {
            Some(source) => {
                let (_, height) = Self::measure(content);
                Vec2::new(0.0, -(view.text_ascent(source) + height / 2.0))
            }
            None => Vec2::ZERO,
        }
    }

    fn local_offset_to(&self, view: &SceneView<'_>, point: &ConstrainedPoint) -> Vec2 {
        let visual = view.resolve(point, PointKind::Point) - self.anchor(view);
        (Affine::rotate(-self.orientation(view)) * visual.to_point()).to_vec2()
    }
}

impl MapObjectTrait for Text {
    fn id(&self) -> ObjectId {
        self.id
    }

    fn is_revealed(&self) -> bool {
        self.is_revealed
    }

    fn set_revealed(&mut self, revealed: bool) {
        self.is_revealed = revealed;
    }

    fn is_selected(&self) -> bool {
        self.is_selected
    }

    fn set_selected(&mut self, selected: bool) {
        self.is_selected = selected;
    }

    fn sources(&self) -> Vec<ObjectId> {
        self.point.source().into_iter().collect()
    }

    fn draw(&self, view: &SceneView<'_>, style: &DrawStyle, layers: &mut DrawLayers) {
        if !style.is_visible(self.is_revealed) {
            return;
        }
        layers.symbols.push(Primitive::Label {
            text: self.text.clone(),
            font: self.font(self.style),
            center: self.center(view),
            rotation: self.orientation(view),
            color: style.current_color(self.is_selected),
            alpha: visibility_alpha(self.is_revealed, HIDDEN_ALPHA),
        });
    }

    /// Tests in the label's own rotated frame.
    fn hit_test(&self, view: &SceneView<'_>, point: Point, corner: Option<Point>) -> bool {
        let (w, h) = self.size();
        let label = Rect::new(-w / 2.0, -h / 2.0, w / 2.0, h / 2.0);
        let inverse = self.transform(view).inverse();
        let anchor = self.anchor(view).to_vec2();
        let local = |p: Point| inverse * (p - anchor);
        match corner {
            Some(corner) => boxes_intersect(box_from_corners(local(point), local(corner)), label),
            None => box_contains(label, local(point)),
        }
    }

    fn adjustment_points(&self, view: &SceneView<'_>, mode: HandleMode) -> Vec<AdjustmentPoint> {
        let anchor = self.anchor(view);
        let offset = self.visual_offset(view);
        let bound = self.point.is_bound();
        match mode {
            HandleMode::Combined => {
                let at = if bound { anchor + offset } else { anchor };
                vec![AdjustmentPoint::new(self.id, 2, at, PointKind::Point, bound)]
            }
            HandleMode::Separate => {
                let mut handles = vec![AdjustmentPoint::new(self.id, 0, anchor, PointKind::Point, bound)];
                if offset.hypot2() > 0.0 {
                    handles.push(AdjustmentPoint::new(
                        self.id,
                        1,
                        anchor + offset,
                        PointKind::Point,
                        bound,
                    ));
                }
                handles
            }
        }
    }

    /// Slot 0 moves the anchor, slot 1 the offset handle, slot 2 whichever of
    /// the two the combined handle stands for.
    fn set_adjustment_point(
        &mut self,
        view: &SceneView<'_>,
        index: usize,
        point: &ConstrainedPoint,
        options: AdjustOptions,
    ) -> Result<(), ConstraintError> {
        let owner = self.id;
        match index {
            0 => {
                if options.is_final {
                    match point.source() {
                        None => self.offset = Vec2::ZERO,
                        Some(source) if self.offset.hypot2() == 0.0 => {
                            let (_, height) = self.size();
                            self.offset = Vec2::new(0.0, -(view.text_ascent(source) + height / 2.0));
                        }
                        Some(_) => {}
                    }
                }
                self.point.set_from(point, owner, view)
            }
            1 => {
                self.offset = self.local_offset_to(view, point);
                Ok(())
            }
            _ => {
                if options.linked && self.point.is_bound() {
                    self.offset = self.local_offset_to(view, point);
                    Ok(())
                } else {
                    self.offset = Vec2::ZERO;
                    self.point.set_from(point, owner, view)
                }
            }
        }
    }

    fn parametric_point(&self, view: &SceneView<'_>, _t: f64, _kind: PointKind) -> Point {
        self.anchor(view)
    }

    fn retain_known_sources(&mut self, known: &HashSet<ObjectId>) {
        self.point.retain_known(known);
    }
}
