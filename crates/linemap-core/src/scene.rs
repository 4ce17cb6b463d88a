//! Scene state: the object arena, its persisted form and read-only views.

use crate::adjust::AdjustOptions;
use crate::constraint::{ConstrainedPoint, PointKind};
use crate::error::ConstraintError;
use crate::objects::{MIN_AREA_VERTICES, MapObject, ObjectId};
use crate::registry::Registry;
use crate::render::{DrawLayers, DrawStyle};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Deepest chain of bindings followed when resolving a point.
const MAX_RESOLVE_DEPTH: usize = 32;

fn default_symbol_scale() -> f64 {
    1.0
}

/// Persisted scene: objects in draw order plus display settings.
///
/// This is the unit that is saved, loaded and snapshotted for undo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneData {
    #[serde(default)]
    pub objects: Vec<MapObject>,
    #[serde(default)]
    pub is_light_mode: bool,
    #[serde(default = "default_symbol_scale")]
    pub symbol_scale: f64,
}

impl Default for SceneData {
    fn default() -> Self {
        Self {
            objects: Vec::new(),
            is_light_mode: false,
            symbol_scale: default_symbol_scale(),
        }
    }
}

/// The live object collection.
///
/// Objects are owned by id; bindings between them are id references resolved
/// through this arena.
#[derive(Debug, Clone)]
pub struct Scene {
    objects: HashMap<ObjectId, MapObject>,
    /// Ids back to front.
    draw_order: Vec<ObjectId>,
    is_light_mode: bool,
    symbol_scale: f64,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
            draw_order: Vec::new(),
            is_light_mode: false,
            symbol_scale: default_symbol_scale(),
        }
    }

    /// Add an object on top of the draw order.
    pub fn add(&mut self, object: MapObject) -> ObjectId {
        let id = object.id();
        if self.objects.insert(id, object).is_none() {
            self.draw_order.push(id);
        }
        id
    }

    /// Remove an object. Points bound to it keep their last coordinate.
    pub fn remove(&mut self, id: ObjectId) -> Option<MapObject> {
        let removed = self.objects.remove(&id)?;
        self.draw_order.retain(|&other| other != id);
        let known: HashSet<ObjectId> = self.objects.keys().copied().collect();
        for object in self.objects.values_mut() {
            if object.sources().contains(&id) {
                object.retain_known_sources(&known);
            }
        }
        Some(removed)
    }

    /// Remove every object.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.draw_order.clear();
    }

    pub fn get(&self, id: ObjectId) -> Option<&MapObject> {
        self.objects.get(&id)
    }

    /// Direct mutable access, for edits that do not touch bindings.
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut MapObject> {
        self.objects.get_mut(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Objects back to front.
    pub fn objects(&self) -> impl Iterator<Item = &MapObject> {
        self.draw_order.iter().filter_map(|id| self.objects.get(id))
    }

    pub fn ids(&self) -> &[ObjectId] {
        &self.draw_order
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Selected object ids in draw order.
    pub fn selection(&self) -> Vec<ObjectId> {
        self.objects()
            .filter(|obj| obj.is_selected())
            .map(MapObject::id)
            .collect()
    }

    /// Select exactly `ids`. Unknown ids are ignored.
    pub fn set_selection(&mut self, ids: &[ObjectId]) {
        for (id, object) in self.objects.iter_mut() {
            object.set_selected(ids.contains(id));
        }
    }

    pub fn is_light_mode(&self) -> bool {
        self.is_light_mode
    }

    pub fn set_light_mode(&mut self, light_mode: bool) {
        self.is_light_mode = light_mode;
    }

    pub fn symbol_scale(&self) -> f64 {
        self.symbol_scale
    }

    pub fn set_symbol_scale(&mut self, scale: f64) {
        self.symbol_scale = scale;
    }

    /// Whether any binding reachable from `from` points at `target`.
    ///
    /// Walks the binding graph explicitly and never revisits an object, so
    /// cyclic data cannot hang it.
    pub fn has_constraint_to(&self, from: ObjectId, target: ObjectId) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(object) = self.objects.get(&id) else {
                continue;
            };
            for source in object.sources() {
                if source == target {
                    return true;
                }
                stack.push(source);
            }
        }
        false
    }

    /// Move one adjustment slot of an object through its own rules.
    ///
    /// The object is only updated when it accepted the request; a cycle still
    /// counts as accepted (the point became free).
    pub fn set_adjustment_point(
        &mut self,
        registry: &Registry,
        id: ObjectId,
        index: usize,
        request: &ConstrainedPoint,
        options: AdjustOptions,
    ) -> Result<(), ConstraintError> {
        let Some(mut updated) = self.objects.get(&id).cloned() else {
            return Err(ConstraintError::UnknownObject(id));
        };
        let result = {
            let view = SceneView::new(self, registry);
            updated.set_adjustment_point(&view, index, request, options)
        };
        match &result {
            Err(ConstraintError::InvalidSource { .. }) | Err(ConstraintError::Unattached { .. }) => {
                log::debug!("Object {} refused adjustment of slot {}", id, index);
            }
            _ => {
                self.objects.insert(id, updated);
            }
        }
        result
    }

    /// Snapshot of the persisted state.
    pub fn to_data(&self) -> SceneData {
        SceneData {
            objects: self.objects().cloned().collect(),
            is_light_mode: self.is_light_mode,
            symbol_scale: self.symbol_scale,
        }
    }

    /// Build a scene from persisted state.
    pub fn from_data(data: SceneData) -> Self {
        let mut scene = Self::new();
        scene.apply_data(data);
        scene
    }

    /// Replace the whole scene with persisted state.
    ///
    /// Malformed entries are sanitized rather than rejected: duplicate ids and
    /// areas with fewer than three vertices are dropped, bindings to missing
    /// objects are released, and objects caught in a binding cycle are freed.
    pub fn apply_data(&mut self, data: SceneData) {
        self.clear();
        self.is_light_mode = data.is_light_mode;
        self.symbol_scale = data.symbol_scale;

        for object in data.objects {
            if let MapObject::Area(area) = &object {
                if area.points().len() < MIN_AREA_VERTICES {
                    log::warn!("Skipping degenerate area {}", area.id);
                    continue;
                }
            }
            let id = object.id();
            if self.objects.contains_key(&id) {
                log::warn!("Skipping duplicate object {}", id);
                continue;
            }
            self.add(object);
        }

        let known: HashSet<ObjectId> = self.objects.keys().copied().collect();
        for object in self.objects.values_mut() {
            object.retain_known_sources(&known);
        }

        let cyclic: Vec<ObjectId> = self
            .draw_order
            .iter()
            .copied()
            .filter(|&id| self.has_constraint_to(id, id))
            .collect();
        for id in cyclic {
            if self.has_constraint_to(id, id) {
                log::warn!("Breaking constraint cycle through {}", id);
                if let Some(object) = self.objects.get_mut(&id) {
                    object.retain_known_sources(&HashSet::new());
                }
            }
        }
    }

    /// Serialize the scene to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_data())
    }

    /// Deserialize a scene from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::from_data(serde_json::from_str(json)?))
    }
}

/// Read-only view of a scene together with its configuration.
///
/// Everything that evaluates geometry takes a view, since a bound point's
/// position depends on other objects.
#[derive(Debug, Clone, Copy)]
pub struct SceneView<'a> {
    scene: &'a Scene,
    registry: &'a Registry,
    depth: usize,
}

impl<'a> SceneView<'a> {
    pub fn new(scene: &'a Scene, registry: &'a Registry) -> Self {
        Self {
            scene,
            registry,
            depth: 0,
        }
    }

    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    fn descend(&self) -> Option<Self> {
        if self.depth >= MAX_RESOLVE_DEPTH {
            log::debug!("Binding chain deeper than {}", MAX_RESOLVE_DEPTH);
            return None;
        }
        Some(Self {
            depth: self.depth + 1,
            ..*self
        })
    }

    /// Live position of a constrained point. Falls back to the stored
    /// coordinate when the source cannot be evaluated.
    pub fn resolve(&self, point: &ConstrainedPoint, kind: PointKind) -> Point {
        point
            .binding()
            .and_then(|b| self.parametric_point(b.source, b.t, kind))
            .unwrap_or_else(|| point.point())
    }

    /// Position at `t` along object `id`.
    pub fn parametric_point(&self, id: ObjectId, t: f64, kind: PointKind) -> Option<Point> {
        let object = self.scene.get(id)?;
        let inner = self.descend()?;
        Some(object.parametric_point(&inner, t, kind))
    }

    /// Tangent angle at `t` along object `id`, 0 when unavailable.
    pub fn parametric_orientation(&self, id: ObjectId, t: f64) -> f64 {
        match (self.scene.get(id), self.descend()) {
            (Some(object), Some(inner)) => object.parametric_orientation(&inner, t),
            _ => 0.0,
        }
    }

    /// Label clearance of object `id`, 0 when unknown.
    pub fn text_ascent(&self, id: ObjectId) -> f64 {
        match (self.scene.get(id), self.descend()) {
            (Some(object), Some(inner)) => object.text_ascent(&inner),
            _ => 0.0,
        }
    }

    pub fn has_constraint_to(&self, from: ObjectId, target: ObjectId) -> bool {
        self.scene.has_constraint_to(from, target)
    }

    /// Objects hit at `point` (or intersecting the box to `corner`), in
    /// draw order.
    pub fn objects_at(&self, point: Point, corner: Option<Point>) -> Vec<ObjectId> {
        self.scene
            .objects()
            .filter(|obj| obj.hit_test(self, point, corner))
            .map(MapObject::id)
            .collect()
    }

    /// Draw every object into fresh buckets, in draw order.
    pub fn draw(&self, style: &DrawStyle) -> DrawLayers {
        let mut layers = DrawLayers::new();
        for object in self.scene.objects() {
            object.draw(self, style, &mut layers);
        }
        layers
    }
}
