//! Configuration registry: line styles, icon kinds, fill patterns and snap radii.
//!
//! The editor only reads the registry. Hosts can ship their own through
//! [`Registry::from_json`]; [`Registry::default`] carries the stock set.

use crate::error::RegistryError;
use serde::{Deserialize, Serialize};

/// Rendering sub-variant of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    #[default]
    Solid,
    Dashed,
    Barrier,
    Wavy,
}

impl LineKind {
    /// Stroke width of the line body.
    pub fn stroke_width(self) -> f64 {
        match self {
            LineKind::Solid | LineKind::Dashed => 4.0,
            LineKind::Barrier => 12.0,
            LineKind::Wavy => 3.0,
        }
    }

    /// Opacity used for hidden lines shown to privileged users.
    pub fn hidden_alpha(self) -> f64 {
        match self {
            LineKind::Solid | LineKind::Barrier => 0.2,
            LineKind::Dashed | LineKind::Wavy => 0.4,
        }
    }
}

/// A named line style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineStyleEntry {
    pub name: String,
    pub icon: String,
    pub kind: LineKind,
    /// Hit-test tolerance in pixels.
    pub select_tolerance: f64,
}

/// A symbol or waypoint kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconEntry {
    pub name: String,
    pub icon: String,
    #[serde(default)]
    pub footprint: Option<String>,
    /// Kind to switch to when a waypoint is reversed.
    #[serde(default)]
    pub reverse: Option<String>,
    /// Native sprite width before symbol scaling.
    #[serde(default = "default_icon_size")]
    pub width: f64,
    /// Native sprite height before symbol scaling.
    #[serde(default = "default_icon_size")]
    pub height: f64,
}

fn default_icon_size() -> f64 {
    64.0
}

/// An area fill pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternEntry {
    pub name: String,
    #[serde(default)]
    pub texture: Option<String>,
    /// Outline width used while rubber-banding a new area.
    #[serde(default)]
    pub line_width: Option<f64>,
}

/// Snap radii in pixels, one per snap kind family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapRadii {
    pub line_end: f64,
    pub line: f64,
    pub symbol: f64,
}

impl Default for SnapRadii {
    fn default() -> Self {
        Self {
            line_end: 10.0,
            line: 5.0,
            symbol: 20.0,
        }
    }
}

/// All configurable assets, in registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registry {
    #[serde(default)]
    pub snap: SnapRadii,
    pub line_styles: Vec<LineStyleEntry>,
    pub symbols: Vec<IconEntry>,
    pub waypoints: Vec<IconEntry>,
    pub patterns: Vec<PatternEntry>,
}

impl Registry {
    /// Parse a registry from JSON. Every collection must be non-empty.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let registry: Registry = serde_json::from_str(json)?;
        if registry.line_styles.is_empty() {
            return Err(RegistryError::Empty("line style"));
        }
        if registry.symbols.is_empty() {
            return Err(RegistryError::Empty("symbol"));
        }
        if registry.waypoints.is_empty() {
            return Err(RegistryError::Empty("waypoint"));
        }
        if registry.patterns.is_empty() {
            return Err(RegistryError::Empty("pattern"));
        }
        Ok(registry)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Look up a line style. Unknown names fall back to the first registered style.
    pub fn line_style(&self, name: &str) -> Option<&LineStyleEntry> {
        self.line_styles
            .iter()
            .find(|s| s.name == name)
            .or_else(|| self.line_styles.first())
    }

    /// Rendering kind for a line style name.
    pub fn line_kind(&self, name: &str) -> LineKind {
        self.line_style(name).map(|s| s.kind).unwrap_or_default()
    }

    pub fn symbol(&self, name: &str) -> Option<&IconEntry> {
        self.symbols.iter().find(|s| s.name == name)
    }

    pub fn waypoint(&self, name: &str) -> Option<&IconEntry> {
        self.waypoints.iter().find(|s| s.name == name)
    }

    pub fn pattern(&self, name: &str) -> Option<&PatternEntry> {
        self.patterns.iter().find(|p| p.name == name)
    }

    /// Name of the first registered line style.
    pub fn default_line_style(&self) -> &str {
        self.line_styles.first().map(|s| s.name.as_str()).unwrap_or_default()
    }

    pub fn default_symbol(&self) -> &str {
        self.symbols.first().map(|s| s.name.as_str()).unwrap_or_default()
    }

    pub fn default_waypoint(&self) -> &str {
        self.waypoints.first().map(|s| s.name.as_str()).unwrap_or_default()
    }

    pub fn default_pattern(&self) -> &str {
        self.patterns.first().map(|p| p.name.as_str()).unwrap_or_default()
    }
}

fn line_style(name: &str, kind: LineKind, select_tolerance: f64) -> LineStyleEntry {
    LineStyleEntry {
        name: name.to_string(),
        icon: format!("assets/lines/{name}.svg"),
        kind,
        select_tolerance,
    }
}

fn icon(folder: &str, name: &str, footprint: Option<String>, reverse: Option<&str>) -> IconEntry {
    IconEntry {
        name: name.to_string(),
        icon: format!("assets/{folder}/{name}.svg"),
        footprint,
        reverse: reverse.map(str::to_string),
        width: default_icon_size(),
        height: default_icon_size(),
    }
}

fn footprint(name: &str) -> Option<String> {
    Some(format!("assets/footprints/{name}.svg"))
}

fn pattern(name: &str) -> PatternEntry {
    PatternEntry {
        name: name.to_string(),
        texture: Some(format!("assets/patterns/{name}.svg")),
        line_width: None,
    }
}

impl Default for Registry {
    fn default() -> Self {
        let symbols = [
            "major-settlement",
            "minor-settlement",
            "major-site",
            "minor-site",
            "major-danger",
            "minor-danger",
        ]
        .into_iter()
        .map(|name| icon("symbols", name, footprint(name), None))
        .chain(std::iter::once(icon("symbols", "curiosity", None, None)))
        .collect();

        Self {
            snap: SnapRadii::default(),
            line_styles: vec![
                line_style("major", LineKind::Solid, 5.0),
                line_style("minor", LineKind::Dashed, 5.0),
                line_style("rough", LineKind::Wavy, 13.0),
                line_style("barrier", LineKind::Barrier, 13.0),
            ],
            symbols,
            waypoints: vec![
                icon("waypoints", "waypoint", Some("assets/waypoints/waypoint.svg".to_string()), None),
                icon("waypoints", "pass", footprint("pass"), None),
                icon("waypoints", "elevation-left", None, Some("elevation-right")),
                icon("waypoints", "elevation-right", None, Some("elevation-left")),
            ],
            patterns: vec![
                pattern("diagonal1"),
                pattern("diagonal2"),
                pattern("dots"),
                pattern("waves"),
                PatternEntry {
                    name: "barrier".to_string(),
                    texture: None,
                    line_width: Some(12.0),
                },
            ],
        }
    }
}

/// Per-session editor switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSettings {
    /// Move coincident points of other objects together with the dragged one.
    pub adjust_linked: bool,
    /// Visibility given to newly drawn objects.
    pub reveal_new_objects: bool,
    /// Whether the local user may see hidden objects.
    pub privileged: bool,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            adjust_linked: true,
            reveal_new_objects: true,
            privileged: true,
        }
    }
}
