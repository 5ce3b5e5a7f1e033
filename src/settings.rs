use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};
use crate::model::Rgba;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorSettings {
    pub file_path: String,
    pub sticky_create: bool,
    pub allow_unconnected_links: bool,
    /// Hit-test radius in device pixels.
    pub pick_tolerance: f32,
    pub highlight_color: Rgba,
    pub confirm_exit: bool,
    /// Distance between an arc's waypoint and its trailing point.
    pub arc_end_offset: f32,
    pub zoom_step: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub palette_path: Option<String>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            file_path: "diagram.json".to_string(),
            sticky_create: false,
            allow_unconnected_links: false,
            pick_tolerance: 4.0,
            highlight_color: Rgba::rgb(255, 140, 0),
            confirm_exit: true,
            arc_end_offset: 20.0,
            zoom_step: 1.25,
            min_zoom: 0.1,
            max_zoom: 8.0,
            palette_path: None,
        }
    }
}

impl EditorSettings {
    pub fn validate(&self) -> Result<()> {
        let (min, max) = (self.min_zoom, self.max_zoom);
        if !(min.is_finite() && max.is_finite() && min > 0.0 && min <= max) {
            return Err(EditorError::Settings(format!(
                "zoom bounds {min}..{max} are not an increasing positive range"
            )));
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 1.0) {
            return Err(EditorError::Settings(format!(
                "zoom_step {} must be greater than 1",
                self.zoom_step
            )));
        }
        if !(self.pick_tolerance.is_finite() && self.pick_tolerance >= 0.0) {
            return Err(EditorError::Settings(format!(
                "pick_tolerance {} must be a non-negative number",
                self.pick_tolerance
            )));
        }
        if !self.arc_end_offset.is_finite() {
            return Err(EditorError::Settings("arc_end_offset must be finite".into()));
        }
        Ok(())
    }

    /// Zoom limits and step, falling back to the defaults when unusable.
    pub fn zoom_limits(&self) -> (f32, f32, f32) {
        let fallback = Self::default();
        let (min, max) = (self.min_zoom, self.max_zoom);
        let (min, max) = if min.is_finite() && max.is_finite() && min > 0.0 && min <= max {
            (min, max)
        } else {
            (fallback.min_zoom, fallback.max_zoom)
        };
        let step = if self.zoom_step.is_finite() && self.zoom_step > 1.0 {
            self.zoom_step
        } else {
            fallback.zoom_step
        };
        (min, max, step)
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "toml")
}

fn parse(path: &Path, s: &str) -> Option<EditorSettings> {
    if is_toml(path) {
        toml::from_str::<EditorSettings>(s)
            .ok()
            .or_else(|| serde_json::from_str::<EditorSettings>(s).ok())
    } else {
        serde_json::from_str::<EditorSettings>(s)
            .ok()
            .or_else(|| toml::from_str::<EditorSettings>(s).ok())
    }
}

pub fn load_settings(path: impl AsRef<Path>) -> Option<EditorSettings> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path).ok()?;
    let Some(settings) = parse(path, &s) else {
        tracing::warn!(path = %path.display(), "ignoring unreadable settings file");
        return None;
    };
    if let Err(e) = settings.validate() {
        tracing::warn!(path = %path.display(), error = %e, "ignoring settings file");
        return None;
    }
    Some(settings)
}

pub fn save_settings(path: impl AsRef<Path>, settings: &EditorSettings) -> Result<()> {
    let path = path.as_ref();
    let text = if is_toml(path) {
        toml::to_string_pretty(settings).map_err(|e| EditorError::Settings(e.to_string()))?
    } else {
        serde_json::to_string_pretty(settings)?
    };
    std::fs::write(path, text).map_err(|e| EditorError::io(path, e))
}

/// Places settings are looked for, most preferred first.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = std::env::var_os("HOME") {
        paths.push(PathBuf::from(home).join(".config").join("linkdraw.toml"));
    }
    paths.push(PathBuf::from("linkdraw.toml"));
    paths.push(PathBuf::from("linkdraw.json"));
    paths
}
