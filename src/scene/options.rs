//! Viewer options and the settings block they produce.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_json::Value;

use crate::animation::colormap::ColorMapDescriptor;
use crate::assets::color::PaletteColor;
use crate::foundation::core::Vec3;
use crate::foundation::error::{BrainError, BrainResult};

/// Control presets every brain scene starts with, in order.
pub const BASE_PRESETS: [&str; 5] = [
    "subject2",
    "surface_type2",
    "hemisphere_material",
    "map_template",
    "electrodes",
];
/// Control presets always appended after caller presets.
pub const TRAILING_PRESETS: [&str; 2] = ["animation", "display_highlights"];

/// Viewer and assembly options.
///
/// Every field has a default, so a partial JSON object is a complete configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SceneOptions {
    /// Canvas background color.
    pub background: String,
    /// Text magnification; non-positive values become 1.
    pub font_scale: f64,
    /// Render the time stamp.
    pub timestamp: bool,
    /// Show the side cameras.
    pub side_canvas: bool,
    /// Zoom of the side cameras.
    pub side_zoom: f64,
    /// Width of each side canvas in pixels.
    pub side_width: f64,
    /// Offset of the side canvases.
    pub side_shift: [f64; 2],
    /// Side canvases visible at start.
    pub side_display: bool,
    /// Show the control panel.
    pub control_panel: bool,
    /// Control presets.
    pub control_presets: Vec<String>,
    /// Control panel expanded at start.
    pub control_display: bool,
    /// Point the camera orbits around.
    pub camera_center: Vec3,
    /// Initial camera position.
    pub camera_pos: Vec3,
    /// Initial zoom; non-positive values become 1.
    pub start_zoom: f64,
    /// Initial crosshair coordinates; three values when set.
    pub coords: Option<Vec<f64>>,
    /// Color map selected at start.
    pub default_colormap: Option<String>,
    /// Palette overrides by attribute.
    pub palettes: BTreeMap<String, Vec<PaletteColor>>,
    /// `[min, max]` or `[min, max, hard_min, hard_max]` overrides by attribute.
    pub value_ranges: BTreeMap<String, Vec<f64>>,
    /// Display aliases by attribute.
    pub value_alias: BTreeMap<String, String>,
    /// Show electrodes without values.
    pub show_inactive_electrodes: bool,
    /// Widget id; also names the payload directory of the bundle.
    pub widget_id: String,
    /// Viewer debug mode.
    pub debug: bool,
    /// Viewer session token.
    pub token: Option<String>,
    /// Initial controller values.
    pub controllers: BTreeMap<String, Value>,
    /// Global key/value pairs attached to the scene.
    pub global_data: BTreeMap<String, Value>,
    /// Global file references; entries that are not complete cache records are ignored.
    pub global_files: BTreeMap<String, Value>,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            background: "#FFFFFF".to_string(),
            font_scale: 1.0,
            timestamp: true,
            side_canvas: true,
            side_zoom: 1.0,
            side_width: 250.0,
            side_shift: [0.0, 0.0],
            side_display: true,
            control_panel: true,
            control_presets: Vec::new(),
            control_display: true,
            camera_center: [0.0, 0.0, 0.0],
            camera_pos: [500.0, 0.0, 0.0],
            start_zoom: 1.0,
            coords: None,
            default_colormap: None,
            palettes: BTreeMap::new(),
            value_ranges: BTreeMap::new(),
            value_alias: BTreeMap::new(),
            show_inactive_electrodes: true,
            widget_id: "threebrain_data".to_string(),
            debug: false,
            token: None,
            controllers: BTreeMap::new(),
            global_data: BTreeMap::new(),
            global_files: BTreeMap::new(),
        }
    }
}

impl SceneOptions {
    /// Parse options from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> BrainResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| BrainError::validation(format!("parse scene options JSON: {e}")))
    }

    /// Parse options from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> BrainResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            BrainError::validation(format!("open scene options '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check shapes and normalize scale factors.
    pub fn validate(&mut self) -> BrainResult<()> {
        if let Some(c) = &self.coords
            && c.len() != 3
        {
            return Err(BrainError::validation(
                "coords must be None or a list of length 3",
            ));
        }
        if self.widget_id.is_empty() {
            return Err(BrainError::validation("widget_id must not be empty"));
        }
        if self.font_scale <= 0.0 {
            self.font_scale = 1.0;
        }
        if self.start_zoom <= 0.0 {
            self.start_zoom = 1.0;
        }
        Ok(())
    }

    /// Same options with the standard brain presets around the caller's presets.
    pub fn with_brain_presets(mut self) -> Self {
        let mut presets: Vec<String> = BASE_PRESETS.iter().map(|s| s.to_string()).collect();
        for p in self
            .control_presets
            .iter()
            .map(String::as_str)
            .chain(TRAILING_PRESETS)
        {
            if !presets.iter().any(|q| q == p) {
                presets.push(p.to_string());
            }
        }
        self.control_presets = presets;
        self
    }

    /// Relative directory holding the scene's payload files.
    pub fn cache_folder(&self) -> String {
        format!("{LIB_PATH}{}-0/", self.widget_id)
    }
}

/// Relative directory holding viewer libraries and payloads.
pub const LIB_PATH: &str = "lib/";

/// Settings block of a scene bundle.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ViewerSettings {
    /// Show the side cameras.
    pub side_camera: bool,
    /// Zoom of the side cameras.
    pub side_canvas_zoom: f64,
    /// Width of each side canvas.
    pub side_canvas_width: f64,
    /// Offset of the side canvases.
    pub side_canvas_shift: [f64; 2],
    /// Color maps by attribute.
    pub color_maps: BTreeMap<String, ColorMapDescriptor>,
    /// Color map selected at start; `null` without animated attributes.
    pub default_colormap: Option<String>,
    /// Hide the control panel.
    pub hide_controls: bool,
    /// Camera orbit center.
    pub control_center: Vec3,
    /// Initial camera position.
    pub camera_pos: Vec3,
    /// Text magnification.
    pub font_magnification: f64,
    /// Initial zoom.
    pub start_zoom: f64,
    /// Show the legend.
    pub show_legend: bool,
    /// Render the time stamp.
    pub render_timestamp: bool,
    /// Control presets.
    pub control_presets: Vec<String>,
    /// Relative payload directory.
    pub cache_folder: String,
    /// Relative library directory.
    pub lib_path: String,
    /// Initial controller values.
    pub default_controllers: BTreeMap<String, Value>,
    /// Viewer debug mode.
    pub debug: bool,
    /// Canvas background.
    pub background: String,
    /// Session token.
    pub token: Option<String>,
    /// Initial crosshair coordinates.
    pub coords: Option<Vec<f64>>,
    /// Show electrodes without values.
    pub show_inactive_electrodes: bool,
    /// Side canvases visible at start.
    pub side_display: bool,
    /// Control panel expanded at start.
    pub control_display: bool,
}

impl ViewerSettings {
    /// Settings for `opts` with already derived color maps.
    pub fn new(
        opts: &SceneOptions,
        color_maps: BTreeMap<String, ColorMapDescriptor>,
        default_colormap: Option<String>,
    ) -> Self {
        Self {
            side_camera: opts.side_canvas,
            side_canvas_zoom: opts.side_zoom,
            side_canvas_width: opts.side_width,
            side_canvas_shift: opts.side_shift,
            color_maps,
            default_colormap,
            hide_controls: !opts.control_panel,
            control_center: opts.camera_center,
            camera_pos: opts.camera_pos,
            font_magnification: opts.font_scale,
            start_zoom: opts.start_zoom,
            show_legend: true,
            render_timestamp: opts.timestamp,
            control_presets: opts.control_presets.clone(),
            cache_folder: opts.cache_folder(),
            lib_path: LIB_PATH.to_string(),
            default_controllers: opts.controllers.clone(),
            debug: opts.debug,
            background: opts.background.clone(),
            token: opts.token.clone(),
            coords: opts.coords.clone(),
            show_inactive_electrodes: opts.show_inactive_electrodes,
            side_display: opts.side_display,
            control_display: opts.control_display,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/options.rs"]
mod tests;
