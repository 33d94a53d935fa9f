//! Color maps derived from the keyframes of a geometry collection.
//!
//! A color map is never stored; it is recomputed from whatever geometries are handed to
//! [`ColorMap::derive`] and turned into a fixed-size color ramp by [`ColorMap::descriptor`].

use crate::animation::keyframe::ValueKind;
use crate::assets::color::{Rgb8, interpolate};

/// Default stops for continuous attributes (navy, light grey, red).
pub const CONTINUOUS_PALETTE: [Rgb8; 3] = [
    Rgb8::new(0x00, 0x00, 0x80),
    Rgb8::new(0xE2, 0xE2, 0xE2),
    Rgb8::new(0xFF, 0x00, 0x00),
];

/// Default stops for discrete attributes.
pub const DISCRETE_PALETTE: [Rgb8; 6] = [
    Rgb8::new(0xFF, 0xA5, 0x00),
    Rgb8::new(0x18, 0x74, 0xCD),
    Rgb8::new(0x00, 0x64, 0x00),
    Rgb8::new(0xFF, 0x45, 0x00),
    Rgb8::new(0xA5, 0x2A, 0x2A),
    Rgb8::new(0x7D, 0x26, 0xCD),
];

/// Level count requested for continuous attributes.
pub const CONTINUOUS_LEVELS: usize = 64;
/// Smallest ramp emitted.
pub const MIN_RAMP: usize = 16;

/// Anything exposing per-attribute animation summaries.
pub trait AnimationSource {
    /// `[min, max]` time stamps of attribute `name`, if animated.
    fn animation_time_range(&self, name: &str) -> Option<[f64; 2]>;
    /// `[min, max]` values of a continuous attribute `name`.
    fn animation_value_range(&self, name: &str) -> Option<[f64; 2]>;
    /// Level set of a discrete attribute `name`.
    fn animation_value_names(&self, name: &str) -> Option<&[String]>;
}

/// Palette and ranges of one animated attribute.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorMap {
    name: String,
    alias: Option<String>,
    value_type: ValueKind,
    time_range: [f64; 2],
    value_range: Option<[f64; 2]>,
    hard_range: Option<[f64; 2]>,
    value_names: Vec<String>,
    n_colors: usize,
    colors: Vec<Rgb8>,
}

/// Collapse gathered endpoints to `[min, max]`; empty input yields `fallback` and a zero-width
/// range is widened by one unit below.
fn span(points: &[f64], fallback: [f64; 2]) -> [f64; 2] {
    let mut it = points.iter().copied();
    let Some(first) = it.next() else {
        return fallback;
    };
    let [lo, hi] = it.fold([first, first], |[lo, hi], x| [lo.min(x), hi.max(x)]);
    if lo == hi { [lo - 1.0, hi] } else { [lo, hi] }
}

impl ColorMap {
    /// Aggregate attribute `name` over `sources`. Sources without the attribute are skipped.
    pub fn derive<'a, S, I>(name: impl Into<String>, sources: I) -> Self
    where
        S: AnimationSource + 'a + ?Sized,
        I: IntoIterator<Item = &'a S>,
    {
        let name = name.into();
        let mut times = Vec::new();
        let mut values = Vec::new();
        let mut value_names: Vec<String> = Vec::new();

        for s in sources {
            if let Some(r) = s.animation_time_range(&name) {
                times.extend(r);
            }
            if let Some(r) = s.animation_value_range(&name) {
                values.extend(r);
            }
            for n in s.animation_value_names(&name).unwrap_or_default() {
                if !value_names.contains(n) {
                    value_names.push(n.clone());
                }
            }
        }

        let time_range = span(&times, [0.0, 1.0]);
        let (value_type, value_range, colors) = if value_names.is_empty() {
            (
                ValueKind::Continuous,
                Some(span(&values, [-1.0, 1.0])),
                CONTINUOUS_PALETTE.to_vec(),
            )
        } else {
            (ValueKind::Discrete, None, DISCRETE_PALETTE.to_vec())
        };

        let mut cmap = Self {
            name,
            alias: None,
            value_type,
            time_range,
            value_range,
            hard_range: None,
            value_names,
            n_colors: CONTINUOUS_LEVELS,
            colors,
        };
        cmap.set_colors(&[]);
        cmap
    }

    /// Replace the palette stops. Fewer than two stops keep the current palette.
    ///
    /// Discrete maps keep exactly one color per level, interpolating when the palette is short.
    pub fn set_colors(&mut self, colors: &[Rgb8]) {
        let stops = if colors.len() <= 1 {
            self.colors.clone()
        } else {
            colors.to_vec()
        };
        match self.value_type {
            ValueKind::Continuous => {
                self.colors = stops;
                self.n_colors = self.n_colors.max(CONTINUOUS_LEVELS);
            }
            ValueKind::Discrete => {
                self.n_colors = self.value_names.len();
                self.colors = if self.n_colors > stops.len() {
                    interpolate(&stops, self.n_colors)
                } else {
                    stops[..self.n_colors].to_vec()
                };
            }
        }
    }

    /// Override the value range of a continuous map. Ignored for discrete maps.
    pub fn set_value_range(&mut self, lo: f64, hi: f64) {
        if self.value_type == ValueKind::Continuous {
            self.value_range = Some([lo, hi]);
        }
    }

    /// Set the clamping sub-range of a continuous map, stored ascending. Ignored for discrete maps.
    pub fn set_hard_range(&mut self, a: f64, b: f64) {
        if self.value_type == ValueKind::Continuous {
            self.hard_range = Some([a.min(b), a.max(b)]);
        }
    }

    /// Display alias of the attribute.
    pub fn set_alias(&mut self, alias: impl Into<String>) {
        self.alias = Some(alias.into());
    }

    /// Attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Continuous or discrete.
    pub fn value_type(&self) -> ValueKind {
        self.value_type
    }

    /// Union of time ranges.
    pub fn time_range(&self) -> [f64; 2] {
        self.time_range
    }

    /// Union of value ranges; `None` for discrete maps.
    pub fn value_range(&self) -> Option<[f64; 2]> {
        self.value_range
    }

    /// Union of level sets, in first-appearance order.
    pub fn value_names(&self) -> &[String] {
        &self.value_names
    }

    /// Number of levels the palette represents.
    pub fn n_colors(&self) -> usize {
        self.n_colors
    }

    /// Current palette stops.
    pub fn colors(&self) -> &[Rgb8] {
        &self.colors
    }

    /// Size of the emitted ramp: `max(16, next_power_of_two(n_colors))`.
    pub fn ramp_len(&self) -> usize {
        self.n_colors.next_power_of_two().max(MIN_RAMP)
    }

    /// Renderer payload with the expanded ramp.
    pub fn descriptor(&self) -> ColorMapDescriptor {
        let ncols = self.ramp_len();
        let ramp = interpolate(&self.colors, ncols);
        let color_keys = match (self.value_type, self.value_range) {
            (ValueKind::Continuous, Some([lo, hi])) => {
                let step = (hi - lo) / ncols as f64;
                ColorKeys::Breakpoints((0..ncols).map(|i| lo + step * i as f64).collect())
            }
            _ => ColorKeys::Levels((1..=ncols as u32).collect()),
        };
        ColorMapDescriptor {
            name: self.name.clone(),
            time_range: self.time_range,
            value_range: self.value_range,
            value_names: self.value_names.clone(),
            value_type: self.value_type,
            color_keys,
            color_vals: ramp.into_iter().map(Rgb8::to_hex_literal).collect(),
            color_levels: self.n_colors,
            hard_range: self.hard_range,
            alias: self.alias.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
/// Ramp keys: 1-based level indices or numeric breakpoints.
pub enum ColorKeys {
    /// Discrete level indices.
    Levels(Vec<u32>),
    /// Evenly spaced values across the value range.
    Breakpoints(Vec<f64>),
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Color map as consumed by the viewer.
pub struct ColorMapDescriptor {
    /// Attribute name.
    pub name: String,
    /// Union of time ranges.
    pub time_range: [f64; 2],
    /// Value range of continuous maps.
    pub value_range: Option<[f64; 2]>,
    /// Level set of discrete maps.
    pub value_names: Vec<String>,
    /// `continuous` or `discrete`.
    pub value_type: ValueKind,
    /// Keys matching `color_vals` one to one.
    pub color_keys: ColorKeys,
    /// `0xrrggbb` colors of the ramp.
    pub color_vals: Vec<String>,
    /// Number of levels represented.
    pub color_levels: usize,
    /// Clamping sub-range.
    pub hard_range: Option<[f64; 2]>,
    /// Display alias.
    pub alias: Option<String>,
}

#[cfg(test)]
#[path = "../../tests/unit/animation/colormap.rs"]
mod tests;
