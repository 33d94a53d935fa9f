//! RGB colors, hex parsing and palette interpolation.

use serde::{Deserialize, Serialize};

use crate::foundation::error::{BrainError, BrainResult};

/// Opaque 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb8 {
    /// Build a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    fn from_unit(r: f64, g: f64, b: f64) -> Self {
        fn to_u8(x: f64) -> u8 {
            (x.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        Self::new(to_u8(r), to_u8(g), to_u8(b))
    }

    /// Lowercase `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Lowercase `0xrrggbb`, the form the viewer expects in color ramps.
    pub fn to_hex_literal(self) -> String {
        format!("0x{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    fn lerp(self, other: Rgb8, t: f64) -> Rgb8 {
        fn mix(a: u8, b: u8, t: f64) -> u8 {
            (a as f64 + (b as f64 - a as f64) * t).round().clamp(0.0, 255.0) as u8
        }
        Rgb8::new(
            mix(self.r, other.r, t),
            mix(self.g, other.g, t),
            mix(self.b, other.b, t),
        )
    }
}

/// Parse `#RRGGBB`, `RRGGBB` or `0xRRGGBB` (case-insensitive). An alpha byte is accepted and
/// dropped.
pub fn parse_hex(s: &str) -> BrainResult<Rgb8> {
    let s = s.trim();
    let s = s
        .strip_prefix('#')
        .or_else(|| s.strip_prefix("0x"))
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);

    fn hex_byte(pair: &str) -> BrainResult<u8> {
        u8::from_str_radix(pair, 16)
            .map_err(|_| BrainError::validation(format!("invalid hex byte \"{pair}\"")))
    }

    if !s.is_ascii() || !(s.len() == 6 || s.len() == 8) {
        return Err(BrainError::validation(
            "hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)",
        ));
    }
    Ok(Rgb8::new(
        hex_byte(&s[0..2])?,
        hex_byte(&s[2..4])?,
        hex_byte(&s[4..6])?,
    ))
}

/// Palette entry as supplied in options files.
///
/// Accepts a hex string, an `{r,g,b}` or `{h,s,l}` object with unit-range channels, or a
/// 3/4-element array. Always serializes back to `#rrggbb`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaletteColor(pub Rgb8);

impl PaletteColor {
    /// Parse a hex string.
    pub fn hex(s: &str) -> BrainResult<Self> {
        parse_hex(s).map(Self)
    }
}

impl Serialize for PaletteColor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_hex())
    }
}

impl<'de> Deserialize<'de> for PaletteColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Hex(String),
            RgbObj { r: f64, g: f64, b: f64 },
            HslObj { h: f64, s: f64, l: f64 },
            Arr(Vec<f64>),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Hex(s) => parse_hex(&s)
                .map(Self)
                .map_err(serde::de::Error::custom),
            Repr::RgbObj { r, g, b } => Ok(Self(Rgb8::from_unit(r, g, b))),
            Repr::HslObj { h, s, l } => Ok(Self(hsl_to_rgb(h, s, l))),
            Repr::Arr(v) => match v.as_slice() {
                [r, g, b] | [r, g, b, _] => Ok(Self(Rgb8::from_unit(*r, *g, *b))),
                _ => Err(serde::de::Error::custom(
                    "color array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])",
                )),
            },
        }
    }
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> Rgb8 {
    let h = (h % 360.0 + 360.0) % 360.0 / 360.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        return Rgb8::from_unit(l, l, l);
    }

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    Rgb8::from_unit(
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    )
}

/// Expand `stops` into `n` colors by piecewise-linear interpolation in RGB space.
///
/// The first and last outputs equal the first and last stops. A single stop is repeated.
pub fn interpolate(stops: &[Rgb8], n: usize) -> Vec<Rgb8> {
    match (stops, n) {
        (_, 0) | ([], _) => Vec::new(),
        ([only], _) => vec![*only; n],
        (_, 1) => vec![stops[0]],
        _ => {
            let segments = (stops.len() - 1) as f64;
            (0..n)
                .map(|i| {
                    let pos = i as f64 * segments / (n - 1) as f64;
                    let lo = (pos.floor() as usize).min(stops.len() - 2);
                    stops[lo].lerp(stops[lo + 1], pos - lo as f64)
                })
                .collect()
        }
    }
}

/// [`interpolate`] over hex strings.
pub fn interpolate_hex(stops: &[&str], n: usize) -> BrainResult<Vec<String>> {
    let rgbs = stops
        .iter()
        .map(|s| parse_hex(s))
        .collect::<BrainResult<Vec<_>>>()?;
    Ok(interpolate(&rgbs, n).into_iter().map(Rgb8::to_hex).collect())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/color.rs"]
mod tests;
