//! Vectors, matrices and visibility layers.

use std::collections::BTreeSet;

use crate::foundation::error::{BrainError, BrainResult};

/// 3-vector used for positions, camera targets and bounding half-sizes.
pub type Vec3 = [f64; 3];

/// Visibility layer of a geometry or group.
///
/// `0` renders in the primary camera only, `1` in all cameras and `13` is invisible.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Layer(u8);

impl Layer {
    /// Primary camera only.
    pub const MAIN_CAMERA: Layer = Layer(0);
    /// Visible to all cameras.
    pub const ALL_CAMERAS: Layer = Layer(1);
    /// Layer used for brain surfaces.
    pub const SURFACE: Layer = Layer(8);
    /// Never rendered.
    pub const INVISIBLE: Layer = Layer(13);
    /// Reserved for non-rendering data markers; outside the user range.
    pub const MARKER: Layer = Layer(31);

    /// Highest layer a caller may request.
    pub const MAX_USER: u8 = 13;

    /// Validate and build a layer from a user-supplied index.
    pub fn new(v: u8) -> BrainResult<Self> {
        if v > Self::MAX_USER {
            return Err(BrainError::validation(format!(
                "layer must be integer from 0-13 \
                 (0: main camera-only, 1: all cameras, 13: invisible), got {v}"
            )));
        }
        Ok(Self(v))
    }

    /// Raw layer index.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Layer {
    type Error = BrainError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        if v == Self::MARKER.0 {
            return Ok(Self::MARKER);
        }
        Self::new(v)
    }
}

impl From<Layer> for u8 {
    fn from(l: Layer) -> Self {
        l.0
    }
}

/// Ordered set of visibility layers.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct LayerSet(BTreeSet<Layer>);

impl LayerSet {
    /// Validate every index and collect into a set.
    pub fn from_indices(indices: &[u8]) -> BrainResult<Self> {
        let mut out = BTreeSet::new();
        for &i in indices {
            out.insert(Layer::new(i)?);
        }
        Ok(Self(out))
    }

    /// Set holding exactly one layer.
    pub fn single(layer: Layer) -> Self {
        Self(BTreeSet::from([layer]))
    }

    /// Whether `layer` is part of the set.
    pub fn contains(&self, layer: Layer) -> bool {
        self.0.contains(&layer)
    }

    /// Iterate over layers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Layer> + '_ {
        self.0.iter().copied()
    }

    /// Number of layers in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no layer is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Flattened row-major 4x4 matrix.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Mat4(pub [f64; 16]);

impl Mat4 {
    /// The identity matrix.
    pub const IDENTITY: Mat4 = Mat4([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    ]);

    /// Element at `(row, col)`, both zero-based.
    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.0[row * 4 + col]
    }

    /// Nested row representation, as consumed by the viewer.
    pub fn rows(&self) -> [[f64; 4]; 4] {
        let m = &self.0;
        [
            [m[0], m[1], m[2], m[3]],
            [m[4], m[5], m[6], m[7]],
            [m[8], m[9], m[10], m[11]],
            [m[12], m[13], m[14], m[15]],
        ]
    }

    /// Element-wise comparison within `tol`.
    pub fn approx_eq(&self, other: &Mat4, tol: f64) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(a, b)| (a - b).abs() <= tol)
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Validate that a slice holds exactly three coordinates.
pub fn vec3_from_slice(v: &[f64]) -> BrainResult<Vec3> {
    match v {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(BrainError::validation(format!(
            "position must have length 3, got {}",
            v.len()
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
