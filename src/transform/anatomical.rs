//! Anatomical coordinate spaces of one subject.
//!
//! Three matrices are tracked:
//!
//! - `xfm`: scanner RAS to MNI305 template (talairach transform)
//! - `norig`: voxel index to scanner RAS
//! - `torig`: voxel index to tkr-RAS (FreeSurfer surface space)
//!
//! Compositions always follow `xfm · Norig · inverse(Torig)`.

use crate::foundation::core::{Mat4, Vec3};
use crate::foundation::error::BrainResult;
use crate::transform::matrix::{invert, multiply};

#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
/// The three anatomical matrices of one subject, identity by default.
pub struct AnatomicalTransforms {
    /// Scanner-to-template transform.
    pub xfm: Mat4,
    /// Voxel-to-RAS transform.
    #[serde(rename = "Norig")]
    pub norig: Mat4,
    /// Voxel-to-tkr-RAS transform.
    #[serde(rename = "Torig")]
    pub torig: Mat4,
}

impl AnatomicalTransforms {
    /// tkr-RAS to MNI305 template: `xfm · Norig · inverse(Torig)`.
    pub fn vox2vox_mni305(&self) -> BrainResult<Mat4> {
        let torig_inv = invert(&self.torig)?;
        Ok(multiply(&multiply(&self.xfm, &self.norig), &torig_inv))
    }

    /// Scanner RAS origin expressed in tkr-RAS space.
    pub fn scanner_center(&self) -> BrainResult<Vec3> {
        let m = multiply(&self.norig, &invert(&self.torig)?);
        Ok([-m.0[3], -m.0[7], -m.0[11]])
    }
}

/// Parse the matrix of a talairach `.xfm` text file.
///
/// Only lines made of four numbers (optionally terminated by `;`) contribute. The first twelve
/// values are padded with `0 0 0 1`; fewer than twelve values yield the identity.
pub fn parse_talairach_xfm(text: &str) -> Mat4 {
    let mut values = Vec::with_capacity(12);
    for line in text.lines() {
        let line = line.trim();
        let line = line.strip_suffix(';').unwrap_or(line).trim_end();
        let parts: Vec<&str> = line.split(' ').filter(|p| !p.is_empty()).collect();
        if parts.len() != 4 {
            continue;
        }
        let parsed: Option<Vec<f64>> = parts.iter().map(|p| p.parse::<f64>().ok()).collect();
        if let Some(row) = parsed {
            values.extend(row);
        }
    }

    if values.len() < 12 {
        tracing::warn!("cannot parse talairach xfm, falling back to identity");
        return Mat4::IDENTITY;
    }
    let mut out = [0.0; 16];
    out[..12].copy_from_slice(&values[..12]);
    out[15] = 1.0;
    Mat4(out)
}

#[cfg(test)]
#[path = "../../tests/unit/transform/anatomical.rs"]
mod tests;
