//! Hemisphere surface pairs.

use std::fmt;
use std::str::FromStr;

use crate::foundation::core::{Layer, LayerSet, Vec3};
use crate::foundation::error::{BrainError, BrainResult};
use crate::geometry::geom::{GeomId, GeomKind, Hemisphere};
use crate::geometry::graph::SceneGraph;
use crate::geometry::group::GroupId;

/// FreeSurfer surface types a subject directory may provide.
pub const SURFACE_TYPES: [&str; 7] = [
    "pial",
    "white",
    "smoothwm",
    "pial-outer-smoothed",
    "inflated",
    "orig",
    "sphere",
];

/// Horizontal hemisphere offset of standard meshes, by surface type.
pub fn hemisphere_offset(surface_type: &str) -> f64 {
    match surface_type {
        "inflated" => 50.0,
        "sphere" => 128.0,
        _ => 0.0,
    }
}

/// Mesh topology of a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MeshType {
    /// Native FreeSurfer mesh in tkr-RAS space.
    #[serde(rename = "fs")]
    Fs,
    /// SUMA standard 141 mesh.
    #[serde(rename = "std.141")]
    Std141,
}

impl MeshType {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fs => "fs",
            Self::Std141 => "std.141",
        }
    }

    fn hemisphere_label(self, hemisphere: Hemisphere) -> &'static str {
        match (self, hemisphere) {
            (Self::Fs, Hemisphere::Left) => "FreeSurfer Left Hemisphere",
            (Self::Fs, Hemisphere::Right) => "FreeSurfer Right Hemisphere",
            (Self::Std141, Hemisphere::Left) => "Standard 141 Left Hemisphere",
            (Self::Std141, Hemisphere::Right) => "Standard 141 Right Hemisphere",
        }
    }
}

impl fmt::Display for MeshType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeshType {
    type Err = BrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fs" => Ok(Self::Fs),
            "std.141" => Ok(Self::Std141),
            other => Err(BrainError::validation(format!(
                "mesh type '{other}' not supported: only SUMA standard 141 or FreeSurfer brain"
            ))),
        }
    }
}

/// Two hemisphere meshes of one surface type, sharing one group.
#[derive(Clone, Debug, PartialEq)]
pub struct BrainSurface {
    subject_code: String,
    surface_type: String,
    mesh_type: MeshType,
    left: GeomId,
    right: GeomId,
    group: GroupId,
}

impl BrainSurface {
    /// Bind two free meshes of `graph` as the hemispheres of one surface.
    ///
    /// Both meshes move to the surface layer and end up sharing the left mesh's group; names
    /// of meshes and group are derived from the subject and surface type.
    pub fn new(
        graph: &mut SceneGraph,
        subject_code: &str,
        surface_type: impl Into<String>,
        mesh_type: MeshType,
        left: GeomId,
        right: GeomId,
    ) -> BrainResult<Self> {
        let surface_type = surface_type.into();
        for (id, hemisphere) in [(left, Hemisphere::Left), (right, Hemisphere::Right)] {
            let geom = graph
                .geom_mut(id)
                .ok_or_else(|| BrainError::validation(format!("unknown geometry id {}", id.0)))?;
            match &mut geom.kind {
                GeomKind::Free(mesh) => {
                    mesh.hemisphere = Some(hemisphere);
                    mesh.surface_type = Some(surface_type.clone());
                }
                other => {
                    return Err(BrainError::validation(format!(
                        "surface hemisphere '{}' must be a free mesh, got {}",
                        geom.name,
                        other.type_tag()
                    )));
                }
            }
            geom.layer = LayerSet::single(Layer::SURFACE);
        }
        let group = graph.share_group(left, right)?;

        let mut surface = Self {
            subject_code: String::new(),
            surface_type,
            mesh_type,
            left,
            right,
            group,
        };
        surface.set_subject_code(graph, subject_code)?;
        Ok(surface)
    }

    /// Re-label meshes and group for `subject_code`.
    pub fn set_subject_code(
        &mut self,
        graph: &mut SceneGraph,
        subject_code: &str,
    ) -> BrainResult<()> {
        for (id, hemisphere) in [(self.left, Hemisphere::Left), (self.right, Hemisphere::Right)] {
            let geom = graph
                .geom_mut(id)
                .ok_or_else(|| BrainError::validation(format!("unknown geometry id {}", id.0)))?;
            geom.subject_code = Some(subject_code.to_string());
            geom.name = format!(
                "{} - {} ({subject_code})",
                self.mesh_type.hemisphere_label(hemisphere),
                self.surface_type
            );
        }
        let group = graph
            .group_mut(self.group)
            .ok_or_else(|| BrainError::validation(format!("unknown group id {}", self.group.0)))?;
        group.subject_code = Some(subject_code.to_string());
        group.name = format!("Surface - {} ({subject_code})", self.surface_type);
        self.subject_code = subject_code.to_string();
        Ok(())
    }

    /// Move the shared group origin.
    pub fn set_group_position(&self, graph: &mut SceneGraph, position: Vec3) -> BrainResult<()> {
        let group = graph
            .group_mut(self.group)
            .ok_or_else(|| BrainError::validation(format!("unknown group id {}", self.group.0)))?;
        group.position = position;
        Ok(())
    }

    /// Subject code.
    pub fn subject_code(&self) -> &str {
        &self.subject_code
    }

    /// Surface type, such as `pial`.
    pub fn surface_type(&self) -> &str {
        &self.surface_type
    }

    /// Mesh topology.
    pub fn mesh_type(&self) -> MeshType {
        self.mesh_type
    }

    /// Left hemisphere mesh.
    pub fn left(&self) -> GeomId {
        self.left
    }

    /// Right hemisphere mesh.
    pub fn right(&self) -> GeomId {
        self.right
    }

    /// Shared group.
    pub fn group(&self) -> GroupId {
        self.group
    }
}

impl fmt::Display for BrainSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Subject\t\t: {}", self.subject_code)?;
        writeln!(f, "Surface type\t: {}", self.surface_type)?;
        write!(f, "Mesh type\t: {}", self.mesh_type)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/brain/surface.rs"]
mod tests;
