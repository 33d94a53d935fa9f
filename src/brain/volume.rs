//! Volumes backed by a data cube.

use std::fmt;

use crate::foundation::core::{Layer, LayerSet, Vec3};
use crate::foundation::error::{BrainError, BrainResult};
use crate::geometry::geom::{GeomId, GeomKind};
use crate::geometry::graph::SceneGraph;
use crate::geometry::group::GroupId;

/// A data cube of one volume type, such as `T1`.
#[derive(Clone, Debug, PartialEq)]
pub struct BrainVolume {
    subject_code: String,
    volume_type: String,
    volume: GeomId,
    group: GroupId,
}

impl BrainVolume {
    /// Bind a data cube of `graph` as a volume. The cube is moved to the invisible layer.
    pub fn new(
        graph: &mut SceneGraph,
        subject_code: &str,
        volume_type: impl Into<String>,
        volume: GeomId,
    ) -> BrainResult<Self> {
        let geom = graph
            .geom_mut(volume)
            .ok_or_else(|| BrainError::validation(format!("unknown geometry id {}", volume.0)))?;
        if !matches!(geom.kind, GeomKind::DataCube(_)) {
            return Err(BrainError::validation(format!(
                "volume '{}' must be a datacube, got {}",
                geom.name,
                geom.type_tag()
            )));
        }
        let Some(group) = geom.group else {
            return Err(BrainError::validation(format!(
                "volume '{}' has no group",
                geom.name
            )));
        };
        geom.layer = LayerSet::single(Layer::INVISIBLE);

        let mut v = Self {
            subject_code: String::new(),
            volume_type: volume_type.into(),
            volume,
            group,
        };
        v.set_subject_code(graph, subject_code)?;
        Ok(v)
    }

    /// Re-label cube and group for `subject_code`.
    pub fn set_subject_code(
        &mut self,
        graph: &mut SceneGraph,
        subject_code: &str,
    ) -> BrainResult<()> {
        let geom = graph.geom_mut(self.volume).ok_or_else(|| {
            BrainError::validation(format!("unknown geometry id {}", self.volume.0))
        })?;
        geom.subject_code = Some(subject_code.to_string());
        geom.name = format!("{} ({subject_code})", self.volume_type);

        let group = graph
            .group_mut(self.group)
            .ok_or_else(|| BrainError::validation(format!("unknown group id {}", self.group.0)))?;
        group.subject_code = Some(subject_code.to_string());
        group.name = format!("Volume - {} ({subject_code})", self.volume_type);
        self.subject_code = subject_code.to_string();
        Ok(())
    }

    /// Move the volume's group origin.
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

    /// Volume type.
    pub fn volume_type(&self) -> &str {
        &self.volume_type
    }

    /// The data cube geometry.
    pub fn geom(&self) -> GeomId {
        self.volume
    }

    /// The cube's group.
    pub fn group(&self) -> GroupId {
        self.group
    }
}

impl fmt::Display for BrainVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Subject\t\t: {}", self.subject_code)?;
        write!(f, "Volume type\t: {}", self.volume_type)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/brain/volume.rs"]
mod tests;
