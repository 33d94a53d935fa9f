//! Arena of groups and geometries.
//!
//! Geometries reference their group by [`GroupId`]; several geometries may share one group and
//! a group outlives any geometry pointing at it. Variant constructors that need to write group
//! data (free meshes, data cubes) live here, as does dispatch of time-series updates.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};

use crate::animation::keyframe::{KeyValues, Keyframe};
use crate::cache::store::{CacheRecord, JsonCache, PutOptions, absolute};
use crate::foundation::core::{Vec3, vec3_from_slice};
use crate::foundation::error::{BrainError, BrainResult};
use crate::geometry::geom::{DataCube, FreeMesh, GeomId, GeomKind, Geometry, GeometryDescriptor};
use crate::geometry::group::{Group, GroupId, GroupValue};

/// Attribute name reserved by the viewer for "no vertex colors".
pub const RESERVED_VALUE_NAME: &str = "[None]";

/// Input of [`SceneGraph::add_free_mesh`].
#[derive(Clone, Debug)]
pub struct FreeMeshSpec {
    /// Geometry name.
    pub name: String,
    /// Group receiving vertex and face data.
    pub group: GroupId,
    /// `N x 3` vertex positions.
    pub vertices: Option<Vec<Vec<f64>>>,
    /// `M x 3` zero-based vertex indices.
    pub faces: Option<Vec<Vec<u32>>>,
    /// Payload file; must already exist when no vertices or faces are given.
    pub cache_file: Option<PathBuf>,
    /// Mesh position.
    pub position: Vec3,
}

impl FreeMeshSpec {
    /// Mesh backed only by an existing payload file.
    pub fn from_cache(
        name: impl Into<String>,
        group: GroupId,
        cache_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            group,
            vertices: None,
            faces: None,
            cache_file: Some(cache_file.into()),
            position: [0.0; 3],
        }
    }

    /// Mesh from inline data.
    pub fn inline(
        name: impl Into<String>,
        group: GroupId,
        vertices: Vec<Vec<f64>>,
        faces: Vec<Vec<u32>>,
    ) -> Self {
        Self {
            name: name.into(),
            group,
            vertices: Some(vertices),
            faces: Some(faces),
            cache_file: None,
            position: [0.0; 3],
        }
    }
}

/// Voxel data of a data cube.
#[derive(Clone, Debug)]
pub enum Voxels {
    /// `values[x][y][z]`.
    Nested(Vec<Vec<Vec<f64>>>),
    /// Values already flattened with `x` varying fastest.
    Flat {
        /// Flattened values.
        values: Vec<f64>,
        /// `(dim_x, dim_y, dim_z)`.
        dim: [usize; 3],
    },
}

impl Voxels {
    /// Flatten with `x` varying fastest (column-major) and report the shape.
    pub fn flatten(self) -> BrainResult<(Vec<f64>, [usize; 3])> {
        match self {
            Self::Flat { values, dim } => {
                let expected = dim.iter().product::<usize>();
                if values.len() != expected {
                    return Err(BrainError::validation(format!(
                        "datacube has {} values but dim {:?} needs {expected}",
                        values.len(),
                        dim
                    )));
                }
                Ok((values, dim))
            }
            Self::Nested(cube) => {
                let nx = cube.len();
                let ny = cube.first().map_or(0, Vec::len);
                let nz = cube.first().and_then(|p| p.first()).map_or(0, Vec::len);
                let ragged = cube
                    .iter()
                    .any(|plane| plane.len() != ny || plane.iter().any(|col| col.len() != nz));
                if ragged {
                    return Err(BrainError::validation("datacube value must be a regular 3D array"));
                }
                let mut out = Vec::with_capacity(nx * ny * nz);
                for z in 0..nz {
                    for y in 0..ny {
                        for plane in &cube {
                            out.push(plane[y][z]);
                        }
                    }
                }
                Ok((out, [nx, ny, nz]))
            }
        }
    }
}

/// Input of [`SceneGraph::add_datacube`].
#[derive(Clone, Debug)]
pub struct DataCubeSpec {
    /// Geometry name.
    pub name: String,
    /// Group receiving the voxel data; a fresh group is created when absent.
    pub group: Option<GroupId>,
    /// Voxels; may be omitted when `cache_file` already exists.
    pub voxels: Option<Voxels>,
    /// Half extent of the bounding box.
    pub half_size: Vec3,
    /// Cube position.
    pub position: Vec3,
    /// Payload file.
    pub cache_file: Option<PathBuf>,
    /// Maintain a digest sidecar for `cache_file`.
    pub use_digest: bool,
}

impl DataCubeSpec {
    /// Cube named `name` with default bounds (half-size 128 on every axis).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: None,
            voxels: None,
            half_size: [128.0; 3],
            position: [0.0; 3],
            cache_file: None,
            use_digest: true,
        }
    }
}

/// Groups and geometries of one scene.
#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    groups: Vec<Group>,
    geoms: Vec<Geometry>,
    cache: JsonCache,
}

impl SceneGraph {
    /// Empty graph with the default cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty graph writing through `cache`.
    pub fn with_cache(cache: JsonCache) -> Self {
        Self {
            cache,
            ..Self::default()
        }
    }

    /// Cache used for every payload this graph writes.
    pub fn cache(&self) -> &JsonCache {
        &self.cache
    }

    /// Add a group.
    pub fn add_group(&mut self, group: Group) -> GroupId {
        self.groups.push(group);
        GroupId(self.groups.len() - 1)
    }

    /// Group by id.
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.0)
    }

    /// Mutable group by id.
    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.get_mut(id.0)
    }

    /// Every group with its id.
    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &Group)> + '_ {
        self.groups.iter().enumerate().map(|(i, g)| (GroupId(i), g))
    }

    fn group_checked(&mut self, id: GroupId) -> BrainResult<&mut Group> {
        self.groups
            .get_mut(id.0)
            .ok_or_else(|| BrainError::validation(format!("unknown group id {}", id.0)))
    }

    /// Add a geometry; its group, if any, must belong to this graph.
    pub fn add_geom(&mut self, geom: Geometry) -> BrainResult<GeomId> {
        if let Some(g) = geom.group {
            self.group_checked(g)?;
        }
        self.geoms.push(geom);
        Ok(GeomId(self.geoms.len() - 1))
    }

    /// Geometry by id.
    pub fn geom(&self, id: GeomId) -> Option<&Geometry> {
        self.geoms.get(id.0)
    }

    /// Mutable geometry by id.
    pub fn geom_mut(&mut self, id: GeomId) -> Option<&mut Geometry> {
        self.geoms.get_mut(id.0)
    }

    fn geom_checked(&mut self, id: GeomId) -> BrainResult<&mut Geometry> {
        self.geoms
            .get_mut(id.0)
            .ok_or_else(|| BrainError::validation(format!("unknown geometry id {}", id.0)))
    }

    /// Every geometry with its id.
    pub fn geoms(&self) -> impl Iterator<Item = (GeomId, &Geometry)> + '_ {
        self.geoms.iter().enumerate().map(|(i, g)| (GeomId(i), g))
    }

    /// Owning group of a geometry.
    pub fn group_of(&self, id: GeomId) -> Option<&Group> {
        self.geom(id)
            .and_then(|g| g.group)
            .and_then(|gid| self.group(gid))
    }

    /// Viewer descriptor of a geometry.
    pub fn geom_descriptor(&self, id: GeomId) -> Option<GeometryDescriptor> {
        self.geom(id).map(|g| g.descriptor(self.group_of(id)))
    }

    /// Add a free-form mesh.
    ///
    /// With inline vertices and faces the data is stored in the group, through `cache_file` when
    /// given. Without inline data `cache_file` must already exist and is referenced as is.
    pub fn add_free_mesh(&mut self, spec: FreeMeshSpec) -> BrainResult<GeomId> {
        let FreeMeshSpec {
            name,
            group,
            vertices,
            faces,
            cache_file,
            position,
        } = spec;
        let vert_key = format!("free_vertices_{name}");
        let face_key = format!("free_faces_{name}");
        let cache = self.cache.clone();

        let cache_file = cache_file.as_deref().map(absolute).transpose()?;

        let (vert_value, face_value): (GroupValue, GroupValue) = match (vertices, faces) {
            (Some(vertices), Some(faces)) => {
                check_mesh(&vertices, &faces)?;
                match &cache_file {
                    Some(path) => {
                        let mut payload = Map::new();
                        payload.insert(vert_key.clone(), json!(vertices));
                        payload.insert(face_key.clone(), json!(faces));
                        let rec = cache.put(path, &payload, None)?;
                        (rec.clone().into(), rec.into())
                    }
                    None => (json!(vertices).into(), json!(faces).into()),
                }
            }
            _ => {
                let Some(path) = cache_file.as_deref().filter(|p| p.is_file()) else {
                    return Err(BrainError::validation(
                        "either cache_file must exist or (vertex, face) are provided",
                    ));
                };
                let rec = CacheRecord::existing(path)?;
                (rec.clone().into(), rec.into())
            }
        };

        let g = self.group_checked(group)?;
        g.set_data(vert_key, vert_value);
        g.set_data(face_key, face_value);

        let geom = Geometry::new(
            name,
            GeomKind::Free(FreeMesh {
                cache_file,
                ..FreeMesh::default()
            }),
        )
        .with_group(group)
        .with_position(position);
        self.add_geom(geom)
    }

    /// Add a data cube.
    ///
    /// Voxels, shape and half-size are stored in the group under `datacube_value_<name>`,
    /// `datacube_dim_<name>` and `datacube_half_size_<name>`, always as cache entries.
    pub fn add_datacube(&mut self, spec: DataCubeSpec) -> BrainResult<GeomId> {
        let DataCubeSpec {
            name,
            group,
            voxels,
            half_size,
            position,
            cache_file,
            use_digest,
        } = spec;
        let group = match group {
            Some(g) => {
                self.group_checked(g)?;
                g
            }
            None => self.add_group(Group::new(format!("default - {name}"))),
        };
        let value_key = format!("datacube_value_{name}");
        let dim_key = format!("datacube_dim_{name}");
        let half_key = format!("datacube_half_size_{name}");
        let cache = self.cache.clone();

        let cache_file = match (&cache_file, voxels) {
            (Some(path), None) => {
                let rec = CacheRecord::existing(path).map_err(|_| {
                    BrainError::validation(format!(
                        "cache_file '{}' does not exist and value is missing",
                        path.display()
                    ))
                })?;
                let g = self.group_checked(group)?;
                for key in [&value_key, &dim_key, &half_key] {
                    g.set_data(key.clone(), rec.clone());
                }
                Some(rec.absolute_path)
            }
            (Some(path), Some(voxels)) => {
                let (values, dim) = voxels.flatten()?;
                let mut payload = Map::new();
                payload.insert(value_key.clone(), json!(values));
                payload.insert(dim_key.clone(), json!(dim));
                payload.insert(half_key.clone(), json!(half_size));
                let rec = cache.put_with(
                    path,
                    &payload,
                    &PutOptions {
                        use_digest,
                        ..PutOptions::default()
                    },
                )?;
                let g = self.group_checked(group)?;
                for key in [&value_key, &dim_key, &half_key] {
                    g.set_data(key.clone(), rec.clone());
                }
                Some(rec.absolute_path)
            }
            (None, Some(voxels)) => {
                let (values, dim) = voxels.flatten()?;
                let g = self.group_checked(group)?;
                g.set_data_cached(value_key, json!(values), &cache)?;
                g.set_data_cached(dim_key, json!(dim), &cache)?;
                g.set_data_cached(half_key, json!(half_size), &cache)?;
                None
            }
            (None, None) => {
                return Err(BrainError::validation(
                    "datacube needs either value or an existing cache_file",
                ));
            }
        };

        let geom = Geometry::new(name, GeomKind::DataCube(DataCube { cache_file }))
            .with_group(group)
            .with_position(position);
        self.add_geom(geom)
    }

    /// Set or clear the time series of attribute `name` on any geometry.
    ///
    /// Free meshes take dense per-vertex values written to a payload next to their cache file;
    /// every other variant follows [`Geometry::set_value`].
    pub fn set_value(
        &mut self,
        id: GeomId,
        name: &str,
        values: KeyValues,
        time_stamp: Option<Vec<f64>>,
    ) -> BrainResult<()> {
        if matches!(self.geom_checked(id)?.kind, GeomKind::Free(_)) {
            return self.set_free_value(id, name, values, time_stamp.unwrap_or_default());
        }
        self.geom_checked(id)?.set_value(name, values, time_stamp)?;
        Ok(())
    }

    fn set_free_value(
        &mut self,
        id: GeomId,
        name: &str,
        values: KeyValues,
        time: Vec<f64>,
    ) -> BrainResult<()> {
        let cache = self.cache.clone();
        let geom = self.geom_checked(id)?;
        let GeomKind::Free(mesh) = &geom.kind else {
            return Err(BrainError::unsupported(geom.type_tag(), "set_free_value"));
        };
        let Some(cache_file) = mesh.cache_file.clone() else {
            return Err(BrainError::validation(
                "must enable cache_file to set values for a free geometry",
            ));
        };
        let name = name.trim();
        if name == RESERVED_VALUE_NAME {
            return Err(BrainError::validation(format!(
                "free geometry cannot have variable name \"{RESERVED_VALUE_NAME}\", it is reserved"
            )));
        }
        if values.is_empty() {
            geom.remove_keyframe(name);
            return Ok(());
        }
        let Some(group) = geom.group else {
            return Err(BrainError::validation(format!(
                "free geometry '{}' has no group",
                geom.name
            )));
        };

        let mut kf = Keyframe::dense(name, values, time)?;
        let path = vertex_color_path(&cache_file, name);
        let record_name = format!("free_vertex_colors_{name}_{}", geom.name);
        let mut record = kf.materialize(&cache, &path, &record_name)?;
        record.is_new_cache = false;
        geom.put_keyframe(kf);

        self.group_checked(group)?.set_data(record_name, record);
        Ok(())
    }

    /// Make `right` share the group of `left`, copying the right group's entries across.
    ///
    /// Entries of the right group overwrite equal keys of the left group. Returns the shared
    /// group.
    pub fn share_group(&mut self, left: GeomId, right: GeomId) -> BrainResult<GroupId> {
        let lg = self.geom_checked(left)?.group;
        let rg = self.geom_checked(right)?.group;
        let (Some(lg), Some(rg)) = (lg, rg) else {
            return Err(BrainError::validation("both geometries need a group to share one"));
        };
        if lg != rg {
            let donor = self.group_checked(rg)?.clone();
            self.group_checked(lg)?.absorb(&donor);
            self.geom_checked(right)?.group = Some(lg);
        }
        Ok(lg)
    }

    /// Data visible from a geometry: its keyframe values first, then its group's entries.
    pub fn get_data(
        &mut self,
        id: GeomId,
        key: &str,
        force_reload: bool,
    ) -> BrainResult<Option<Value>> {
        let geom = self.geom_checked(id)?;
        if let Some(kf) = geom.keyframe(key) {
            return Ok(Some(serde_json::to_value(kf.values())?));
        }
        let Some(gid) = geom.group else {
            return Ok(None);
        };
        self.group_checked(gid)?.get_data(key, force_reload)
    }

    /// Set the position of a geometry from a caller-supplied slice.
    pub fn set_position(&mut self, id: GeomId, position: &[f64]) -> BrainResult<()> {
        let position = vec3_from_slice(position)?;
        self.geom_checked(id)?.position = position;
        Ok(())
    }
}

fn check_mesh(vertices: &[Vec<f64>], faces: &[Vec<u32>]) -> BrainResult<()> {
    if vertices.iter().any(|v| v.len() != 3) {
        return Err(BrainError::validation(
            "each element of `vertex` must be a list of 3, for example [[1,2,3], [1,3,4], ...]",
        ));
    }
    if faces.iter().any(|f| f.len() != 3) {
        return Err(BrainError::validation(
            "each element of `face` must be a list of 3, for example [[0,1,2], [0,1,3], ...]",
        ));
    }
    let n = vertices.len();
    if let Some(bad) = faces.iter().flatten().find(|&&i| i as usize >= n) {
        return Err(BrainError::validation(format!(
            "face index {bad} out of range for {n} vertices"
        )));
    }
    Ok(())
}

fn vertex_color_path(cache_file: &Path, name: &str) -> PathBuf {
    let file = cache_file
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file.strip_suffix(".json").unwrap_or(&file);
    cache_file.with_file_name(format!("{stem}__{name}.json"))
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/graph.rs"]
mod tests;
