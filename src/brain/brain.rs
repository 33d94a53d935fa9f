//! One subject's brain: transforms, surfaces, volumes and rendering.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::{Value, json};

use crate::brain::surface::{BrainSurface, MeshType, SURFACE_TYPES, hemisphere_offset};
use crate::brain::volume::BrainVolume;
use crate::cache::store::{CacheRecord, JsonCache, absolute, read_json};
use crate::foundation::core::{Mat4, Vec3};
use crate::foundation::error::{BrainError, BrainResult};
use crate::geometry::geom::{GeomId, Geometry};
use crate::geometry::graph::{DataCubeSpec, FreeMeshSpec, SceneGraph};
use crate::geometry::group::{Group, GroupId};
use crate::scene::assemble::{SceneBundle, assemble};
use crate::scene::options::SceneOptions;
use crate::transform::anatomical::{AnatomicalTransforms, parse_talairach_xfm};
use crate::transform::matrix::{from_rows, spread_4x4};

/// Sub-directory of a subject directory holding prepared JSON caches.
pub const CACHE_DIR: &str = "RAVEpy";
/// Subject-level sidecar holding the anatomical matrices.
pub const COMMON_DIGEST: &str = "common.pydigest";

/// Which surfaces or volumes to collect.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    /// Every loaded item.
    #[default]
    All,
    /// Nothing.
    Nothing,
    /// Named items, in the given order; unknown names are skipped.
    Only(Vec<String>),
}

impl Selection {
    fn pick<'a, T>(&self, items: &'a BTreeMap<String, T>) -> Vec<&'a T> {
        match self {
            Self::All => items.values().collect(),
            Self::Nothing => Vec::new(),
            Self::Only(names) => names.iter().filter_map(|n| items.get(n)).collect(),
        }
    }
}

/// Options of [`Brain::from_cache_dir`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadOptions {
    /// Surface types to load.
    pub surfaces: Vec<String>,
    /// Curvature attached to every surface as default vertex colors.
    pub curvature: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            surfaces: vec!["pial".to_string()],
            curvature: "sulc".to_string(),
        }
    }
}

/// One subject: anatomical transforms, surfaces, volumes and a marker carrying misc data.
#[derive(Clone, Debug)]
pub struct Brain {
    subject_code: String,
    transforms: AnatomicalTransforms,
    graph: SceneGraph,
    surfaces: BTreeMap<String, BrainSurface>,
    volumes: BTreeMap<String, BrainVolume>,
    misc: GeomId,
    misc_group: GroupId,
    cache_dir: Option<PathBuf>,
}

impl Brain {
    /// Empty brain with identity transforms.
    pub fn new(subject_code: impl Into<String>) -> BrainResult<Self> {
        Self::with_cache(subject_code, JsonCache::new())
    }

    /// Empty brain whose graph writes through `cache`.
    pub fn with_cache(subject_code: impl Into<String>, cache: JsonCache) -> BrainResult<Self> {
        let subject_code = subject_code.into();
        let mut graph = SceneGraph::with_cache(cache);
        let misc_group =
            graph.add_group(Group::new(format!("_internal_group_data_{subject_code}")));
        let misc = graph
            .add_geom(Geometry::blank(format!("_misc_{subject_code}")).with_group(misc_group))?;
        Ok(Self {
            subject_code,
            transforms: AnatomicalTransforms::default(),
            graph,
            surfaces: BTreeMap::new(),
            volumes: BTreeMap::new(),
            misc,
            misc_group,
            cache_dir: None,
        })
    }

    /// Load a prepared subject directory.
    ///
    /// `<path>/RAVEpy/common.pydigest` supplies the matrices; without an `xfm` entry the
    /// talairach transform is read from `mri/transforms/talairach.xfm` when present. The T1
    /// volume, surfaces and curvatures that fail to load are skipped with a warning.
    pub fn from_cache_dir(
        subject_code: impl Into<String>,
        path: impl AsRef<Path>,
        opts: &LoadOptions,
    ) -> BrainResult<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(BrainError::validation(format!(
                "must specify a valid subject directory, '{}' does not exist",
                path.display()
            )));
        }
        let root = absolute(path)?;
        let cache_dir = root.join(CACHE_DIR);
        if !cache_dir.is_dir() {
            return Err(BrainError::validation(format!(
                "'{}' has no {CACHE_DIR} directory; import the subject first",
                root.display()
            )));
        }

        let mut brain = Self::new(subject_code)?;
        brain.cache_dir = Some(cache_dir.clone());

        let common = read_json(cache_dir.join(COMMON_DIGEST))?;
        if let Some(v) = common.get("Norig") {
            brain.transforms.norig = matrix_field(v)?;
        }
        if let Some(v) = common.get("Torig") {
            brain.transforms.torig = matrix_field(v)?;
        }
        match common.get("xfm") {
            Some(v) => brain.transforms.xfm = matrix_field(v)?,
            None => {
                let xfm = root.join("mri").join("transforms").join("talairach.xfm");
                if xfm.is_file() {
                    let text = std::fs::read_to_string(&xfm)
                        .with_context(|| format!("read talairach transform '{}'", xfm.display()))?;
                    brain.transforms.xfm = parse_talairach_xfm(&text);
                }
            }
        }

        if let Err(e) = brain.load_volume("T1") {
            tracing::warn!(error = %e, "failed to load T1 volume");
        }
        for surface_type in &opts.surfaces {
            if let Err(e) = brain.load_surface_with_color(surface_type, &opts.curvature) {
                tracing::warn!(surface_type = %surface_type, error = %e, "failed to load surface");
            }
        }
        tracing::debug!(
            subject = %brain.subject_code,
            surfaces = brain.surfaces.len(),
            "loaded subject"
        );
        Ok(brain)
    }

    fn load_surface_with_color(&mut self, surface_type: &str, curvature: &str) -> BrainResult<()> {
        self.load_surface(surface_type)?;
        self.load_surface_color(surface_type, curvature)
    }

    fn cache_file(&self, name: &str) -> BrainResult<PathBuf> {
        let Some(dir) = &self.cache_dir else {
            return Err(BrainError::validation(format!(
                "brain '{}' was not loaded from a subject directory",
                self.subject_code
            )));
        };
        Ok(dir.join(format!("{}_{name}.json", self.subject_code)))
    }

    /// Load both hemispheres of `surface_type` from the subject cache directory.
    pub fn load_surface(&mut self, surface_type: &str) -> BrainResult<&BrainSurface> {
        if !SURFACE_TYPES.contains(&surface_type) {
            return Err(BrainError::validation(format!(
                "surface type must be one of the following: {}",
                SURFACE_TYPES.join(", ")
            )));
        }
        let s = self.subject_code.clone();
        let left_file = self.cache_file(&format!("fs_lh_{surface_type}"))?;
        let right_file = self.cache_file(&format!("fs_rh_{surface_type}"))?;

        let gid = self
            .graph
            .add_group(Group::new(format!("Surface - {surface_type} ({s})")));
        let left = self.graph.add_free_mesh(FreeMeshSpec::from_cache(
            format!("FreeSurfer Left Hemisphere - {surface_type} ({s})"),
            gid,
            left_file,
        ))?;
        let right = self.graph.add_free_mesh(FreeMeshSpec::from_cache(
            format!("FreeSurfer Right Hemisphere - {surface_type} ({s})"),
            gid,
            right_file,
        ))?;
        let surface =
            BrainSurface::new(&mut self.graph, &s, surface_type, MeshType::Fs, left, right)?;
        self.add_surface(surface)
    }

    /// Load a volume from the subject cache directory. Only `T1` is provided.
    pub fn load_volume(&mut self, volume_type: &str) -> BrainResult<&BrainVolume> {
        if volume_type != "T1" {
            return Err(BrainError::validation(format!(
                "volume type '{volume_type}' is not supported, only T1"
            )));
        }
        let s = self.subject_code.clone();
        let gid = self
            .graph
            .add_group(Group::new(format!("Volume - {volume_type} ({s})")));
        let mut spec = DataCubeSpec::new(format!("{volume_type} ({s})"));
        spec.group = Some(gid);
        spec.cache_file = Some(self.cache_file("t1")?);
        let cube = self.graph.add_datacube(spec)?;
        let volume = BrainVolume::new(&mut self.graph, &s, volume_type, cube)?;
        self.add_volume(volume)
    }

    /// Reference the curvature payloads of both hemispheres as default vertex colors of
    /// `surface_type`.
    pub fn load_surface_color(&mut self, surface_type: &str, curvature: &str) -> BrainResult<()> {
        let s = self.subject_code.clone();
        let left_name = format!("Curvature - lh.{curvature} ({s})");
        let right_name = format!("Curvature - rh.{curvature} ({s})");

        if let Some(gid) = self.surfaces.get(surface_type).map(BrainSurface::group)
            && let Some(group) = self.graph.group_mut(gid)
        {
            group.set_data("curvature", json!(curvature));
            group.set_data(format!("default_vertex_lh_{surface_type}"), json!(left_name));
            group.set_data(format!("default_vertex_rh_{surface_type}"), json!(right_name));
        }

        let left = self.cache_file(&format!("fs_lh_{curvature}"))?;
        let right = self.cache_file(&format!("fs_rh_{curvature}"))?;
        self.add_vertex_color(left_name, left, true)?;
        self.add_vertex_color(right_name, right, true)?;
        Ok(())
    }

    /// Subject code.
    pub fn subject_code(&self) -> &str {
        &self.subject_code
    }

    /// The scene graph holding every geometry of this brain.
    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Mutable scene graph, for attaching extra geometries or values.
    pub fn graph_mut(&mut self) -> &mut SceneGraph {
        &mut self.graph
    }

    /// Anatomical matrices.
    pub fn transforms(&self) -> &AnatomicalTransforms {
        &self.transforms
    }

    /// Set `xfm` from 12 or 16 row-major values.
    pub fn set_xfm(&mut self, values: &[f64]) -> BrainResult<()> {
        self.transforms.xfm = spread_4x4(values)?;
        Ok(())
    }

    /// Set `Norig` from 12 or 16 row-major values.
    pub fn set_norig(&mut self, values: &[f64]) -> BrainResult<()> {
        self.transforms.norig = spread_4x4(values)?;
        Ok(())
    }

    /// Set `Torig` from 12 or 16 row-major values.
    pub fn set_torig(&mut self, values: &[f64]) -> BrainResult<()> {
        self.transforms.torig = spread_4x4(values)?;
        Ok(())
    }

    /// tkr-RAS to MNI305 transform.
    pub fn vox2vox_mni305(&self) -> BrainResult<Mat4> {
        self.transforms.vox2vox_mni305()
    }

    /// Scanner origin in tkr-RAS space.
    pub fn scanner_center(&self) -> BrainResult<Vec3> {
        self.transforms.scanner_center()
    }

    /// Register a surface, replacing any surface of the same type.
    ///
    /// Standard meshes are centered on the scanner origin with inflated and sphere hemispheres
    /// pushed apart; FreeSurfer meshes sit at the origin.
    pub fn add_surface(&mut self, mut surface: BrainSurface) -> BrainResult<&BrainSurface> {
        let (group_pos, offset) = match surface.mesh_type() {
            MeshType::Std141 => (
                self.scanner_center()?,
                hemisphere_offset(surface.surface_type()),
            ),
            MeshType::Fs => ([0.0; 3], 0.0),
        };
        surface.set_group_position(&mut self.graph, group_pos)?;
        self.graph.set_position(surface.left(), &[-offset, 0.0, 0.0])?;
        self.graph.set_position(surface.right(), &[offset, 0.0, 0.0])?;
        surface.set_subject_code(&mut self.graph, &self.subject_code)?;

        let key = surface.surface_type().to_string();
        self.surfaces.insert(key.clone(), surface);
        self.surfaces
            .get(&key)
            .ok_or_else(|| BrainError::validation(format!("surface '{key}' was not registered")))
    }

    /// Unregister surfaces by type, returning the ones that existed.
    pub fn remove_surface(&mut self, surface_types: &[&str]) -> Vec<BrainSurface> {
        surface_types
            .iter()
            .filter_map(|t| self.surfaces.remove(*t))
            .collect()
    }

    /// Register a volume, replacing any volume of the same type.
    pub fn add_volume(&mut self, mut volume: BrainVolume) -> BrainResult<&BrainVolume> {
        volume.set_subject_code(&mut self.graph, &self.subject_code)?;
        let key = volume.volume_type().to_string();
        self.volumes.insert(key.clone(), volume);
        self.volumes
            .get(&key)
            .ok_or_else(|| BrainError::validation(format!("volume '{key}' was not registered")))
    }

    /// Unregister volumes by type, returning the ones that existed.
    pub fn remove_volume(&mut self, volume_types: &[&str]) -> Vec<BrainVolume> {
        volume_types
            .iter()
            .filter_map(|t| self.volumes.remove(*t))
            .collect()
    }

    /// Reference a vertex-color payload under `name` in the misc group.
    ///
    /// The file is not read or checked here; `lazy` tells the viewer to load it on demand.
    pub fn add_vertex_color(
        &mut self,
        name: impl Into<String>,
        path: impl AsRef<Path>,
        lazy: bool,
    ) -> BrainResult<()> {
        let record = CacheRecord::reference(path)?.with_lazy(lazy);
        let group = self
            .graph
            .group_mut(self.misc_group)
            .ok_or_else(|| BrainError::validation("misc group is missing"))?;
        group.set_data(name, record);
        Ok(())
    }

    /// Registered surface of `surface_type`.
    pub fn surface(&self, surface_type: &str) -> Option<&BrainSurface> {
        self.surfaces.get(surface_type)
    }

    /// Registered volume of `volume_type`.
    pub fn volume(&self, volume_type: &str) -> Option<&BrainVolume> {
        self.volumes.get(volume_type)
    }

    /// Registered surface types, ordered by name.
    pub fn surface_types(&self) -> Vec<&str> {
        self.surfaces.keys().map(String::as_str).collect()
    }

    /// Mesh type of every registered surface.
    pub fn surface_mesh_types(&self) -> BTreeMap<&str, MeshType> {
        self.surfaces
            .iter()
            .map(|(k, s)| (k.as_str(), s.mesh_type()))
            .collect()
    }

    /// Registered volume types, ordered by name.
    pub fn volume_types(&self) -> Vec<&str> {
        self.volumes.keys().map(String::as_str).collect()
    }

    /// The misc marker geometry.
    pub fn misc(&self) -> GeomId {
        self.misc
    }

    /// Geometries to render: the misc marker, then volumes, then left and right hemispheres.
    pub fn get_geometries(&self, volumes: &Selection, surfaces: &Selection) -> Vec<GeomId> {
        let mut out = vec![self.misc];
        out.extend(volumes.pick(&self.volumes).into_iter().map(BrainVolume::geom));
        for s in surfaces.pick(&self.surfaces) {
            out.push(s.left());
            out.push(s.right());
        }
        out
    }

    /// Matrices of this subject keyed by subject code.
    pub fn global_data(&self) -> BrainResult<Value> {
        let t = &self.transforms;
        Ok(json!({
            self.subject_code.clone(): {
                "Norig": t.norig.rows(),
                "Torig": t.torig.rows(),
                "xfm": t.xfm.rows(),
                "vox2vox_MNI305": self.vox2vox_mni305()?.rows(),
                "scanner_center": self.scanner_center()?,
            }
        }))
    }

    /// `base` completed for this brain: standard control presets, the subject's global data,
    /// and side canvases hidden when no volume is registered.
    pub fn render_options(&self, base: SceneOptions) -> BrainResult<SceneOptions> {
        let mut opts = base.with_brain_presets();
        if self.volumes.is_empty() {
            opts.side_display = false;
        }
        if let Value::Object(m) = self.global_data()? {
            opts.global_data.extend(m);
        }
        Ok(opts)
    }

    /// Assemble the selected geometries into a scene bundle.
    pub fn render(
        &self,
        volumes: &Selection,
        surfaces: &Selection,
        base: SceneOptions,
    ) -> BrainResult<SceneBundle> {
        let ids = self.get_geometries(volumes, surfaces);
        let opts = self.render_options(base)?;
        assemble(&self.graph, &ids, &opts)
    }
}

impl fmt::Display for Brain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Brain - {}", self.subject_code)?;
        writeln!(f, "  Surfaces: {}", self.surface_types().join(", "))?;
        write!(f, "  Volumes:  {}", self.volume_types().join(", "))
    }
}

/// Matrix stored either as nested rows or as 12/16 flat values.
fn matrix_field(v: &Value) -> BrainResult<Mat4> {
    if v.as_array().is_some_and(|a| a.iter().all(Value::is_array)) {
        let rows: Vec<Vec<f64>> = serde_json::from_value(v.clone())?;
        return from_rows(&rows);
    }
    let flat: Vec<f64> = serde_json::from_value(v.clone())?;
    spread_4x4(&flat)
}

#[cfg(test)]
#[path = "../../tests/unit/brain/brain.rs"]
mod tests;
