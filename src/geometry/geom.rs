//! Geometry variants and their serialized descriptors.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::Value;

use crate::animation::colormap::AnimationSource;
use crate::animation::keyframe::{KeyValues, Keyframe, KeyframeDescriptor};
use crate::foundation::core::{Layer, LayerSet, Vec3};
use crate::foundation::error::{BrainError, BrainResult};
use crate::geometry::group::{Group, GroupId};

/// Stable index of a [`Geometry`] inside a [`crate::SceneGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GeomId(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Brain hemisphere of a mesh or electrode.
pub enum Hemisphere {
    /// Left hemisphere.
    Left,
    /// Right hemisphere.
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq)]
/// Sphere tessellation.
pub struct SphereShape {
    /// Radius in scene units.
    pub radius: f64,
    /// Horizontal segments.
    pub width_segments: u32,
    /// Vertical segments.
    pub height_segments: u32,
}

impl SphereShape {
    /// Sphere of `radius` with the default 10x6 tessellation.
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            width_segments: 10,
            height_segments: 6,
        }
    }
}

impl Default for SphereShape {
    fn default() -> Self {
        Self::new(5.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
/// Anatomical metadata of an electrode contact.
pub struct ElectrodeInfo {
    /// Contact sits on the cortical surface.
    pub is_surface_electrode: bool,
    /// Position comes from a template brain.
    pub use_template: bool,
    /// Surface the contact snaps to.
    pub surface_type: String,
    /// Hemisphere, if known.
    pub hemisphere: Option<Hemisphere>,
    /// Nearest surface vertex, `-1` when unknown.
    pub vertex_number: i64,
    /// Position in MNI305 space.
    pub mni305_position: Vec3,
}

impl Default for ElectrodeInfo {
    fn default() -> Self {
        Self {
            is_surface_electrode: true,
            use_template: false,
            surface_type: "pial".to_string(),
            hemisphere: None,
            vertex_number: -1,
            mni305_position: [0.0; 3],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
/// Mesh whose vertices and faces live in its group.
pub struct FreeMesh {
    /// Payload file holding vertices and faces; required for vertex colors.
    pub cache_file: Option<PathBuf>,
    /// Hemisphere of a brain surface.
    pub hemisphere: Option<Hemisphere>,
    /// Surface type of a brain surface.
    pub surface_type: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
/// Volume whose voxels, shape and half-size live in its group.
pub struct DataCube {
    /// Payload file holding the voxel data, if cached.
    pub cache_file: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
/// Variant-specific part of a geometry.
pub enum GeomKind {
    /// Plain geometry with no shape.
    Abstract,
    /// Sphere marker.
    Sphere(SphereShape),
    /// Electrode contact drawn as a sphere.
    Electrode(SphereShape, ElectrodeInfo),
    /// Free-form triangle mesh.
    Free(FreeMesh),
    /// 3D scalar volume.
    DataCube(DataCube),
    /// Invisible carrier of group data.
    Blank,
}

impl GeomKind {
    /// Type tag understood by the viewer.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Abstract => "abstract",
            Self::Sphere(_) | Self::Electrode(..) => "sphere",
            Self::Free(_) => "free",
            Self::DataCube(_) => "datacube",
            Self::Blank => "blank",
        }
    }
}

/// One renderable object.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    /// Display name.
    pub name: String,
    /// Position relative to the group origin.
    pub position: Vec3,
    /// Visibility layers.
    pub layer: LayerSet,
    /// Owning group.
    pub group: Option<GroupId>,
    /// Static value shown by the viewer.
    pub value: Option<Value>,
    /// Time stamps of `value`.
    pub time_stamp: Option<Vec<f64>>,
    /// Whether the viewer reacts to clicks.
    pub clickable: bool,
    /// Free-form text shown on selection.
    pub custom_info: String,
    /// Subject; falls back to the group's subject in descriptors.
    pub subject_code: Option<String>,
    /// Viewer hint that the geometry data is cached.
    pub use_cache: bool,
    /// Variant payload.
    pub kind: GeomKind,
    keyframes: BTreeMap<String, Keyframe>,
}

impl Geometry {
    /// Geometry of `kind` at the origin with the variant's default layer and clickability.
    pub fn new(name: impl Into<String>, kind: GeomKind) -> Self {
        let (layer, clickable) = match kind {
            GeomKind::Free(_) => (Layer::MAIN_CAMERA, false),
            GeomKind::DataCube(_) => (Layer::INVISIBLE, false),
            GeomKind::Blank => (Layer::MARKER, false),
            _ => (Layer::MAIN_CAMERA, true),
        };
        Self {
            name: name.into(),
            position: [0.0; 3],
            layer: LayerSet::single(layer),
            group: None,
            value: None,
            time_stamp: None,
            clickable,
            custom_info: String::new(),
            subject_code: None,
            use_cache: false,
            kind,
            keyframes: BTreeMap::new(),
        }
    }

    /// Plain geometry.
    pub fn abstract_geom(name: impl Into<String>) -> Self {
        Self::new(name, GeomKind::Abstract)
    }

    /// Sphere of `radius`.
    pub fn sphere(name: impl Into<String>, radius: f64) -> Self {
        Self::new(name, GeomKind::Sphere(SphereShape::new(radius)))
    }

    /// Electrode contact of `radius` with default anatomical metadata.
    pub fn electrode(name: impl Into<String>, radius: f64) -> Self {
        Self::new(
            name,
            GeomKind::Electrode(SphereShape::new(radius), ElectrodeInfo::default()),
        )
    }

    /// Invisible data carrier.
    pub fn blank(name: impl Into<String>) -> Self {
        Self::new(name, GeomKind::Blank)
    }

    /// Same geometry at `position`.
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Same geometry on other layers.
    pub fn with_layer(mut self, layer: LayerSet) -> Self {
        self.layer = layer;
        self
    }

    /// Same geometry owned by `group`.
    pub fn with_group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }

    /// Type tag understood by the viewer.
    pub fn type_tag(&self) -> &'static str {
        self.kind.type_tag()
    }

    /// Set or clear the time series of attribute `name`.
    ///
    /// Empty `values` removes the attribute. Several values need one time stamp each; a single
    /// value without a matching stamp is placed at time 0. If every value is non-finite the
    /// attribute is removed. Free meshes go through [`crate::SceneGraph::set_value`]; blank markers
    /// and data cubes carry no time series.
    pub fn set_value(
        &mut self,
        name: &str,
        values: KeyValues,
        time_stamp: Option<Vec<f64>>,
    ) -> BrainResult<Option<&Keyframe>> {
        self.check_animatable("set_value")?;
        if values.is_empty() {
            self.keyframes.remove(name);
            return Ok(None);
        }
        let time = match time_stamp {
            Some(t) if values.len() > 1 || t.len() == 1 => t,
            None if values.len() > 1 => {
                return Err(BrainError::LengthMismatch {
                    values: values.len(),
                    times: 0,
                });
            }
            _ => vec![0.0],
        };
        let kf = Keyframe::new(name, values, time)?;
        self.insert_keyframe(kf)
    }

    /// Install a prebuilt keyframe under its own name; an empty keyframe removes the attribute.
    pub fn insert_keyframe(&mut self, kf: Keyframe) -> BrainResult<Option<&Keyframe>> {
        self.check_animatable("set_value")?;
        Ok(self.put_keyframe(kf))
    }

    pub(crate) fn put_keyframe(&mut self, kf: Keyframe) -> Option<&Keyframe> {
        let name = kf.name().to_string();
        if kf.is_empty() {
            self.keyframes.remove(&name);
            return None;
        }
        self.keyframes.insert(name.clone(), kf);
        self.keyframes.get(&name)
    }

    pub(crate) fn remove_keyframe(&mut self, name: &str) -> Option<Keyframe> {
        self.keyframes.remove(name)
    }

    fn check_animatable(&self, op: &'static str) -> BrainResult<()> {
        match self.kind {
            GeomKind::Free(_) | GeomKind::DataCube(_) | GeomKind::Blank => {
                Err(BrainError::unsupported(self.type_tag(), op))
            }
            _ => Ok(()),
        }
    }

    /// Keyframe of attribute `name`.
    pub fn keyframe(&self, name: &str) -> Option<&Keyframe> {
        self.keyframes.get(name)
    }

    /// All keyframes, ordered by attribute name.
    pub fn keyframes(&self) -> &BTreeMap<String, Keyframe> {
        &self.keyframes
    }

    /// Names of animated attributes.
    pub fn animation_types(&self) -> impl Iterator<Item = &str> + '_ {
        self.keyframes.keys().map(String::as_str)
    }

    /// Serializable view of this geometry; `group` must be the owning group, if any.
    pub fn descriptor(&self, group: Option<&Group>) -> GeometryDescriptor {
        let group_ref = group
            .map(|g| GroupRef {
                group_name: Some(g.name.clone()),
                group_layer: Some(g.layer.clone()),
                group_position: Some(g.position),
            })
            .unwrap_or_default();
        let subject_code = self
            .subject_code
            .clone()
            .or_else(|| group.and_then(|g| g.subject_code.clone()));

        GeometryDescriptor {
            name: self.name.clone(),
            type_tag: self.type_tag().to_string(),
            time_stamp: self.time_stamp.clone(),
            position: self.position,
            value: self.value.clone(),
            clickable: self.clickable,
            layer: self.layer.clone(),
            group: group_ref,
            use_cache: self.use_cache,
            custom_info: self.custom_info.clone(),
            subject_code,
            keyframes: self
                .keyframes
                .iter()
                .map(|(k, kf)| (k.clone(), kf.descriptor()))
                .collect(),
            extra: VariantFields::from_kind(&self.kind),
        }
    }
}

impl AnimationSource for Geometry {
    fn animation_time_range(&self, name: &str) -> Option<[f64; 2]> {
        self.keyframes.get(name).map(Keyframe::time_range)
    }

    fn animation_value_range(&self, name: &str) -> Option<[f64; 2]> {
        self.keyframes.get(name).and_then(Keyframe::value_range)
    }

    fn animation_value_names(&self, name: &str) -> Option<&[String]> {
        self.keyframes.get(name).and_then(Keyframe::value_names)
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
/// Owning group summary; serializes as `{}` for ungrouped geometries.
pub struct GroupRef {
    /// Group name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    /// Group layers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_layer: Option<LayerSet>,
    /// Group origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_position: Option<Vec3>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
/// Fields only some variants carry.
pub struct VariantFields {
    /// Sphere radius.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    /// Sphere horizontal segments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_segments: Option<u32>,
    /// Sphere vertical segments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_segments: Option<u32>,
    /// Mesh or electrode hemisphere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hemisphere: Option<Hemisphere>,
    /// Mesh or electrode surface type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_type: Option<String>,
    /// Set on electrodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_electrode: Option<bool>,
    /// Electrode sits on the surface.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_surface_electrode: Option<bool>,
    /// Electrode uses template coordinates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_template: Option<bool>,
    /// Nearest surface vertex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertex_number: Option<i64>,
    /// Electrode position in MNI305 space.
    #[serde(
        default,
        rename = "MNI305_position",
        skip_serializing_if = "Option::is_none"
    )]
    pub mni305_position: Option<Vec3>,
    /// Electrode is below the cortical surface.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_cortical: Option<bool>,
    /// Hemisphere meshes searched when snapping the electrode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_geoms: Option<Hemisphere>,
}

impl VariantFields {
    fn sphere(s: &SphereShape) -> Self {
        Self {
            radius: Some(s.radius),
            width_segments: Some(s.width_segments),
            height_segments: Some(s.height_segments),
            ..Self::default()
        }
    }

    fn from_kind(kind: &GeomKind) -> Self {
        match kind {
            GeomKind::Sphere(s) => Self::sphere(s),
            GeomKind::Electrode(s, e) => Self {
                hemisphere: e.hemisphere,
                surface_type: Some(e.surface_type.clone()),
                is_electrode: Some(true),
                is_surface_electrode: Some(e.is_surface_electrode),
                use_template: Some(e.use_template),
                vertex_number: Some(e.vertex_number),
                mni305_position: Some(e.mni305_position),
                sub_cortical: Some(!e.is_surface_electrode),
                search_geoms: e.hemisphere,
                ..Self::sphere(s)
            },
            GeomKind::Free(m) => Self {
                hemisphere: m.hemisphere,
                surface_type: m.surface_type.clone(),
                ..Self::default()
            },
            GeomKind::Abstract | GeomKind::DataCube(_) | GeomKind::Blank => Self::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Geometry as consumed by the viewer.
pub struct GeometryDescriptor {
    /// Display name.
    pub name: String,
    /// Variant tag.
    #[serde(rename = "type")]
    pub type_tag: String,
    /// Time stamps of `value`.
    pub time_stamp: Option<Vec<f64>>,
    /// Position relative to the group origin.
    pub position: Vec3,
    /// Static value.
    pub value: Option<Value>,
    /// Viewer click handling.
    pub clickable: bool,
    /// Visibility layers.
    pub layer: LayerSet,
    /// Owning group summary.
    pub group: GroupRef,
    /// Cached-data hint.
    pub use_cache: bool,
    /// Free-form text.
    pub custom_info: String,
    /// Subject code.
    pub subject_code: Option<String>,
    /// Keyframes by attribute name.
    pub keyframes: BTreeMap<String, KeyframeDescriptor>,
    /// Variant-specific fields.
    #[serde(flatten)]
    pub extra: VariantFields,
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/geom.rs"]
mod tests;
