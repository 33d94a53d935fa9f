//! ravebrain assembles cacheable scene descriptions for 3D neuroimaging viewers.
//!
//! Geometries (surfaces, volumes, markers) live in a [`SceneGraph`] arena together with the
//! [`Group`]s that carry their shared data. Time-varying attributes are [`Keyframe`]s, from
//! which [`ColorMap`]s are derived, and [`assemble`] turns a selection of geometries into one
//! [`SceneBundle`] that can be written to disk with its payload files.
//!
//! # Pipeline overview
//!
//! 1. **Build**: add groups and geometries to a [`SceneGraph`], or load a prepared subject with
//!    [`Brain::from_cache_dir`]
//! 2. **Animate**: attach values with [`SceneGraph::set_value`]
//! 3. **Assemble**: `SceneGraph + [GeomId] + SceneOptions -> SceneBundle`
//! 4. **Write**: [`SceneBundle::write_to`] copies cache payloads and emits `scene.json`
//!
//! Large payloads go through a [`JsonCache`]: files are looked up by path and validated against
//! a digest sidecar, so unchanged data is never rewritten.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;

pub(crate) mod animation;
pub(crate) mod brain;
pub(crate) mod cache;
pub(crate) mod geometry;
pub(crate) mod scene;
pub(crate) mod transform;

pub use crate::animation::colormap::{
    AnimationSource, CONTINUOUS_LEVELS, CONTINUOUS_PALETTE, ColorKeys, ColorMap,
    ColorMapDescriptor, DISCRETE_PALETTE, MIN_RAMP,
};
pub use crate::animation::keyframe::{
    DEFAULT_TARGET, DENSE_TARGET, KeyValues, Keyframe, KeyframeDescriptor, ValueKind,
};
pub use crate::assets::color::{PaletteColor, Rgb8, interpolate, interpolate_hex, parse_hex};
pub use crate::brain::brain::{Brain, CACHE_DIR, COMMON_DIGEST, LoadOptions, Selection};
pub use crate::brain::surface::{BrainSurface, MeshType, SURFACE_TYPES, hemisphere_offset};
pub use crate::brain::volume::BrainVolume;
pub use crate::cache::digest::{
    DEFAULT_DIGEST_LEN, MAX_DIGEST_LEN, canonical_json, digest_bytes, digest_file, digest_value,
};
pub use crate::cache::store::{
    CacheRecord, DATA_VERSION, DATA_VERSION_KEY, DIGEST_SUFFIX, JsonCache, PutOptions,
    ensure_parent_dir, read_json, sidecar_path,
};
pub use crate::foundation::core::{Layer, LayerSet, Mat4, Vec3, vec3_from_slice};
pub use crate::foundation::error::{BrainError, BrainResult};
pub use crate::geometry::geom::{
    DataCube, ElectrodeInfo, FreeMesh, GeomId, GeomKind, Geometry, GeometryDescriptor, GroupRef,
    Hemisphere, SphereShape, VariantFields,
};
pub use crate::geometry::graph::{
    DataCubeSpec, FreeMeshSpec, RESERVED_VALUE_NAME, SceneGraph, Voxels,
};
pub use crate::geometry::group::{
    DEFAULT_CACHE_ROOT, Group, GroupDescriptor, GroupId, GroupValue, cache_name, default_cache_path,
};
pub use crate::scene::assemble::{
    BundleFile, GLOBAL_GEOM, GLOBAL_GROUP, GLOBAL_KEY_PREFIX, SCENE_FILE, SceneBundle, assemble,
};
pub use crate::scene::options::{
    BASE_PRESETS, LIB_PATH, SceneOptions, TRAILING_PRESETS, ViewerSettings,
};
pub use crate::transform::anatomical::{AnatomicalTransforms, parse_talairach_xfm};
pub use crate::transform::matrix::{determinant, from_rows, invert, multiply, spread_4x4};
