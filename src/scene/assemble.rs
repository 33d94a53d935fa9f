//! Collects geometries into a self-contained scene bundle and writes it to disk.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::Value;

use crate::animation::colormap::{ColorMap, ColorMapDescriptor};
use crate::assets::color::PaletteColor;
use crate::cache::store::{CacheRecord, ensure_parent_dir, write_atomic};
use crate::foundation::error::{BrainError, BrainResult};
use crate::geometry::geom::{GeomId, Geometry, GeometryDescriptor};
use crate::geometry::graph::SceneGraph;
use crate::geometry::group::{Group, GroupDescriptor, GroupId, GroupValue};
use crate::scene::options::{SceneOptions, ViewerSettings};

/// Name of the synthetic group carrying global data.
pub const GLOBAL_GROUP: &str = "__global_data";
/// Name of the synthetic marker geometry owning [`GLOBAL_GROUP`].
pub const GLOBAL_GEOM: &str = "__blank__";
/// Prefix of global data keys inside [`GLOBAL_GROUP`].
pub const GLOBAL_KEY_PREFIX: &str = "__global_data__";
/// File name of the scene document inside a written bundle.
pub const SCENE_FILE: &str = "scene.json";

/// A payload file a bundle must carry.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct BundleFile {
    /// Payload on disk.
    pub source: PathBuf,
    /// Sanitized name of the owning group; the sub-directory inside the bundle.
    pub group: String,
    /// File name inside the group directory.
    pub file_name: String,
}

/// Self-contained scene: every group and geometry descriptor plus viewer settings.
#[derive(Clone, Debug, serde::Serialize)]
pub struct SceneBundle {
    /// Groups, synthetic global group first.
    pub groups: Vec<GroupDescriptor>,
    /// Geometries, synthetic marker first.
    pub geoms: Vec<GeometryDescriptor>,
    /// Viewer settings, including one color map per animated attribute.
    pub settings: ViewerSettings,
    #[serde(skip)]
    files: Vec<BundleFile>,
}

/// Collect `ids` from `graph` into a scene bundle.
///
/// Duplicate ids are dropped, keeping first appearance. Every cache payload referenced by a
/// collected group must exist, otherwise assembly fails with [`BrainError::MissingCacheFile`].
#[tracing::instrument(skip(graph, ids, opts), fields(geoms = ids.len()))]
pub fn assemble(
    graph: &SceneGraph,
    ids: &[GeomId],
    opts: &SceneOptions,
) -> BrainResult<SceneBundle> {
    let mut opts = opts.clone();
    opts.validate()?;

    let global = global_group(&opts);
    let marker = Geometry::blank(GLOBAL_GEOM);

    let mut seen = BTreeSet::new();
    let mut geoms: Vec<(GeomId, &Geometry)> = Vec::with_capacity(ids.len());
    for &id in ids {
        if !seen.insert(id) {
            continue;
        }
        let geom = graph
            .geom(id)
            .ok_or_else(|| BrainError::validation(format!("unknown geometry id {}", id.0)))?;
        geoms.push((id, geom));
    }

    let mut group_ids: Vec<GroupId> = Vec::new();
    for (_, g) in &geoms {
        if let Some(gid) = g.group
            && !group_ids.contains(&gid)
        {
            group_ids.push(gid);
        }
    }
    let mut groups: Vec<&Group> = vec![&global];
    for gid in group_ids {
        let g = graph
            .group(gid)
            .ok_or_else(|| BrainError::validation(format!("unknown group id {}", gid.0)))?;
        groups.push(g);
    }

    let mut types: Vec<&str> = Vec::new();
    for (_, g) in &geoms {
        for t in g.animation_types() {
            if !types.contains(&t) {
                types.push(t);
            }
        }
    }

    let sources: Vec<&Geometry> = geoms.iter().map(|(_, g)| *g).collect();
    let mut color_maps: BTreeMap<String, ColorMapDescriptor> = BTreeMap::new();
    for &t in &types {
        let cmap = derive_colormap(t, &sources, &opts);
        color_maps.insert(t.to_string(), cmap.descriptor());
    }
    let default_colormap = match &opts.default_colormap {
        Some(name) if types.contains(&name.as_str()) => Some(name.clone()),
        _ => types.first().map(|t| t.to_string()),
    };
    tracing::debug!(types = ?types, default = ?default_colormap, "derived color maps");

    let files = bundle_files(&groups)?;

    let mut geom_descs = vec![marker.descriptor(Some(&global))];
    geom_descs.extend(
        geoms
            .iter()
            .map(|(id, g)| g.descriptor(graph.group_of(*id))),
    );

    Ok(SceneBundle {
        groups: groups.iter().map(|g| g.descriptor()).collect(),
        geoms: geom_descs,
        settings: ViewerSettings::new(&opts, color_maps, default_colormap),
        files,
    })
}

fn global_group(opts: &SceneOptions) -> Group {
    let mut group = Group::new(GLOBAL_GROUP);
    for (k, v) in &opts.global_data {
        group.set_data(format!("{GLOBAL_KEY_PREFIX}{k}"), v.clone());
    }
    for (k, v) in &opts.global_files {
        match serde_json::from_value::<CacheRecord>(v.clone()) {
            Ok(rec) if rec.is_cache => {
                group.set_data(format!("{GLOBAL_KEY_PREFIX}{k}"), rec);
            }
            _ => tracing::debug!(key = %k, "ignoring global file entry that is not a cache record"),
        }
    }
    group
}

fn derive_colormap(name: &str, sources: &[&Geometry], opts: &SceneOptions) -> ColorMap {
    let mut cmap = ColorMap::derive(name, sources.iter().copied());
    if let Some(palette) = opts.palettes.get(name) {
        let stops: Vec<_> = palette.iter().map(|PaletteColor(c)| *c).collect();
        cmap.set_colors(&stops);
    }
    if let Some(alias) = opts.value_alias.get(name) {
        cmap.set_alias(alias.clone());
    }
    if let Some(r) = opts.value_ranges.get(name) {
        if r.len() >= 2 {
            cmap.set_value_range(r[0], r[1]);
        }
        if r.len() >= 4 {
            cmap.set_hard_range(r[2], r[3]);
        }
    }
    cmap
}

fn bundle_files(groups: &[&Group]) -> BrainResult<Vec<BundleFile>> {
    let mut files = BTreeSet::new();
    for g in groups {
        let cache_name = g.cache_name();
        for value in g.data().values() {
            let GroupValue::Cached(rec) = value else {
                continue;
            };
            if !rec.exists() {
                return Err(BrainError::MissingCacheFile(rec.absolute_path.clone()));
            }
            files.insert(BundleFile {
                source: rec.absolute_path.clone(),
                group: cache_name.clone(),
                file_name: rec.file_name.clone(),
            });
        }
    }
    Ok(files.into_iter().collect())
}

impl SceneBundle {
    /// Payload files carried by this bundle.
    pub fn files(&self) -> &[BundleFile] {
        &self.files
    }

    /// The scene document as JSON.
    pub fn to_json(&self) -> BrainResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Write the bundle under `dir`: payloads first, then [`SCENE_FILE`].
    ///
    /// Any copy failure aborts before the scene document is written. Returns the scene path.
    #[tracing::instrument(skip(self, dir), fields(dir = %dir.as_ref().display()))]
    pub fn write_to(&self, dir: impl AsRef<Path>) -> BrainResult<PathBuf> {
        let dir = dir.as_ref();
        let cache_dir = dir.join(&self.settings.cache_folder);
        for f in &self.files {
            if !f.source.is_file() {
                return Err(BrainError::MissingCacheFile(f.source.clone()));
            }
            let dest = cache_dir.join(&f.group).join(&f.file_name);
            ensure_parent_dir(&dest)?;
            std::fs::copy(&f.source, &dest).with_context(|| {
                format!("copy '{}' to '{}'", f.source.display(), dest.display())
            })?;
        }

        let scene = dir.join(SCENE_FILE);
        let bytes = serde_json::to_vec_pretty(self)?;
        write_atomic(&scene, &bytes)?;
        tracing::info!(
            path = %scene.display(),
            files = self.files.len(),
            groups = self.groups.len(),
            geoms = self.geoms.len(),
            "wrote scene bundle"
        );
        Ok(scene)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/assemble.rs"]
mod tests;
