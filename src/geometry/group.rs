//! Groups: named data shared by member geometries, inline or cache-backed.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::cache::store::{CacheRecord, JsonCache, read_json};
use crate::foundation::core::{Layer, LayerSet, Mat4, Vec3};
use crate::foundation::error::BrainResult;
use crate::transform::matrix::spread_4x4;

/// Stable index of a [`Group`] inside a [`crate::SceneGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupId(pub(crate) usize);

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
/// A group data entry: either a reference to a cache payload or an inline JSON value.
pub enum GroupValue {
    /// Payload lives in a cache file; read through [`Group::get_data`].
    Cached(CacheRecord),
    /// Value stored as is.
    Inline(Value),
}

impl GroupValue {
    /// The cache record, if this entry is one.
    pub fn as_record(&self) -> Option<&CacheRecord> {
        match self {
            Self::Cached(r) => Some(r),
            Self::Inline(_) => None,
        }
    }
}

impl From<Value> for GroupValue {
    fn from(v: Value) -> Self {
        Self::Inline(v)
    }
}

impl From<CacheRecord> for GroupValue {
    fn from(r: CacheRecord) -> Self {
        Self::Cached(r)
    }
}

/// File-system safe form of `name`: every non-alphanumeric ASCII character becomes `_`.
pub fn cache_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Directory under the system temp dir holding default group caches.
pub const DEFAULT_CACHE_ROOT: &str = "ravebrain";

/// Default cache directory of a group named `name`: `<temp>/ravebrain/<cache_name(name)>`.
///
/// The path depends only on the name, so payloads are digest-checked and reused across runs.
pub fn default_cache_path(name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(DEFAULT_CACHE_ROOT)
        .join(cache_name(name))
}

/// Named container of data shared by one or more geometries.
#[derive(Clone, Debug)]
pub struct Group {
    /// Display name; also the source of [`Group::cache_name`].
    pub name: String,
    /// Visibility layers.
    pub layer: LayerSet,
    /// Group origin.
    pub position: Vec3,
    /// Name of the logical parent group.
    pub parent_group: Option<String>,
    /// Subject the group belongs to.
    pub subject_code: Option<String>,
    /// Ignore `trans_mat` when rendering.
    pub disable_trans_mat: bool,
    data: BTreeMap<String, GroupValue>,
    trans_mat: Mat4,
    cache_path: PathBuf,
    cache_env: BTreeMap<String, Value>,
}

impl Group {
    /// Group on the main-camera layer at the origin, caching under [`default_cache_path`].
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let cache_path = default_cache_path(&name);
        Self {
            name,
            layer: LayerSet::single(Layer::MAIN_CAMERA),
            position: [0.0; 3],
            parent_group: None,
            subject_code: None,
            disable_trans_mat: false,
            data: BTreeMap::new(),
            trans_mat: Mat4::IDENTITY,
            cache_path,
            cache_env: BTreeMap::new(),
        }
    }

    /// Same group with other layers.
    pub fn with_layer(mut self, layer: LayerSet) -> Self {
        self.layer = layer;
        self
    }

    /// Same group at another origin.
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Same group caching under `dir`.
    pub fn with_cache_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_path = dir.into();
        self
    }

    /// Same group with a parent group name.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_group = Some(parent.into());
        self
    }

    /// File-system safe form of the group name.
    pub fn cache_name(&self) -> String {
        cache_name(&self.name)
    }

    /// Directory where cached entries of this group are written.
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Transform applied to member geometries.
    pub fn trans_mat(&self) -> &Mat4 {
        &self.trans_mat
    }

    /// Set the transform from 16 row-major values (12 values get `0 0 0 1` appended).
    pub fn set_transform(&mut self, values: &[f64]) -> BrainResult<&Mat4> {
        self.trans_mat = spread_4x4(values)?;
        Ok(&self.trans_mat)
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn set_data(
        &mut self,
        key: impl Into<String>,
        value: impl Into<GroupValue>,
    ) -> &GroupValue {
        let key = key.into();
        self.cache_env.remove(&key);
        self.data.insert(key.clone(), value.into());
        &self.data[&key]
    }

    /// Store `value` under `key` as a cache entry.
    ///
    /// Inline values are first written to `<cache_path>/<cache_name(key)>` as `{key: value}`;
    /// records are stored as given.
    pub fn set_data_cached(
        &mut self,
        key: impl Into<String>,
        value: impl Into<GroupValue>,
        cache: &JsonCache,
    ) -> BrainResult<&GroupValue> {
        let key = key.into();
        let record = match value.into() {
            GroupValue::Cached(r) => r,
            GroupValue::Inline(v) => {
                let mut payload = serde_json::Map::new();
                payload.insert(key.clone(), v);
                cache.put(self.cache_path.join(cache_name(&key)), &payload, None)?
            }
        };
        Ok(self.set_data(key, record))
    }

    /// Raw stored entry under `key`.
    pub fn entry(&self, key: &str) -> Option<&GroupValue> {
        self.data.get(key)
    }

    /// Whether `key` is present.
    pub fn has_data(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Every stored entry, ordered by key.
    pub fn data(&self) -> &BTreeMap<String, GroupValue> {
        &self.data
    }

    /// Decoded value under `key`.
    ///
    /// Cache records are resolved by loading their payload; every field of the payload is
    /// memoized, so later lookups skip the file unless `force_reload` is set.
    pub fn get_data(&mut self, key: &str, force_reload: bool) -> BrainResult<Option<Value>> {
        let record = match self.data.get(key) {
            None => return Ok(None),
            Some(GroupValue::Inline(v)) => return Ok(Some(v.clone())),
            Some(GroupValue::Cached(r)) => r,
        };
        if !force_reload && let Some(v) = self.cache_env.get(key) {
            return Ok(Some(v.clone()));
        }

        tracing::debug!(
            group = %self.name,
            key,
            path = %record.absolute_path.display(),
            "loading group data from cache"
        );
        match read_json(&record.absolute_path)? {
            Value::Object(fields) => self.cache_env.extend(fields),
            other => {
                self.cache_env.insert(key.to_string(), other);
            }
        }
        Ok(self.cache_env.get(key).cloned())
    }

    /// [`Group::get_data`] with a fallback for absent keys.
    pub fn get_data_or(&mut self, key: &str, default: Value) -> BrainResult<Value> {
        Ok(self.get_data(key, false)?.unwrap_or(default))
    }

    /// Keys whose entries are cache references.
    pub fn cached_items(&self) -> Vec<String> {
        self.data
            .iter()
            .filter(|(_, v)| v.as_record().is_some())
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Copy every entry of `other` into this group, overwriting equal keys.
    pub(crate) fn absorb(&mut self, other: &Group) {
        for (k, v) in &other.data {
            self.set_data(k.clone(), v.clone());
        }
    }

    /// Serializable view of this group.
    pub fn descriptor(&self) -> GroupDescriptor {
        GroupDescriptor {
            name: self.name.clone(),
            layer: self.layer.clone(),
            position: self.position,
            group_data: self.data.clone(),
            trans_mat: self.trans_mat,
            cached_items: self.cached_items(),
            cache_name: self.cache_name(),
            disable_trans_mat: self.disable_trans_mat,
            parent_group: self.parent_group.clone(),
            subject_code: self.subject_code.clone(),
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let opt = |s: &Option<String>| s.clone().unwrap_or_else(|| "None".to_string());
        let layers: Vec<String> = self.layer.iter().map(|l| l.get().to_string()).collect();
        writeln!(f, "Geometry group <{}>", self.name)?;
        writeln!(f, "Meta data:")?;
        writeln!(f, "  Parent object : {}", opt(&self.parent_group))?;
        writeln!(f, "  Subject       : {}", opt(&self.subject_code))?;
        writeln!(f, "  Data path     : {}", self.cache_path.display())?;
        writeln!(f, "Parameters:")?;
        writeln!(f, "  Layer         : {}", layers.join(", "))?;
        let [x, y, z] = self.position;
        writeln!(f, "  Position      : {x:.2}, {y:.2}, {z:.2}")?;
        write!(f, "  Transform     :")?;
        for row in self.trans_mat.rows() {
            write!(
                f,
                "\n    {:.2}, {:.2}, {:.2}, {:.2}",
                row[0], row[1], row[2], row[3]
            )?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Group as consumed by the viewer.
pub struct GroupDescriptor {
    /// Display name.
    pub name: String,
    /// Visibility layers.
    pub layer: LayerSet,
    /// Group origin.
    pub position: Vec3,
    /// Stored entries.
    pub group_data: BTreeMap<String, GroupValue>,
    /// Flattened row-major transform.
    pub trans_mat: Mat4,
    /// Keys of cache-referenced entries.
    pub cached_items: Vec<String>,
    /// Sub-directory name of copied payloads.
    pub cache_name: String,
    /// Ignore `trans_mat` when rendering.
    pub disable_trans_mat: bool,
    /// Logical parent group.
    pub parent_group: Option<String>,
    /// Subject code.
    pub subject_code: Option<String>,
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/group.rs"]
mod tests;
