//! Per-attribute time series attached to geometries.

use std::path::{Path, PathBuf};

use crate::cache::store::{CacheRecord, JsonCache};
use crate::foundation::error::{BrainError, BrainResult};

/// Renderer property animated by ordinary keyframes.
pub const DEFAULT_TARGET: &str = ".material.color";
/// Renderer property animated by per-vertex mesh colors.
pub const DENSE_TARGET: &str = ".geometry.attributes.color.array";

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Value typing of a keyframe.
pub enum ValueKind {
    /// Numeric values, colorized by range.
    Continuous,
    /// Categorical values with a fixed level set.
    Discrete,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
/// Value sequence of a keyframe.
pub enum KeyValues {
    /// Continuous samples.
    Numbers(Vec<f64>),
    /// Discrete samples; levels are derived in first-appearance order.
    Labels(Vec<String>),
}

impl KeyValues {
    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            Self::Numbers(v) => v.len(),
            Self::Labels(v) => v.len(),
        }
    }

    /// True when there are no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Typing implied by the variant.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Numbers(_) => ValueKind::Continuous,
            Self::Labels(_) => ValueKind::Discrete,
        }
    }
}

impl From<Vec<f64>> for KeyValues {
    fn from(v: Vec<f64>) -> Self {
        Self::Numbers(v)
    }
}

impl From<Vec<String>> for KeyValues {
    fn from(v: Vec<String>) -> Self {
        Self::Labels(v)
    }
}

impl From<Vec<&str>> for KeyValues {
    fn from(v: Vec<&str>) -> Self {
        Self::Labels(v.into_iter().map(str::to_string).collect())
    }
}

/// Time series of one named attribute on one geometry.
#[derive(Clone, Debug, PartialEq)]
pub struct Keyframe {
    name: String,
    time: Vec<f64>,
    values: KeyValues,
    levels: Vec<String>,
    target: String,
    cache_path: Option<PathBuf>,
}

fn unique_in_order(labels: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for l in labels {
        if !out.contains(l) {
            out.push(l.clone());
        }
    }
    out
}

fn check_lengths(values: usize, times: usize) -> BrainResult<()> {
    if values != times {
        return Err(BrainError::LengthMismatch { values, times });
    }
    Ok(())
}

impl Keyframe {
    /// Build a keyframe from paired values and time stamps.
    ///
    /// Non-finite numbers are dropped together with their time stamp. The result may be empty;
    /// owners treat an empty keyframe as removal.
    pub fn new(name: impl Into<String>, values: KeyValues, time: Vec<f64>) -> BrainResult<Self> {
        check_lengths(values.len(), time.len())?;
        let (values, time, levels) = match values {
            KeyValues::Numbers(v) => {
                let (t, v): (Vec<f64>, Vec<f64>) = time
                    .into_iter()
                    .zip(v)
                    .filter(|(_, v)| v.is_finite())
                    .unzip();
                (KeyValues::Numbers(v), t, Vec::new())
            }
            KeyValues::Labels(v) => {
                let levels = unique_in_order(&v);
                (KeyValues::Labels(v), time, levels)
            }
        };
        Ok(Self {
            name: name.into(),
            time,
            values,
            levels,
            target: DEFAULT_TARGET.to_string(),
            cache_path: None,
        })
    }

    /// Build a discrete keyframe against a fixed, ordered level set.
    ///
    /// Samples outside `levels` are dropped with their time stamp.
    pub fn factor(
        name: impl Into<String>,
        levels: Vec<String>,
        values: Vec<String>,
        time: Vec<f64>,
    ) -> BrainResult<Self> {
        check_lengths(values.len(), time.len())?;
        let (time, values): (Vec<f64>, Vec<String>) = time
            .into_iter()
            .zip(values)
            .filter(|(_, v)| levels.contains(v))
            .unzip();
        Ok(Self {
            name: name.into(),
            time,
            values: KeyValues::Labels(values),
            levels,
            target: DEFAULT_TARGET.to_string(),
            cache_path: None,
        })
    }

    /// Build a dense keyframe (one sample per mesh vertex) targeting vertex colors.
    ///
    /// Values are kept as given. Empty input fails with [`BrainError::EmptyValue`].
    pub fn dense(name: impl Into<String>, values: KeyValues, time: Vec<f64>) -> BrainResult<Self> {
        let name = name.into();
        if values.is_empty() {
            return Err(BrainError::EmptyValue(name));
        }
        check_lengths(values.len(), time.len())?;
        let levels = match &values {
            KeyValues::Labels(v) => unique_in_order(v),
            KeyValues::Numbers(_) => Vec::new(),
        };
        Ok(Self {
            name,
            time,
            values,
            levels,
            target: DENSE_TARGET.to_string(),
            cache_path: None,
        })
    }

    /// Same keyframe with another renderer target.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renderer target property.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Time stamps.
    pub fn time(&self) -> &[f64] {
        &self.time
    }

    /// Held values; compacted once materialized.
    pub fn values(&self) -> &KeyValues {
        &self.values
    }

    /// Value typing.
    pub fn kind(&self) -> ValueKind {
        self.values.kind()
    }

    /// Whether values are numeric.
    pub fn is_continuous(&self) -> bool {
        self.kind() == ValueKind::Continuous
    }

    /// True when no sample survived construction.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the full series has been written to the cache.
    pub fn is_cached(&self) -> bool {
        self.cache_path.is_some()
    }

    /// Payload file holding the full series, once materialized.
    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }

    /// `[min, max]` of the time stamps, `[0, 0]` when there are none.
    pub fn time_range(&self) -> [f64; 2] {
        min_max(&self.time).unwrap_or([0.0, 0.0])
    }

    /// `[min, max]` of numeric values; `None` for discrete or empty keyframes.
    pub fn value_range(&self) -> Option<[f64; 2]> {
        match &self.values {
            KeyValues::Numbers(v) => min_max(v),
            KeyValues::Labels(_) => None,
        }
    }

    /// Ordered level set of a discrete keyframe.
    pub fn value_names(&self) -> Option<&[String]> {
        match self.kind() {
            ValueKind::Discrete => Some(&self.levels),
            ValueKind::Continuous => None,
        }
    }

    /// Write the full series to `path` under `record_name`, then keep only the renderer hint.
    ///
    /// Continuous values collapse to `[min, max]` and discrete values to the level set. Calling
    /// again on a materialized keyframe returns the existing record without writing.
    pub fn materialize(
        &mut self,
        cache: &JsonCache,
        path: impl AsRef<Path>,
        record_name: &str,
    ) -> BrainResult<CacheRecord> {
        if let Some(existing) = &self.cache_path {
            return CacheRecord::reference(existing);
        }

        let mut payload = serde_json::Map::new();
        payload.insert(
            record_name.to_string(),
            serde_json::to_value(self.descriptor())?,
        );
        let record = cache.put(path, &payload, None)?;

        self.cache_path = Some(record.absolute_path.clone());
        self.values = match &self.values {
            KeyValues::Numbers(v) => {
                KeyValues::Numbers(min_max(v).map(Vec::from).unwrap_or_default())
            }
            KeyValues::Labels(_) => KeyValues::Labels(self.levels.clone()),
        };
        Ok(record)
    }

    /// Serializable view of this keyframe.
    pub fn descriptor(&self) -> KeyframeDescriptor {
        KeyframeDescriptor {
            name: self.name.clone(),
            time: self.time.clone(),
            value: self.values.clone(),
            data_type: self.kind(),
            target: self.target.clone(),
            cached: self.is_cached(),
            cache_path: self.cache_path.clone(),
        }
    }
}

fn min_max(v: &[f64]) -> Option<[f64; 2]> {
    let mut it = v.iter().copied();
    let first = it.next()?;
    Some(it.fold([first, first], |[lo, hi], x| [lo.min(x), hi.max(x)]))
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Keyframe as consumed by the viewer.
pub struct KeyframeDescriptor {
    /// Attribute name.
    pub name: String,
    /// Time stamps.
    pub time: Vec<f64>,
    /// Values, or the compacted hint once cached.
    pub value: KeyValues,
    /// `continuous` or `discrete`.
    pub data_type: ValueKind,
    /// Renderer target property.
    pub target: String,
    /// Whether the full series lives in `cache_path`.
    pub cached: bool,
    /// Payload file of the full series.
    pub cache_path: Option<PathBuf>,
}

#[cfg(test)]
#[path = "../../tests/unit/animation/keyframe.rs"]
mod tests;
