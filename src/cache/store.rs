//! Path-addressed JSON payload cache with digest sidecars.
//!
//! A payload lives at `path`; its sidecar lives at `path` + [`DIGEST_SUFFIX`] and records the
//! payload digest, a digest of the caller header, the data version and the header fields
//! themselves. Paths are the lookup key; the digest only decides whether an entry is fresh.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use anyhow::Context;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::cache::digest::{
    DEFAULT_DIGEST_LEN, canonical_json, digest_bytes, digest_file, digest_value,
};
use crate::foundation::error::{BrainError, BrainResult};

/// Sidecar file suffix; kept compatible with caches prepared by earlier tooling.
pub const DIGEST_SUFFIX: &str = ".pydigest";
/// Current cache data version; sidecars recording an older version are stale.
pub const DATA_VERSION: u64 = 1;
/// Sidecar field holding the data version.
pub const DATA_VERSION_KEY: &str = "ravebrainpy_data_ver";

const LOCK_SUFFIX: &str = ".lock";
const STALE_LOCK_AGE: Duration = Duration::from_secs(30);
const LOCK_POLL: Duration = Duration::from_millis(10);

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Pointer to a materialized JSON payload.
pub struct CacheRecord {
    /// Path as given by the caller (normalized to absolute).
    pub path: PathBuf,
    /// Absolute path of the payload file.
    pub absolute_path: PathBuf,
    /// File name component, used when copying into a bundle.
    pub file_name: String,
    /// True when this call wrote the payload.
    pub is_new_cache: bool,
    /// Always true; marks the value as a cache reference.
    pub is_cache: bool,
    /// Viewer hint: load the payload on demand only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lazy: Option<bool>,
}

impl CacheRecord {
    /// Reference an existing payload file without touching it.
    ///
    /// Fails with [`BrainError::MissingCacheFile`] when the file does not exist.
    pub fn existing(path: impl AsRef<Path>) -> BrainResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(BrainError::MissingCacheFile(path.to_path_buf()));
        }
        Self::reference(path)
    }

    /// Reference a payload path whether or not the file exists yet.
    pub fn reference(path: impl AsRef<Path>) -> BrainResult<Self> {
        let abs = absolute(path.as_ref())?;
        let file_name = file_name_of(&abs)?;
        Ok(Self {
            path: abs.clone(),
            absolute_path: abs,
            file_name,
            is_new_cache: false,
            is_cache: true,
            lazy: None,
        })
    }

    /// Same record with the `lazy` hint set.
    pub fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy = Some(lazy);
        self
    }

    /// Whether the referenced payload currently exists.
    pub fn exists(&self) -> bool {
        self.absolute_path.is_file()
    }
}

/// Why an existing cache entry is regenerated. Never surfaced to callers.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Staleness {
    Forced,
    MissingPayload,
    MissingSidecar,
    UnreadableSidecar(String),
    DigestMismatch,
    HeaderChanged,
    PayloadModified,
    VersionRegression(u64),
}

#[derive(Clone, Debug)]
/// Options for [`JsonCache::put_with`].
pub struct PutOptions<'a> {
    /// Rewrite the payload even if the sidecar says it is fresh.
    pub recache: bool,
    /// Maintain a digest sidecar. Without it an existing payload is never rewritten.
    pub use_digest: bool,
    /// Caller fields merged into the sidecar and covered by `header_digest`.
    pub header: Option<&'a Map<String, Value>>,
}

impl Default for PutOptions<'_> {
    fn default() -> Self {
        Self {
            recache: false,
            use_digest: true,
            header: None,
        }
    }
}

#[derive(Clone, Debug)]
/// JSON payload cache rooted at caller-chosen paths.
pub struct JsonCache {
    digest_len: usize,
    lock_timeout: Duration,
}

impl Default for JsonCache {
    fn default() -> Self {
        Self {
            digest_len: DEFAULT_DIGEST_LEN,
            lock_timeout: Duration::from_secs(10),
        }
    }
}

impl JsonCache {
    /// Cache using the default 20-character digest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override digest length (1..=32 hex characters).
    pub fn with_digest_len(mut self, len: usize) -> Self {
        self.digest_len = len;
        self
    }

    /// Override how long to wait for another writer holding the entry lock.
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Digest length in hex characters.
    pub fn digest_len(&self) -> usize {
        self.digest_len
    }

    /// Store `payload` at `path` unless a fresh entry already exists.
    pub fn put<T: Serialize + ?Sized>(
        &self,
        path: impl AsRef<Path>,
        payload: &T,
        header: Option<&Map<String, Value>>,
    ) -> BrainResult<CacheRecord> {
        self.put_with(
            path,
            payload,
            &PutOptions {
                header,
                ..PutOptions::default()
            },
        )
    }

    /// Store `payload` at `path` with explicit options.
    ///
    /// The payload is written (and `is_new_cache` set) when the entry is missing, forced, or its
    /// sidecar disagrees with the new payload digest, header digest, on-disk bytes or data
    /// version. Writes go to a temporary file that is renamed into place, under an exclusive
    /// lock file shared with other processes targeting the same path.
    pub fn put_with<T: Serialize + ?Sized>(
        &self,
        path: impl AsRef<Path>,
        payload: &T,
        opts: &PutOptions<'_>,
    ) -> BrainResult<CacheRecord> {
        let abs = absolute(path.as_ref())?;
        let bytes = canonical_json(payload)?;
        let digest = digest_bytes(&bytes, self.digest_len)?;
        let sidecar_path = sidecar_path(&abs);

        let sidecar = if opts.use_digest {
            Some(self.build_sidecar(&digest, opts.header)?)
        } else {
            None
        };

        let _lock = CacheLock::acquire(&abs, self.lock_timeout)?;

        let stale = if opts.recache {
            Some(Staleness::Forced)
        } else if !abs.is_file() {
            Some(Staleness::MissingPayload)
        } else if let Some(sidecar) = &sidecar {
            self.staleness(&abs, &sidecar_path, sidecar)
        } else {
            None
        };

        let is_new_cache = stale.is_some();
        if let Some(reason) = stale {
            tracing::debug!(path = %abs.display(), ?reason, "cache entry stale");
            write_atomic(&abs, &bytes)?;
            tracing::info!(path = %abs.display(), bytes = bytes.len(), "wrote cache payload");
            if let Some(sidecar) = &sidecar {
                write_atomic(&sidecar_path, &serde_json::to_vec(sidecar)?)?;
            }
        }

        let mut record = CacheRecord::reference(&abs)?;
        record.is_new_cache = is_new_cache;
        Ok(record)
    }

    /// Read and decode a payload file.
    pub fn read(&self, path: impl AsRef<Path>) -> BrainResult<Value> {
        read_json(path)
    }

    /// Read the sidecar fields of the payload at `path`.
    pub fn read_sidecar(&self, path: impl AsRef<Path>) -> BrainResult<Map<String, Value>> {
        let sc = sidecar_path(path.as_ref());
        match self.read(&sc)? {
            Value::Object(m) => Ok(m),
            _ => Err(BrainError::serde(format!(
                "sidecar '{}' is not a JSON object",
                sc.display()
            ))),
        }
    }

    /// Whether the entry at `path` would be reused for `payload` with `header`.
    pub fn is_fresh<T: Serialize + ?Sized>(
        &self,
        path: impl AsRef<Path>,
        payload: &T,
        header: Option<&Map<String, Value>>,
    ) -> BrainResult<bool> {
        let abs = absolute(path.as_ref())?;
        if !abs.is_file() {
            return Ok(false);
        }
        let digest = digest_value(payload, self.digest_len)?;
        let sidecar = self.build_sidecar(&digest, header)?;
        Ok(self.staleness(&abs, &sidecar_path(&abs), &sidecar).is_none())
    }

    /// Compare the file digest of `path` against the field `key` of its sidecar.
    ///
    /// `sidecar` defaults to `path` + [`DIGEST_SUFFIX`]. Missing or unreadable files count as a
    /// mismatch.
    pub fn check_digest_file(
        &self,
        path: impl AsRef<Path>,
        sidecar: Option<&Path>,
        key: &str,
    ) -> bool {
        let path = path.as_ref();
        let sc = sidecar
            .map(Path::to_path_buf)
            .unwrap_or_else(|| sidecar_path(path));
        if !path.is_file() || !sc.is_file() {
            return false;
        }
        let Ok(Value::Object(fields)) = self.read(&sc) else {
            return false;
        };
        let Some(expected) = fields.get(key).and_then(Value::as_str) else {
            return false;
        };
        match digest_file(path, self.digest_len) {
            Ok(actual) => actual == expected,
            Err(_) => false,
        }
    }

    fn build_sidecar(
        &self,
        digest: &str,
        header: Option<&Map<String, Value>>,
    ) -> BrainResult<Map<String, Value>> {
        let mut fields = header.cloned().unwrap_or_default();
        fields.insert("digest".to_string(), Value::String(digest.to_string()));
        fields.remove("header_digest");
        fields.remove(DATA_VERSION_KEY);
        let header_digest = digest_value(&fields, self.digest_len)?;
        fields.insert("header_digest".to_string(), Value::String(header_digest));
        fields.insert(DATA_VERSION_KEY.to_string(), Value::from(DATA_VERSION));
        Ok(fields)
    }

    fn staleness(
        &self,
        payload_path: &Path,
        sidecar_path: &Path,
        expected: &Map<String, Value>,
    ) -> Option<Staleness> {
        if !sidecar_path.is_file() {
            return Some(Staleness::MissingSidecar);
        }
        let found = match self.read(sidecar_path) {
            Ok(Value::Object(m)) => m,
            Ok(_) => return Some(Staleness::UnreadableSidecar("not an object".to_string())),
            Err(e) => return Some(Staleness::UnreadableSidecar(e.to_string())),
        };

        let version = found.get(DATA_VERSION_KEY).and_then(Value::as_u64).unwrap_or(0);
        if version < DATA_VERSION {
            return Some(Staleness::VersionRegression(version));
        }
        if found.get("digest") != expected.get("digest") {
            return Some(Staleness::DigestMismatch);
        }
        if found.get("header_digest") != expected.get("header_digest") {
            return Some(Staleness::HeaderChanged);
        }
        let on_disk = digest_file(payload_path, self.digest_len).ok();
        if on_disk.as_deref() != expected.get("digest").and_then(Value::as_str) {
            return Some(Staleness::PayloadModified);
        }
        None
    }
}

/// Read and decode a JSON file; a missing file is [`BrainError::MissingCacheFile`].
pub fn read_json(path: impl AsRef<Path>) -> BrainResult<Value> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(BrainError::MissingCacheFile(path.to_path_buf()));
    }
    let bytes =
        std::fs::read(path).with_context(|| format!("read cache payload '{}'", path.display()))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| BrainError::serde(format!("decode cache payload '{}': {e}", path.display())))
}

/// Sidecar path of a payload file.
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(DIGEST_SUFFIX);
    PathBuf::from(s)
}

pub(crate) fn absolute(path: &Path) -> BrainResult<PathBuf> {
    std::path::absolute(path)
        .with_context(|| format!("resolve absolute path of '{}'", path.display()))
        .map_err(BrainError::from)
}

fn file_name_of(path: &Path) -> BrainResult<String> {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            BrainError::validation(format!("cache path '{}' has no file name", path.display()))
        })
}

/// Create parent directories of `path` if needed.
pub fn ensure_parent_dir(path: &Path) -> BrainResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Write `bytes` to a sibling temporary file, then rename it over `path`.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> BrainResult<()> {
    ensure_parent_dir(path)?;
    let name = file_name_of(path)?;
    let tmp = path.with_file_name(format!(".{name}.{}.tmp", std::process::id()));
    {
        let mut f = std::fs::File::create(&tmp)
            .with_context(|| format!("create temp file '{}'", tmp.display()))?;
        f.write_all(bytes)
            .with_context(|| format!("write temp file '{}'", tmp.display()))?;
        f.sync_all()
            .with_context(|| format!("sync temp file '{}'", tmp.display()))?;
    }
    std::fs::rename(&tmp, path).with_context(|| {
        format!("rename '{}' to '{}'", tmp.display(), path.display())
    })?;
    Ok(())
}

/// Exclusive lock on one cache entry, held as a `create_new` lock file.
struct CacheLock {
    path: PathBuf,
}

impl CacheLock {
    fn acquire(payload: &Path, timeout: Duration) -> BrainResult<Self> {
        let mut s = payload.as_os_str().to_os_string();
        s.push(LOCK_SUFFIX);
        let path = PathBuf::from(s);
        ensure_parent_dir(&path)?;

        let started = Instant::now();
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut f) => {
                    let _ = writeln!(f, "{}", std::process::id());
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    if lock_is_stale(&path) {
                        tracing::warn!(lock = %path.display(), "breaking stale cache lock");
                        let _ = std::fs::remove_file(&path);
                        continue;
                    }
                    if started.elapsed() >= timeout {
                        return Err(anyhow::anyhow!(
                            "timed out waiting for cache lock '{}'",
                            path.display()
                        )
                        .into());
                    }
                    std::thread::sleep(LOCK_POLL);
                }
                Err(e) => {
                    return Err(anyhow::Error::new(e)
                        .context(format!("create cache lock '{}'", path.display()))
                        .into());
                }
            }
        }
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn lock_is_stale(path: &Path) -> bool {
    let Ok(modified) = std::fs::metadata(path).and_then(|m| m.modified()) else {
        return false;
    };
    SystemTime::now()
        .duration_since(modified)
        .map(|age| age > STALE_LOCK_AGE)
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/cache/store.rs"]
mod tests;
