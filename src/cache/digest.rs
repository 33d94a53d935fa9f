//! Short change-detection digests over canonical JSON payloads and files.
//!
//! Digests are hex-encoded XXH3-128 values truncated to the requested length. They are used only
//! to notice that a payload changed, never as a security property.

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use xxhash_rust::xxh3::Xxh3;

use crate::foundation::error::{BrainError, BrainResult};

const XXH3_SEED: u64 = 0x5241_5645_6272_6e31;

/// Default digest length in hex characters.
pub const DEFAULT_DIGEST_LEN: usize = 20;
/// Longest digest that can be produced (128 bits).
pub const MAX_DIGEST_LEN: usize = 32;

const FILE_CHUNK: usize = 4096;

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn finish_hex(self, len: usize) -> String {
        let mut s = format!("{:032x}", self.inner.digest128());
        s.truncate(len);
        s
    }
}

fn check_len(len: usize) -> BrainResult<()> {
    if len == 0 || len > MAX_DIGEST_LEN {
        return Err(BrainError::validation(format!(
            "digest length must be within 1..={MAX_DIGEST_LEN}, got {len}"
        )));
    }
    Ok(())
}

/// Canonical serialization used for both digests and cache payload files.
///
/// Object keys come out sorted, so logically equal payloads serialize to the same bytes.
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> BrainResult<Vec<u8>> {
    let v = serde_json::to_value(value)?;
    Ok(serde_json::to_vec(&v)?)
}

/// Digest of raw bytes.
pub fn digest_bytes(bytes: &[u8], len: usize) -> BrainResult<String> {
    check_len(len)?;
    let mut h = StableHasher::new();
    h.write_bytes(bytes);
    Ok(h.finish_hex(len))
}

/// Digest of the canonical JSON serialization of `value`.
pub fn digest_value<T: Serialize + ?Sized>(value: &T, len: usize) -> BrainResult<String> {
    digest_bytes(&canonical_json(value)?, len)
}

/// Digest of a file's bytes, read in fixed-size chunks.
///
/// A payload written from `canonical_json(v)` digests to the same value as `digest_value(v)`.
pub fn digest_file(path: impl AsRef<Path>, len: usize) -> BrainResult<String> {
    check_len(len)?;
    let path = path.as_ref();
    let mut f = std::fs::File::open(path)
        .with_context(|| format!("open '{}' for digest", path.display()))?;
    let mut h = StableHasher::new();
    let mut buf = [0u8; FILE_CHUNK];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read '{}' for digest", path.display()))?;
        if n == 0 {
            break;
        }
        h.write_bytes(&buf[..n]);
    }
    Ok(h.finish_hex(len))
}

#[cfg(test)]
#[path = "../../tests/unit/cache/digest.rs"]
mod tests;
