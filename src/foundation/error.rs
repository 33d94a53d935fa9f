//! Crate error type.

use std::path::PathBuf;

/// Convenience result type used across ravebrain.
pub type BrainResult<T> = Result<T, BrainError>;

/// Top-level error taxonomy used by the scene, cache and transform APIs.
#[derive(thiserror::Error, Debug)]
pub enum BrainError {
    /// Malformed caller input (vector length, layer index, surface type, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// Time and value sequences of a keyframe differ in length.
    #[error("validation error: {values} values but {times} time stamps")]
    LengthMismatch {
        /// Number of values supplied.
        values: usize,
        /// Number of time stamps supplied.
        times: usize,
    },

    /// A keyframe that must carry data was built from an empty sequence.
    #[error("validation error: keyframe '{0}' cannot have zero length")]
    EmptyValue(String),

    /// The geometry variant does not support the requested operation.
    #[error("unsupported operation: {kind} geometry does not support {op}")]
    Unsupported {
        /// Geometry type tag.
        kind: &'static str,
        /// Operation name.
        op: &'static str,
    },

    /// A 4x4 matrix with determinant exactly zero was inverted.
    #[error("singular matrix: cannot invert matrix as determinant is 0")]
    SingularMatrix,

    /// A cache-referenced payload file is missing at assembly time.
    #[error("missing cache file: {}", .0.display())]
    MissingCacheFile(PathBuf),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BrainError {
    /// Build a [`BrainError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`BrainError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build a [`BrainError::Unsupported`] value.
    pub fn unsupported(kind: &'static str, op: &'static str) -> Self {
        Self::Unsupported { kind, op }
    }

    /// True for every variant rendered under the "validation error:" prefix.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::LengthMismatch { .. } | Self::EmptyValue(_)
        )
    }
}

impl From<serde_json::Error> for BrainError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
