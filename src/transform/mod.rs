//! 4x4 matrix algebra and the anatomical coordinate spaces built on it.

pub(crate) mod anatomical;
pub(crate) mod matrix;
