//! Per-attribute time series and the color maps derived from them.

pub(crate) mod colormap;
pub(crate) mod keyframe;
