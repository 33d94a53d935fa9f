//! Color assets.

pub(crate) mod color;
