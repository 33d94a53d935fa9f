//! Groups, geometry variants and the arena that ties them together.

pub(crate) mod geom;
pub(crate) mod graph;
pub(crate) mod group;
