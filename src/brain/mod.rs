//! Subject-level brain model: anatomical transforms, surfaces and volumes.

#[allow(clippy::module_inception)]
pub(crate) mod brain;
pub(crate) mod surface;
pub(crate) mod volume;
