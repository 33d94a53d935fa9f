//! Scene assembly: viewer options and the serialized bundle.

pub(crate) mod assemble;
pub(crate) mod options;
