//! Content-addressed JSON cache.
//!
//! Payloads are looked up by path and validated by digest. See [`store::JsonCache`].

pub(crate) mod digest;
pub(crate) mod store;
