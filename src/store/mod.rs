//! Content-addressed storage layer
//!
//! Immutable blobs addressed by content hash, JSON metadata sidecars with a
//! logical path index, and a small set of mutable named pointer documents.

pub mod metadata;
pub mod object_store;

pub use metadata::Metadata;
pub use object_store::{content_id, ObjectStore};
