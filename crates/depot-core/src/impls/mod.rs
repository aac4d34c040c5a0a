//! Adapters for the ports.
//!
//! In-memory stores back development and tests; `LocalBlobStore` is a real
//! filesystem-backed object store for single-node deployments.

pub mod inmem_blob;
pub mod inmem_metadata;
pub mod local_blob;

pub use inmem_blob::InMemoryBlobStore;
pub use inmem_metadata::InMemoryMetadataStore;
pub use local_blob::LocalBlobStore;
