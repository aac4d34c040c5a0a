//! depot-core
//!
//! Core building blocks for the depot content-addressed artifact store.
//!
//! # Module layout
//! - **domain**: domain model (artifact records, ids, error taxonomy)
//! - **ports**: abstraction layer (MetadataStore, BlobStore, Clock, DeadlineParser)
//! - **impls**: adapters (in-memory stores for development/tests, local filesystem blobs)
//! - **app**: application logic (ArtifactService orchestration, RetentionManager)
//! - **identity**: streaming content identity (digest + spill staging)
//! - **config**: environment-style settings

pub mod app;
pub mod config;
pub mod domain;
pub mod identity;
pub mod impls;
pub mod ports;
