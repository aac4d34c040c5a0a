//! Ports - abstraction layer over external systems.
//!
//! Each trait hides one collaborator (relational metadata backend, object
//! storage, wall clock, deadline-expression parser) behind an object-safe
//! interface. Adapters live in `impls`; the service layer only ever sees
//! `Arc<dyn Trait>`.

pub mod blob_store;
pub mod clock;
pub mod deadline_parser;
pub mod metadata_store;

pub use self::blob_store::{BlobStore, sharded_path};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::deadline_parser::{DeadlineParser, FixedDeadlineParser, SimpleDeadlineParser};
pub use self::metadata_store::MetadataStore;
