//! Application layer: orchestration across the stores.

pub mod retention;
pub mod service;

pub use retention::{PurgeReport, RetentionManager};
pub use service::{ArtifactService, IngestOutcome};
