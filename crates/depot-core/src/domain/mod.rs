//! Domain model (ids, records, errors).

pub mod artifact;
pub mod errors;
pub mod ids;

pub use artifact::{ArtifactRecord, ArtifactView};
pub use errors::DepotError;
pub use ids::ArtifactId;
