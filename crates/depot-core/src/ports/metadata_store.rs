//! MetadataStore port - the relational source of truth for artifacts.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ArtifactId, ArtifactRecord, DepotError};

/// MetadataStore owns the Artifact and Tag rows.
///
/// Design:
/// - Every method is one atomic unit of work against the backing state;
///   callers never observe a half-applied operation. Same-id calls are
///   serialized by this per-operation atomicity, not by any process-wide
///   lock.
/// - `DuplicateIdentifier` on the primary key is the dedup signal for
///   ingest.
/// - Tag rows never outlive their artifact: `delete` removes both together.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Insert a new artifact row. `DuplicateIdentifier` if the id exists.
    async fn create(&self, record: ArtifactRecord) -> Result<(), DepotError>;

    /// Fetch one artifact with its tags populated (sorted).
    async fn get(&self, id: &ArtifactId) -> Result<ArtifactRecord, DepotError>;

    /// Artifacts holding every tag in `required_tags` (intersection, never
    /// union), in insertion order, at most `limit` entries.
    ///
    /// The empty-tag-set case is rejected at the service boundary and never
    /// reaches this layer.
    async fn list(
        &self,
        required_tags: &BTreeSet<String>,
        limit: usize,
    ) -> Result<Vec<ArtifactRecord>, DepotError>;

    /// Remove the artifact and all of its tags as one operation.
    async fn delete(&self, id: &ArtifactId) -> Result<(), DepotError>;

    /// Attach a tag. `DuplicateTag` if `(id, name)` already exists.
    async fn add_tag(&self, id: &ArtifactId, name: &str) -> Result<(), DepotError>;

    /// Detach a tag. `TagNotFound` if the artifact does not carry it.
    async fn remove_tag(&self, id: &ArtifactId, name: &str) -> Result<(), DepotError>;

    /// Set or clear the retention deadline, returning the updated row.
    /// A deadline not strictly after `created_at` is `InvalidDeadline`.
    async fn set_retention(
        &self,
        id: &ArtifactId,
        until: Option<DateTime<Utc>>,
    ) -> Result<ArtifactRecord, DepotError>;

    /// Artifacts whose deadline has passed: `retained_until` non-null and
    /// strictly before `now`, in insertion order. Artifacts without a
    /// deadline are retained indefinitely and never appear here.
    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<ArtifactRecord>, DepotError>;
}
