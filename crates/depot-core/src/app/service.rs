//! ArtifactService - orchestration and cross-store consistency.
//!
//! The metadata store and the blob store are independent failure domains
//! with no transaction spanning both. The service bounds the inconsistency
//! window by ordering:
//!
//! - **Ingest**: identify, then metadata create, then blob put. A failed
//!   put rolls the fresh metadata row back before the call returns, so the
//!   transient "row without blob" state is never externally observable.
//! - **Delete**: blob first, then metadata. A failed blob delete keeps the
//!   row (and thus discoverability), which is the safer failure mode than
//!   an orphaned blob nothing points at.
//!
//! No lock is held across digesting, stream reads, or store calls; same-id
//! serialization comes from the metadata store's per-operation atomicity.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncSeek};

use crate::domain::{ArtifactId, ArtifactRecord, ArtifactView, DepotError};
use crate::identity;
use crate::ports::{BlobStore, Clock, MetadataStore};

/// Result of an ingest call.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub artifact: ArtifactRecord,

    /// True when identical content was already present and the call
    /// resolved to the existing artifact instead of creating one.
    pub already_stored: bool,
}

/// The operations consumed by the external API boundary.
pub struct ArtifactService {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    cdn_base_url: String,
}

impl ArtifactService {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
        cdn_base_url: impl Into<String>,
    ) -> Self {
        Self {
            metadata,
            blobs,
            clock,
            cdn_base_url: cdn_base_url.into(),
        }
    }

    /// Ingest one artifact from a rewindable source.
    ///
    /// Re-uploading identical content is idempotent: the outcome carries the
    /// existing record with `already_stored = true` and no second row is
    /// created. Tags from the two requests are not merged; the caller adds
    /// tags separately if it wants them.
    pub async fn ingest<R>(
        &self,
        source: &mut R,
        content_type: &str,
        original_file_name: &str,
    ) -> Result<IngestOutcome, DepotError>
    where
        R: AsyncRead + AsyncSeek + Send + Unpin,
    {
        let identity = identity::identify(&mut *source).await?;
        let record = ArtifactRecord::new(
            identity.id.clone(),
            content_type,
            original_file_name,
            identity.file_size,
            self.clock.now(),
        );

        match self.metadata.create(record).await {
            Ok(()) => {}
            Err(DepotError::DuplicateIdentifier) => {
                // The content already exists and is retrievable; report the
                // existing artifact rather than an error.
                let existing = self.metadata.get(&identity.id).await?;
                tracing::info!(id = %identity.id, "ingest resolved to existing artifact");
                return Ok(IngestOutcome {
                    artifact: existing,
                    already_stored: true,
                });
            }
            Err(e) => return Err(e),
        }

        // Metadata is committed but the blob is still pending. Either the
        // put lands or the row is rolled back before we return.
        if let Err(put_err) = self.blobs.put(&identity.id, source, content_type).await {
            return Err(self.rollback_ingest(&identity.id, put_err).await);
        }

        let artifact = self.metadata.get(&identity.id).await?;
        tracing::info!(id = %artifact.id, size = artifact.file_size, "artifact ingested");
        Ok(IngestOutcome {
            artifact,
            already_stored: false,
        })
    }

    async fn rollback_ingest(&self, id: &ArtifactId, put_err: DepotError) -> DepotError {
        match self.metadata.delete(id).await {
            Ok(()) | Err(DepotError::NotFound) => {
                tracing::warn!(id = %id, error = %put_err, "blob upload failed, metadata rolled back");
                put_err
            }
            Err(rollback_err) => {
                // The row now claims bytes that were never stored. This
                // requires out-of-band repair and must never be swallowed.
                tracing::error!(
                    id = %id,
                    put_error = %put_err,
                    rollback_error = %rollback_err,
                    "FATAL: rollback failed, metadata row has no backing blob"
                );
                DepotError::ConsistencyRollbackFailure {
                    id: id.to_string(),
                    cause: rollback_err.to_string(),
                }
            }
        }
    }

    pub async fn get(&self, id: &ArtifactId) -> Result<ArtifactRecord, DepotError> {
        self.metadata.get(id).await
    }

    /// Artifacts holding every requested tag. At least one tag is
    /// mandatory; the intersection of an empty set would be everything.
    pub async fn list(
        &self,
        required_tags: &BTreeSet<String>,
        limit: usize,
    ) -> Result<Vec<ArtifactRecord>, DepotError> {
        if required_tags.is_empty() {
            return Err(DepotError::InvalidRequest(
                "at least one tag must be submitted".to_string(),
            ));
        }
        self.metadata.list(required_tags, limit).await
    }

    /// Delete the blob first, then the metadata row.
    ///
    /// If the blob delete fails the row stays, the caller gets the storage
    /// error, and a later retry can finish the job.
    pub async fn delete(&self, id: &ArtifactId) -> Result<ArtifactRecord, DepotError> {
        let record = self.metadata.get(id).await?;

        self.blobs.delete(id).await?;
        self.metadata.delete(id).await?;

        tracing::info!(id = %id, "artifact deleted");
        Ok(record)
    }

    /// Tag mutations touch only the metadata store.
    pub async fn add_tag(&self, id: &ArtifactId, name: &str) -> Result<ArtifactRecord, DepotError> {
        self.metadata.add_tag(id, name).await?;
        self.metadata.get(id).await
    }

    pub async fn remove_tag(
        &self,
        id: &ArtifactId,
        name: &str,
    ) -> Result<ArtifactRecord, DepotError> {
        self.metadata.remove_tag(id, name).await?;
        self.metadata.get(id).await
    }

    /// Public URL: configured CDN base plus the blob's sharded path.
    pub fn download_url(&self, id: &ArtifactId) -> String {
        format!(
            "{}/{}",
            self.cdn_base_url.trim_end_matches('/'),
            self.blobs.location_for(id)
        )
    }

    /// Response shape for the transport layer.
    pub fn view(&self, record: ArtifactRecord) -> ArtifactView {
        let download_url = self.download_url(&record.id);
        ArtifactView {
            record,
            download_url,
        }
    }
}
