//! Retention: deadline resolution and the purge sweep.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{ArtifactId, ArtifactRecord, DepotError};
use crate::ports::{BlobStore, Clock, DeadlineParser, MetadataStore};

/// Outcome of one purge sweep.
///
/// Failures are isolated per artifact: one bad blob deletion is recorded
/// here and never blocks the rest of the sweep.
#[derive(Debug, Clone, Default)]
pub struct PurgeReport {
    pub deleted: Vec<ArtifactId>,
    pub failed: Vec<(ArtifactId, String)>,
}

/// Translates retention requests into validated deadlines and drives the
/// purge sweep.
pub struct RetentionManager {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    clock: Arc<dyn Clock>,
    parser: Arc<dyn DeadlineParser>,
}

impl RetentionManager {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
        parser: Arc<dyn DeadlineParser>,
    ) -> Self {
        Self {
            metadata,
            blobs,
            clock,
            parser,
        }
    }

    /// Resolve a retention expression relative to now and store it.
    ///
    /// The resolved instant must be strictly in the future; the store
    /// additionally enforces "strictly after creation".
    pub async fn retain(
        &self,
        id: &ArtifactId,
        expression: &str,
    ) -> Result<ArtifactRecord, DepotError> {
        let now = self.clock.now();
        let until = self
            .parser
            .parse(expression, now)
            .map_err(DepotError::InvalidDeadline)?;

        if until <= now {
            return Err(DepotError::InvalidDeadline(format!(
                "'{expression}' resolves to {until}, which is not in the future"
            )));
        }

        let updated = self.metadata.set_retention(id, Some(until)).await?;
        tracing::info!(id = %id, until = %until, "retention deadline set");
        Ok(updated)
    }

    /// Clear the deadline: the artifact is retained indefinitely again.
    pub async fn clear(&self, id: &ArtifactId) -> Result<ArtifactRecord, DepotError> {
        self.metadata.set_retention(id, None).await
    }

    /// Best-effort sweep of every artifact whose deadline has passed.
    pub async fn purge(&self, now: DateTime<Utc>) -> Result<PurgeReport, DepotError> {
        let expired = self.metadata.list_expired(now).await?;

        let mut report = PurgeReport::default();
        for record in expired {
            match self.purge_one(&record.id).await {
                Ok(()) => report.deleted.push(record.id),
                Err(e) => {
                    tracing::warn!(id = %record.id, error = %e, "purge candidate skipped");
                    report.failed.push((record.id, e.to_string()));
                }
            }
        }

        tracing::info!(
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "purge sweep finished"
        );
        Ok(report)
    }

    /// Blob first, then metadata: the same ordering as an explicit delete.
    async fn purge_one(&self, id: &ArtifactId) -> Result<(), DepotError> {
        self.blobs.delete(id).await?;
        match self.metadata.delete(id).await {
            Ok(()) => Ok(()),
            // Lost a race with an explicit delete; gone either way.
            Err(DepotError::NotFound) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
