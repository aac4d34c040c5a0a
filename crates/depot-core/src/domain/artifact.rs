//! Artifact record and the serialized view handed to the transport layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::ArtifactId;

/// Artifact metadata row.
///
/// Design:
/// - `id` is the content digest and is immutable once created.
/// - `retained_until == None` means "retain indefinitely"; such artifacts
///   are never eligible for purge. A set deadline must be strictly after
///   `created_at` (the store enforces this).
/// - `tags` is populated on read, sorted and unique. The store keeps tag
///   rows separately so `(artifact_id, name)` uniqueness lives there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub id: ArtifactId,
    pub content_type: String,
    pub original_file_name: String,
    pub file_size: u64,
    pub created_at: DateTime<Utc>,
    pub retained_until: Option<DateTime<Utc>>,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl ArtifactRecord {
    /// A fresh row: no tags, no retention deadline.
    pub fn new(
        id: ArtifactId,
        content_type: impl Into<String>,
        original_file_name: impl Into<String>,
        file_size: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            content_type: content_type.into(),
            original_file_name: original_file_name.into(),
            file_size,
            created_at,
            retained_until: None,
            tags: Vec::new(),
        }
    }

    /// Eligible for purge at `now`? Never true without a deadline.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.retained_until, Some(until) if until < now)
    }
}

/// Response shape for the (external) transport layer: the record plus the
/// derived download URL.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactView {
    #[serde(flatten)]
    pub record: ArtifactRecord,
    pub download_url: String,
}
