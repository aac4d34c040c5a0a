//! BlobStore port - object-storage backend for artifact bytes.

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::domain::{ArtifactId, DepotError};

/// Storage path for a content identifier.
///
/// Segments are `[0..2]`, `[2..4]` and the remainder from index 5; the
/// character at index 4 is dropped (not a contiguous split). This exact
/// partitioning matches the layout of objects stored by earlier deployments
/// and must be preserved bit-for-bit.
pub fn sharded_path(id: &ArtifactId) -> String {
    let key = id.as_str();
    format!("{}/{}/{}", &key[0..2], &key[2..4], &key[5..])
}

/// BlobStore places artifact bytes in object storage under sharded keys.
///
/// Design:
/// - `delete` is idempotent: removing an absent key is not an error, which
///   makes retries by callers safe.
/// - Backend unavailability surfaces as `StorageFailure`; the blob store
///   itself never retries. Retry policy belongs to the service layer.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store the stream under the id's sharded path.
    async fn put(
        &self,
        id: &ArtifactId,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        content_type: &str,
    ) -> Result<(), DepotError>;

    /// Remove the blob. Succeeds when the key is already absent.
    async fn delete(&self, id: &ArtifactId) -> Result<(), DepotError>;

    /// Path of the blob inside the configured bucket, as seen by the CDN.
    fn location_for(&self, id: &ArtifactId) -> String {
        sharded_path(id)
    }
}
