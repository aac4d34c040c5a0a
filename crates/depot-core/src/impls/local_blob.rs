//! Local-filesystem blob store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};

use crate::domain::{ArtifactId, DepotError};
use crate::ports::{BlobStore, sharded_path};

/// Blob store backed by a directory tree, one sharded path per object.
///
/// The root plays the role of the configured bucket. Content type is not
/// persisted here; the metadata row is its source of truth.
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, id: &ArtifactId) -> PathBuf {
        self.root.join(sharded_path(id))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(
        &self,
        id: &ArtifactId,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        _content_type: &str,
    ) -> Result<(), DepotError> {
        let path = self.object_path(id);

        let write = async {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
            let mut file = fs::File::create(&path).await?;
            tokio::io::copy(reader, &mut file).await?;
            file.flush().await?;
            Ok::<_, std::io::Error>(())
        };

        write
            .await
            .map_err(|e| DepotError::StorageFailure(format!("put {}: {e}", path.display())))
    }

    async fn delete(&self, id: &ArtifactId) -> Result<(), DepotError> {
        let path = self.object_path(id);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            // Idempotent: an absent object is already deleted.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DepotError::StorageFailure(format!(
                "delete {}: {e}",
                path.display()
            ))),
        }
    }
}
