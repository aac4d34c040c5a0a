//! In-memory blob store implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::Mutex;

use crate::domain::{ArtifactId, DepotError};
use crate::ports::{BlobStore, sharded_path};

/// A stored object: bytes plus the declared content type.
#[derive(Debug, Clone)]
struct StoredBlob {
    bytes: Vec<u8>,
    content_type: String,
}

struct BlobState {
    /// Objects keyed by sharded path, mirroring the real bucket layout.
    objects: HashMap<String, StoredBlob>,

    /// Injected failures remaining, consumed one per call. Lets consistency
    /// tests simulate a backend outage without a real backend.
    fail_puts: u32,
    fail_deletes: u32,
}

/// In-memory blob store for development and tests.
pub struct InMemoryBlobStore {
    state: Arc<Mutex<BlobState>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BlobState {
                objects: HashMap::new(),
                fail_puts: 0,
                fail_deletes: 0,
            })),
        }
    }

    /// Make the next `n` put calls fail with `StorageFailure`.
    pub async fn fail_next_puts(&self, n: u32) {
        self.state.lock().await.fail_puts = n;
    }

    /// Make the next `n` delete calls fail with `StorageFailure`.
    pub async fn fail_next_deletes(&self, n: u32) {
        self.state.lock().await.fail_deletes = n;
    }

    /// Is a blob present under this id's sharded path?
    pub async fn contains(&self, id: &ArtifactId) -> bool {
        let state = self.state.lock().await;
        state.objects.contains_key(&sharded_path(id))
    }

    /// Stored bytes for assertions.
    pub async fn object(&self, id: &ArtifactId) -> Option<Vec<u8>> {
        let state = self.state.lock().await;
        state.objects.get(&sharded_path(id)).map(|b| b.bytes.clone())
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.objects.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(
        &self,
        id: &ArtifactId,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        content_type: &str,
    ) -> Result<(), DepotError> {
        {
            let mut state = self.state.lock().await;
            if state.fail_puts > 0 {
                state.fail_puts -= 1;
                return Err(DepotError::StorageFailure(
                    "injected put failure".to_string(),
                ));
            }
        }

        // Drain the stream outside the lock.
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;

        let mut state = self.state.lock().await;
        state.objects.insert(
            sharded_path(id),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn delete(&self, id: &ArtifactId) -> Result<(), DepotError> {
        let mut state = self.state.lock().await;
        if state.fail_deletes > 0 {
            state.fail_deletes -= 1;
            return Err(DepotError::StorageFailure(
                "injected delete failure".to_string(),
            ));
        }

        // Idempotent: removing an absent key is fine.
        state.objects.remove(&sharded_path(id));
        Ok(())
    }
}
