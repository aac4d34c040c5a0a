//! Content identity: streaming digest and spill staging.
//!
//! Identity is a full pre-pass over the content, so every source is read
//! twice: once to digest, once to upload. Seekable sources are rewound in
//! place; anything that cannot rewind must be staged with [`spool`] first.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha512};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWriteExt};
use ulid::Ulid;

use crate::domain::{ArtifactId, DepotError};

/// Read granularity for digesting. Bounded so arbitrarily large uploads
/// never sit fully in memory.
const CHUNK_SIZE: usize = 64 * 1024;

/// Identity of a byte stream: content digest plus observed length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentIdentity {
    pub id: ArtifactId,
    pub file_size: u64,
}

/// Digest a seekable source and rewind it to the start.
///
/// Identical bytes always yield the identical 128-hex-char id (SHA-512).
pub async fn identify<R>(source: &mut R) -> Result<ContentIdentity, DepotError>
where
    R: AsyncRead + AsyncSeek + Unpin + ?Sized,
{
    let mut hasher = Sha512::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut file_size: u64 = 0;

    loop {
        let n = source.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        file_size += n as u64;
    }

    source.rewind().await?;

    Ok(ContentIdentity {
        id: ArtifactId::from_digest(&hasher.finalize()),
        file_size,
    })
}

/// A non-seekable stream staged to a spill file so it can be read twice.
///
/// The file is removed when the handle drops.
pub struct SpooledBlob {
    file: File,
    path: PathBuf,
}

impl SpooledBlob {
    /// The staged content, positioned at the start.
    pub fn file_mut(&mut self) -> &mut File {
        &mut self.file
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SpooledBlob {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Stage a non-seekable stream into `dir`, returning a seekable handle.
///
/// If the client aborts mid-stream the copy fails here, before any metadata
/// row exists.
pub async fn spool<R>(reader: &mut R, dir: &Path) -> Result<SpooledBlob, DepotError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("spool-{}", Ulid::new()));

    let mut file = File::options()
        .create_new(true)
        .read(true)
        .write(true)
        .open(&path)
        .await?;

    let copy = async {
        tokio::io::copy(reader, &mut file).await?;
        file.flush().await?;
        file.rewind().await?;
        Ok::<_, std::io::Error>(())
    };

    match copy.await {
        Ok(()) => Ok(SpooledBlob { file, path }),
        Err(e) => {
            // Abandoned mid-copy; do not leave the partial spill behind.
            let _ = tokio::fs::remove_file(&path).await;
            Err(e.into())
        }
    }
}
