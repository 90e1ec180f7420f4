//! Content-addressed artifact storage.
//!
//! Uploads are staged to a uniquely named temporary file, hashed as they
//! are written, and atomically renamed into place on publish. Readers never
//! observe a partially written artifact, and concurrent publishes of the
//! same id resolve to the last writer.

use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use sha2::{Digest, Sha256};
use tokio::fs::{self, File};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use crate::types::Platform;

/// Upload streams are read and written in chunks of this size, so memory
/// use stays bounded regardless of artifact size.
const WRITE_CHUNK_SIZE: usize = 64 * 1024;

/// Distinguishes temp files staged by this process within its lifetime.
static STAGE_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("artifact not found: {0}")]
    NotFound(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of publishing an artifact.
#[derive(Debug, Clone)]
pub struct StoredArtifact {
    pub path: PathBuf,
    pub size: u64,
    /// SHA-256 hex digest over exactly the bytes persisted at `path`.
    pub checksum: String,
}

/// File storage for update binaries, rooted at a builds directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Opens the store, creating the builds directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn artifact_path(&self, update_id: &str, platform: Platform) -> PathBuf {
        self.root.join(format!("{}.{}", update_id, platform))
    }

    /// Begins staging an upload. The data lands in a temp file that is
    /// invisible to readers until `publish` renames it into place.
    pub async fn stage(&self) -> Result<StagedArtifact, StoreError> {
        let stage_id = STAGE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp_path = self
            .root
            .join(format!(".upload-{}-{}.tmp", process::id(), stage_id));
        let file = File::create(&tmp_path).await?;
        Ok(StagedArtifact {
            tmp_path,
            file,
            hasher: Sha256::new(),
            size: 0,
        })
    }

    /// Streams `reader` into the store under the derived artifact name,
    /// returning the path, size, and checksum of the persisted file.
    pub async fn store<R: AsyncRead + Unpin>(
        &self,
        update_id: &str,
        platform: Platform,
        mut reader: R,
    ) -> Result<StoredArtifact, StoreError> {
        let mut staged = self.stage().await?;
        let mut buf = vec![0u8; WRITE_CHUNK_SIZE];
        loop {
            let n = match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    staged.discard().await;
                    return Err(e.into());
                }
            };
            if let Err(e) = staged.write_chunk(&buf[..n]).await {
                return Err(e);
            }
        }
        staged.publish(self, update_id, platform).await
    }

    /// Resolves a previously stored artifact to its on-disk path.
    pub async fn resolve(
        &self,
        update_id: &str,
        platform: Platform,
    ) -> Result<PathBuf, StoreError> {
        let path = self.artifact_path(update_id, platform);
        match fs::metadata(&path).await {
            Ok(_) => Ok(path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(update_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Opens an artifact for streaming reads. The returned handle is owned
    /// by the caller and released when dropped, so a response body that is
    /// cancelled mid-stream does not leak it.
    pub async fn open_for_read(&self, path: &Path) -> Result<File, StoreError> {
        match File::open(path).await {
            Ok(file) => Ok(file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(path.display().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// An in-progress upload. Dropping it without publishing leaves only a
/// temp file behind; `discard` removes that too.
pub struct StagedArtifact {
    tmp_path: PathBuf,
    file: File,
    hasher: Sha256,
    size: u64,
}

impl StagedArtifact {
    /// Appends a chunk, feeding the digest over the same bytes being
    /// written so the final checksum matches the persisted file without
    /// re-reading it. A failed write discards the staging file.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StoreError> {
        self.hasher.update(chunk);
        if let Err(e) = self.file.write_all(chunk).await {
            let _ = fs::remove_file(&self.tmp_path).await;
            return Err(e.into());
        }
        self.size += chunk.len() as u64;
        Ok(())
    }

    /// Flushes, fsyncs, and atomically renames the staged file into its
    /// final name. From this point the artifact is visible to readers.
    pub async fn publish(
        mut self,
        store: &ArtifactStore,
        update_id: &str,
        platform: Platform,
    ) -> Result<StoredArtifact, StoreError> {
        let final_path = store.artifact_path(update_id, platform);
        let result: Result<(), std::io::Error> = async {
            self.file.flush().await?;
            self.file.sync_all().await?;
            Ok(())
        }
        .await;
        if let Err(e) = result {
            let _ = fs::remove_file(&self.tmp_path).await;
            return Err(e.into());
        }
        drop(self.file);

        if let Err(e) = fs::rename(&self.tmp_path, &final_path).await {
            let _ = fs::remove_file(&self.tmp_path).await;
            return Err(e.into());
        }

        Ok(StoredArtifact {
            path: final_path,
            size: self.size,
            checksum: hex::encode(self.hasher.finalize()),
        })
    }

    /// Removes the staging file. Best effort; a leftover temp file is
    /// never visible as an artifact.
    pub async fn discard(self) {
        drop(self.file);
        let _ = fs::remove_file(&self.tmp_path).await;
    }
}
