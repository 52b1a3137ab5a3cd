//! Filesystem blob store for uploaded images and proofs of payment.
//!
//! Only bytes live here; metadata is kept in the `attachments` table.

use std::io;
use std::path::PathBuf;
use tokio::fs;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn ensure_root(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await
    }

    /// Writes `bytes` under a fresh random key and returns the key.
    pub async fn put(&self, extension: &str, bytes: &[u8]) -> io::Result<String> {
        self.ensure_root().await?;
        let key = format!("{}.{}", Uuid::new_v4().simple(), extension);
        fs::write(self.path_for(&key)?, bytes).await?;
        Ok(key)
    }

    pub async fn get(&self, key: &str) -> io::Result<Vec<u8>> {
        fs::read(self.path_for(key)?).await
    }

    /// Removing a missing blob is not an error.
    pub async fn remove(&self, key: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(key)?).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    /// Best-effort removal after the owning rows are gone; failures are
    /// logged and leave an orphaned file rather than a dangling row.
    pub async fn purge(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.remove(key).await {
                tracing::warn!(storage_key = %key, error = %e, "Failed to remove media blob");
            }
        }
    }

    fn path_for(&self, key: &str) -> io::Result<PathBuf> {
        // Keys are generated here, so anything path-like is a bad row.
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid storage key '{}'", key),
            ));
        }
        Ok(self.root.join(key))
    }
}
