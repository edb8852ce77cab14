use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Cannot derive a filename from URL: {0}")]
    EmptyFilename(Url),

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Persists `body` as the content fetched from `url`, replacing any
    /// earlier content stored for the same destination. Returns where it
    /// was written.
    async fn store(&self, url: &Url, body: &[u8]) -> Result<PathBuf, StorageError>;
}
