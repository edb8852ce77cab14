use super::base::{StorageBackend, StorageError};
use super::layout;
use anyhow::Error;
use async_trait::async_trait;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Writes raw bodies to `<base_path>/<host>/<section>/<filename>`.
#[derive(Clone, Debug)]
pub struct DiskStorage {
    base_path: PathBuf,
}

impl DiskStorage {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, Error> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

#[async_trait]
impl StorageBackend for DiskStorage {
    async fn store(&self, url: &Url, body: &[u8]) -> Result<PathBuf, StorageError> {
        if layout::extract_filename(url).is_empty() {
            return Err(StorageError::EmptyFilename(url.clone()));
        }

        let destination = layout::destination(&self.base_path, url);

        tokio::fs::create_dir_all(&destination.dir)
            .await
            .map_err(|source| StorageError::CreateDir {
                path: destination.dir.clone(),
                source,
            })?;

        // Truncates an existing file; concurrent writers to one path race.
        tokio::fs::write(&destination.file, body)
            .await
            .map_err(|source| StorageError::Write {
                path: destination.file.clone(),
                source,
            })?;

        debug!(
            "Stored {} bytes from {} at {}",
            body.len(),
            url,
            destination.file.display()
        );
        Ok(destination.file)
    }
}
