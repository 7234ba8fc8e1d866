//! Shared, pre-sized output file.
//!
//! Every segment writes into the same file. Writes are serialized through a
//! single lock: one chunk write across all segments is in flight at a time.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;

use super::error::{DownloadError, DownloadResult};

/// Handle to the destination file shared by all segment fetchers.
///
/// Cloning is cheap; all clones guard the same file handle.
#[derive(Debug, Clone)]
pub struct OutputFile {
    path: Arc<PathBuf>,
    file: Arc<Mutex<File>>,
}

impl OutputFile {
    /// Create (or truncate) `path` and set its length to `size`.
    ///
    /// Pre-sizing lets every segment seek past regions other segments have
    /// not written yet.
    pub async fn create(path: impl AsRef<Path>, size: u64) -> DownloadResult<Self> {
        let path = path.as_ref().to_path_buf();

        let file = File::create(&path)
            .await
            .map_err(|e| DownloadError::io(&path, e))?;
        file.set_len(size)
            .await
            .map_err(|e| DownloadError::io(&path, e))?;

        Ok(Self {
            path: Arc::new(path),
            file: Arc::new(Mutex::new(file)),
        })
    }

    /// Destination path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `data` at absolute `offset` while holding the write lock.
    pub async fn write_at(&self, offset: u64, data: &[u8]) -> DownloadResult<()> {
        let mut file = self.file.lock().await;
        file.seek(SeekFrom::Start(offset))
            .await
            .map_err(|e| DownloadError::io(self.path.as_path(), e))?;
        file.write_all(data)
            .await
            .map_err(|e| DownloadError::io(self.path.as_path(), e))?;
        Ok(())
    }

    /// Flush buffered data and sync it to disk.
    pub async fn flush(&self) -> DownloadResult<()> {
        let mut file = self.file.lock().await;
        file.flush()
            .await
            .map_err(|e| DownloadError::io(self.path.as_path(), e))?;
        file.sync_all()
            .await
            .map_err(|e| DownloadError::io(self.path.as_path(), e))
    }
}
