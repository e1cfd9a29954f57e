// src/store/file.rs

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{error::AppError, store::RecordStore};

/// One `<bucket>.json` file per bucket inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates the directory if needed.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, AppError> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, bucket: &str) -> PathBuf {
        self.dir.join(format!("{}.json", bucket))
    }
}

#[async_trait]
impl RecordStore for FileStore {
    async fn load(&self, bucket: &str) -> Result<Option<String>, AppError> {
        match tokio::fs::read_to_string(self.path(bucket)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes to a temp file private to this call and renames it over the old one,
    /// so readers never observe a half-written or interleaved bucket.
    async fn save(&self, bucket: &str, content: String) -> Result<(), AppError> {
        let tmp = self.dir.join(format!(".{}.{}.json.tmp", bucket, Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&tmp, content).await {
            tokio::fs::remove_file(&tmp).await.ok();
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp, self.path(bucket)).await {
            tokio::fs::remove_file(&tmp).await.ok();
            return Err(e.into());
        }
        Ok(())
    }

    async fn remove(&self, bucket: &str) -> Result<(), AppError> {
        match tokio::fs::remove_file(self.path(bucket)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
