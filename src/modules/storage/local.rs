use std::io::ErrorKind;
use std::path::PathBuf;

use crate::api::error;
use crate::modules::storage::{validate_name, BlobStore};

/// Blobs as plain files under the upload folder.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, name: &str) -> Result<PathBuf, error::SystemError> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }
}

fn not_found_or(err: std::io::Error) -> error::SystemError {
    if err.kind() == ErrorKind::NotFound {
        error::SystemError::not_found("File not found in storage")
    } else {
        error::SystemError::IoError(err)
    }
}

#[async_trait::async_trait]
impl BlobStore for LocalStore {
    fn backend(&self) -> &'static str {
        "local"
    }

    async fn put(&self, name: &str, bytes: &[u8]) -> Result<(), error::SystemError> {
        let path = self.path(name)?;
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Vec<u8>, error::SystemError> {
        let path = self.path(name)?;
        tokio::fs::read(&path).await.map_err(not_found_or)
    }

    async fn delete(&self, name: &str) -> Result<(), error::SystemError> {
        let path = self.path(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, name: &str) -> Result<bool, error::SystemError> {
        let path = self.path(name)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn size(&self, name: &str) -> Result<u64, error::SystemError> {
        let path = self.path(name)?;
        let meta = tokio::fs::metadata(&path).await.map_err(not_found_or)?;
        Ok(meta.len())
    }
}
