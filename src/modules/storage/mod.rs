/// Blob storage for document bytes.
///
/// The database only ever holds document metadata; the bytes live in exactly
/// one backend, chosen once per deployment by `USE_REMOTE_STORAGE`.
pub mod local;
pub mod sftp;

use std::sync::Arc;

use crate::api::error;
use crate::constants::RemoteEnv;

pub use local::LocalStore;
pub use sftp::SftpStore;

#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Short backend name used in log lines.
    fn backend(&self) -> &'static str;

    /// Write `bytes` under `name`, replacing any previous content.
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<(), error::SystemError>;

    /// Read the whole blob. Missing blobs are `NotFound`.
    async fn get(&self, name: &str) -> Result<Vec<u8>, error::SystemError>;

    /// Remove the blob. Removing a missing blob succeeds.
    async fn delete(&self, name: &str) -> Result<(), error::SystemError>;

    async fn exists(&self, name: &str) -> Result<bool, error::SystemError>;

    async fn size(&self, name: &str) -> Result<u64, error::SystemError>;
}

/// Blob names are flat file names generated by the server; anything that
/// could escape the storage root is refused.
pub fn validate_name(name: &str) -> Result<(), error::SystemError> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.contains('\0')
    {
        return Err(error::SystemError::bad_request("Invalid storage file name"));
    }
    Ok(())
}

/// Name of the rendered-HTML companion file kept next to word documents.
pub fn html_sidecar(name: &str) -> String {
    format!("{name}.html")
}

/// Storage selector: local disk unless remote storage is switched on.
pub fn build_store(upload_folder: &str, remote: &RemoteEnv) -> Arc<dyn BlobStore> {
    if remote.use_remote_storage {
        log::info!(
            "Using SFTP storage at {}@{}:{}{}",
            remote.username,
            remote.host,
            remote.port,
            remote.upload_dir
        );
        Arc::new(SftpStore::new(
            remote.host.clone(),
            remote.port,
            remote.username.clone(),
            remote.password.clone(),
            remote.upload_dir.clone(),
            std::time::Duration::from_secs(remote.timeout_secs),
        ))
    } else {
        log::info!("Using local storage at {}", upload_folder);
        Arc::new(LocalStore::new(upload_folder))
    }
}
