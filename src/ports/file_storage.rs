//! File storage port for tour media.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::media::FileUpload;

/// Errors that can occur during upload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The service refused the object (policy, quota, duplicate path).
    #[error("Upload rejected: {0}")]
    Rejected(String),

    /// The path is not acceptable as an object key.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The service could not be reached.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub path: String,
    pub public_url: String,
}

/// Object storage with public URLs.
///
/// Size and MIME checks are the caller's job; implementations store what
/// they are given.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Stores `file` at `path`, returning its public URL.
    async fn upload(&self, path: &str, file: &FileUpload) -> Result<StoredFile, StorageError>;
}
