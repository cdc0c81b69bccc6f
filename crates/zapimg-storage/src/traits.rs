//! Storage abstraction trait

use async_trait::async_trait;
use thiserror::Error;
use zapimg_core::StorageBackend;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Location of a successfully stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Backend-internal key of the object
    pub key: String,
    /// Publicly accessible URL of the object
    pub url: String,
}

/// Storage abstraction trait
///
/// Every call is a fresh create; overwrite-if-exists semantics are
/// acceptable because keys carry generated identifiers. Any transport or
/// auth failure is terminal for the calling request - no partial-object
/// state is left observable and no retries happen here.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Persist a named blob with its content type.
    async fn put(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<StoredObject>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
