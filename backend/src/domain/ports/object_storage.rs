//! Port for the external object store holding uploaded photos.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised by object storage adapters.
    pub enum ObjectStorageError {
        /// Store could not be reached or the write failed.
        Unavailable { message: String } =>
            "object storage unavailable: {message}",
        /// Store refused the key.
        InvalidKey { key: String } =>
            "object key `{key}` is not acceptable",
    }
}

/// Write-only object store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `key` and return the public URL.
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, ObjectStorageError>;
}
