use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncRead;

use super::error::StorageError;
use super::key::ObjectKey;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Listing entry for a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Object key as reported by the backend.
    pub key: String,
    /// Size of the object in bytes.
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// Object storage that hands out presigned upload URLs.
///
/// Clients never stream payloads through the API: they ask for a presigned URL
/// and PUT directly to the backend. The API only lists and deletes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Produce a URL authorizing a single PUT of `key`, valid for `expires_in`.
    async fn presign_put(
        &self,
        key: &ObjectKey,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError>;

    /// List every stored object.
    async fn list(&self) -> Result<Vec<ObjectInfo>, StorageError>;

    /// Delete an object. Deleting a missing object is not an error.
    async fn delete(&self, key: &ObjectKey) -> Result<(), StorageError>;

    /// Public URL of an object, if the backend exposes one.
    fn public_url(&self, key: &str) -> Option<String>;

    /// Short backend name used in logs.
    fn backend_name(&self) -> &'static str;
}
