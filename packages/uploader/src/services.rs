use std::sync::Arc;

use async_trait::async_trait;
use common::contract::{PresignRequest, PresignedUpload, StoredObject};

use crate::error::{RpcError, TransferError};
use crate::file::FileHandle;

/// Receives transfer progress as a percentage in `0..=100`.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Hands out presigned destinations for direct uploads.
#[async_trait]
pub trait PresignService: Send + Sync {
    /// Presign every entry in one call. The answer is positional: entry `i`
    /// belongs to request `i`.
    async fn presign(&self, files: &[PresignRequest]) -> Result<Vec<PresignedUpload>, RpcError>;
}

/// The authoritative set of stored objects.
#[async_trait]
pub trait StorageService: Send + Sync {
    async fn list(&self) -> Result<Vec<StoredObject>, RpcError>;

    async fn delete(&self, key: &str) -> Result<(), RpcError>;
}

/// Direct upload of a payload to a presigned URL.
#[async_trait]
pub trait Transfer: Send + Sync {
    async fn put(
        &self,
        url: &str,
        file: &FileHandle,
        on_progress: ProgressFn,
    ) -> Result<(), TransferError>;
}
