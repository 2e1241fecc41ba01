use thiserror::Error;

/// Errors that can occur during object storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The key does not follow the `{millis}-{uuid}` format.
    #[error("invalid object key: {0}")]
    InvalidKey(String),

    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The object exceeds the configured size limit.
    #[error("object exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },

    /// A presigned URL carried a signature that does not match.
    #[error("invalid upload signature")]
    InvalidSignature,

    /// A presigned URL is past its expiry.
    #[error("upload URL expired at {0}")]
    Expired(i64),

    /// The storage backend rejected or failed the request.
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("storage configuration error: {0}")]
    Config(String),
}
