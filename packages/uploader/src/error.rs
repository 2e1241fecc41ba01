use thiserror::Error;

/// Failure of a procedure call.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The server answered with a structured `{code, message}` error.
    #[error("{code}: {message}")]
    Procedure {
        status: u16,
        code: String,
        message: String,
    },

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected response (status {status}): {body}")]
    UnexpectedResponse { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl RpcError {
    /// Error code reported by the server, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            RpcError::Procedure { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Failure of a single direct-to-storage upload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("Upload failed with status {0}")]
    Status(u16),

    #[error("Upload failed due to network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum UploadError {
    /// The batched presign call failed; no transfer was attempted.
    #[error("failed to presign uploads: {0}")]
    Presign(#[source] RpcError),

    #[error("failed to delete {key}: {source}")]
    Delete {
        key: String,
        #[source]
        source: RpcError,
    },

    #[error("failed to refresh stored files: {0}")]
    Refresh(#[source] RpcError),

    #[error("no deletion is awaiting confirmation")]
    NoPendingDelete,
}
