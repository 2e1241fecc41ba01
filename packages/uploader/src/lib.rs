//! Client side of nn-stack.
//!
//! [`UploadQueue`] holds files picked by the user, asks the server for
//! presigned destinations, PUTs every payload straight to storage, and then
//! refreshes the stored object list through a [`QueryCache`]. [`RpcClient`]
//! speaks the server's JSON procedures and [`HttpTransfer`] performs the
//! direct uploads.

pub mod cache;
pub mod client;
pub mod error;
pub mod file;
pub mod policy;
pub mod preview;
pub mod queue;
pub mod services;
pub mod transfer;

pub use cache::{QueryCache, QueryKey};
pub use client::RpcClient;
pub use error::{RpcError, TransferError, UploadError};
pub use file::FileHandle;
pub use policy::{MimePattern, Rejection, SuccessPolicy, UploadPolicy};
pub use preview::{NoPreviews, Preview, PreviewProvider};
pub use queue::{
    DequeueOutcome, EnqueueOutcome, FileId, FileStatus, Notice, QueuedFileView, UploadQueue,
    UploadReport,
};
pub use services::{PresignService, ProgressFn, StorageService, Transfer};
pub use transfer::HttpTransfer;
