mod error;
mod key;
mod signing;
mod traits;

pub mod filesystem;
#[cfg(feature = "object-storage")]
pub mod s3;

pub use error::StorageError;
pub use key::ObjectKey;
pub use signing::{SignedUpload, UrlSigner};
pub use traits::{BoxReader, ObjectInfo, ObjectStore};

/// Validity of presigned upload URLs unless configured otherwise.
pub const DEFAULT_PRESIGN_EXPIRY_SECS: u64 = 3600;
