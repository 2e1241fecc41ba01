pub mod contract;
pub mod procedures;
pub mod storage;

pub use storage::{ObjectKey, StorageError};
