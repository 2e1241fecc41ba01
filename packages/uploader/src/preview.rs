use std::fmt;
use std::sync::Arc;

use crate::file::FileHandle;

/// Creates and releases local previews of queued files.
pub trait PreviewProvider: Send + Sync {
    /// Create a preview and return its handle.
    fn create(&self, file: &FileHandle) -> String;

    fn release(&self, handle: &str);
}

/// Provider for headless use: handles are the file names, nothing is held.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPreviews;

impl PreviewProvider for NoPreviews {
    fn create(&self, file: &FileHandle) -> String {
        file.name().to_string()
    }

    fn release(&self, _handle: &str) {}
}

/// A live preview. The provider is told to release it when this is dropped.
pub struct Preview {
    handle: String,
    provider: Arc<dyn PreviewProvider>,
}

impl Preview {
    pub fn new(provider: Arc<dyn PreviewProvider>, file: &FileHandle) -> Self {
        Self {
            handle: provider.create(file),
            provider,
        }
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }
}

impl Drop for Preview {
    fn drop(&mut self) {
        self.provider.release(&self.handle);
    }
}

impl fmt::Debug for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Preview").field(&self.handle).finish()
    }
}
