use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, stream};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client};

use crate::error::TransferError;
use crate::file::FileHandle;
use crate::services::{ProgressFn, Transfer};

/// Payload slice handed to the connection at a time.
pub const CHUNK_SIZE: usize = 16 * 1024;

/// Uploads payloads with an HTTP PUT, reporting progress per chunk.
#[derive(Clone, Debug)]
pub struct HttpTransfer {
    client: Client,
}

impl HttpTransfer {
    pub fn new() -> Result<Self, TransferError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| TransferError::Network(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

/// `round(loaded * 100 / total)`; an empty payload is complete at once.
pub fn percent(loaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((loaded * 100 + total / 2) / total).min(100) as u8
}

fn chunks(bytes: &Bytes) -> Vec<Bytes> {
    (0..bytes.len())
        .step_by(CHUNK_SIZE)
        .map(|start| bytes.slice(start..(start + CHUNK_SIZE).min(bytes.len())))
        .collect()
}

#[async_trait]
impl Transfer for HttpTransfer {
    async fn put(
        &self,
        url: &str,
        file: &FileHandle,
        on_progress: ProgressFn,
    ) -> Result<(), TransferError> {
        let total = file.size();
        let reporter = on_progress.clone();
        let mut loaded = 0u64;
        let body = stream::iter(chunks(file.bytes())).map(move |chunk| {
            loaded += chunk.len() as u64;
            reporter(percent(loaded, total));
            Ok::<_, std::io::Error>(chunk)
        });

        let response = self
            .client
            .put(url)
            .header(CONTENT_TYPE, file.content_type())
            .header(CONTENT_LENGTH, total)
            .body(Body::wrap_stream(body))
            .send()
            .await
            .map_err(|e| TransferError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::Status(status.as_u16()));
        }

        if total == 0 {
            on_progress(100);
        }
        Ok(())
    }
}
