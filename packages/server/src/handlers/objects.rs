use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::Response;
use common::ObjectKey;
use common::storage::BoxReader;
use common::storage::filesystem::FilesystemObjectStore;
use futures::TryStreamExt;
use serde::Deserialize;
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::state::AppState;

/// Query parameters carried by a presigned local upload URL.
#[derive(Debug, Deserialize)]
pub struct UploadSignature {
    pub expires: i64,
    pub signature: String,
}

fn local_store(state: &AppState) -> Result<Arc<FilesystemObjectStore>, AppError> {
    state
        .storage()?
        .local
        .clone()
        .ok_or_else(|| AppError::NotFound("Local object storage is not enabled".into()))
}

/// Receive a direct upload to a presigned local URL.
#[instrument(skip(state, query, headers, body), fields(key = %key))]
pub async fn put_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<UploadSignature>,
    headers: HeaderMap,
    body: Body,
) -> Result<StatusCode, AppError> {
    let store = local_store(&state)?;
    let key = ObjectKey::parse(&key)?;
    store.verify_upload(&key, query.expires, &query.signature)?;

    if let Some(declared) = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        && declared > store.max_size()
    {
        return Err(AppError::PayloadTooLarge(format!(
            "Object of {declared} bytes exceeds the limit of {} bytes",
            store.max_size()
        )));
    }

    let stream = body.into_data_stream().map_err(std::io::Error::other);
    let reader: BoxReader = Box::new(StreamReader::new(stream));
    let written = store.put_stream(&key, reader).await?;

    info!(bytes = written, "Stored object");
    Ok(StatusCode::OK)
}

/// Serve a locally stored object.
#[instrument(skip(state), fields(key = %key))]
pub async fn get_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, AppError> {
    let store = local_store(&state)?;
    let key = ObjectKey::parse(&key)?;
    let reader = store.get_stream(&key).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
