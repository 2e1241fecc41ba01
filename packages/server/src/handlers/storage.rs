use axum::Json;
use axum::extract::State;
use common::ObjectKey;
use common::contract::{
    DeleteObjectInput, DeleteObjectOutput, PresignRequest, PresignedUpload, StoredObject,
};
use futures::future::try_join_all;
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::json::AppJson;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/rpc/storage/presign",
    tag = "Storage",
    operation_id = "storage.presign",
    summary = "Presign direct uploads",
    description = "Allocates a fresh object key for every entry and returns a time-limited PUT URL for it. \
                   The response has one entry per request entry, in request order.",
    request_body = Vec<PresignRequest>,
    responses(
        (status = 200, description = "Presigned destinations", body = Vec<PresignedUpload>),
        (status = 400, description = "Malformed input (BAD_REQUEST)", body = ErrorBody),
        (status = 412, description = "Storage is not configured (PRECONDITION_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(count = payload.len()))]
pub async fn presign(
    State(state): State<AppState>,
    AppJson(payload): AppJson<Vec<PresignRequest>>,
) -> Result<Json<Vec<PresignedUpload>>, AppError> {
    let storage = state.storage()?;

    let uploads = try_join_all(payload.into_iter().map(|file| async move {
        let key = ObjectKey::generate();
        let url = storage
            .store
            .presign_put(&key, &file.content_type, storage.presign_expiry)
            .await?;
        Ok::<_, AppError>(PresignedUpload {
            url,
            key: key.to_string(),
            filename: file.filename,
        })
    }))
    .await?;

    info!(count = uploads.len(), "Presigned uploads");
    Ok(Json(uploads))
}

#[utoipa::path(
    post,
    path = "/rpc/storage/list",
    tag = "Storage",
    operation_id = "storage.list",
    summary = "List stored objects",
    responses(
        (status = 200, description = "Every stored object", body = Vec<StoredObject>),
        (status = 412, description = "Storage is not configured (PRECONDITION_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<StoredObject>>, AppError> {
    let storage = state.storage()?;
    let objects = storage.store.list().await?;

    Ok(Json(
        objects
            .into_iter()
            .map(|obj| StoredObject {
                url: storage.store.public_url(&obj.key),
                key: obj.key,
                size: obj.size,
                uploaded_at: obj.uploaded_at,
            })
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/rpc/storage/delete",
    tag = "Storage",
    operation_id = "storage.delete",
    summary = "Delete a stored object",
    description = "Deleting a key that holds no object still succeeds.",
    request_body = DeleteObjectInput,
    responses(
        (status = 200, description = "Object deleted", body = DeleteObjectOutput),
        (status = 400, description = "Malformed key (BAD_REQUEST)", body = ErrorBody),
        (status = 412, description = "Storage is not configured (PRECONDITION_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(key = %payload.key))]
pub async fn delete(
    State(state): State<AppState>,
    AppJson(payload): AppJson<DeleteObjectInput>,
) -> Result<Json<DeleteObjectOutput>, AppError> {
    let storage = state.storage()?;
    let key = ObjectKey::parse(&payload.key)?;
    storage.store.delete(&key).await?;

    info!("Deleted object");
    Ok(Json(DeleteObjectOutput { success: true }))
}
