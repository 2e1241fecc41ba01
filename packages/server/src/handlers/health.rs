use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

const OK: &str = "OK";
const KV_PROBE_KEY: &str = "__health_probe__";

#[utoipa::path(
    post,
    path = "/rpc/healthCheck/connection",
    tag = "Health",
    operation_id = "healthCheck.connection",
    summary = "Check that the API is reachable",
    responses((status = 200, description = "Server is up", body = String)),
)]
#[instrument]
pub async fn connection() -> Json<&'static str> {
    Json(OK)
}

#[utoipa::path(
    post,
    path = "/rpc/healthCheck/kv",
    tag = "Health",
    operation_id = "healthCheck.kv",
    summary = "Check the key-value binding",
    description = "Writes, reads back and deletes a probe entry in the bound KV namespace.",
    responses(
        (status = 200, description = "KV binding is usable", body = String),
        (status = 404, description = "No KV namespace is bound (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn kv(State(state): State<AppState>) -> Result<Json<&'static str>, AppError> {
    let kv = state
        .kv
        .as_ref()
        .ok_or_else(|| AppError::NotFound("KV namespace is not bound".into()))?;

    let probe = chrono::Utc::now().timestamp_millis().to_string();
    kv.put(KV_PROBE_KEY, probe.clone());
    let read_back = kv.get(KV_PROBE_KEY);
    kv.delete(KV_PROBE_KEY);

    if read_back.as_deref() != Some(probe.as_str()) {
        return Err(AppError::Internal(format!(
            "KV namespace '{}' returned a stale probe value",
            kv.name()
        )));
    }
    Ok(Json(OK))
}

#[utoipa::path(
    post,
    path = "/rpc/healthCheck/db",
    tag = "Health",
    operation_id = "healthCheck.db",
    summary = "Check the database binding",
    responses(
        (status = 200, description = "Database answers", body = String),
        (status = 404, description = "No database is bound (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn db(State(state): State<AppState>) -> Result<Json<&'static str>, AppError> {
    let db = state
        .db
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Database is not bound".into()))?;
    db.ping().await?;
    Ok(Json(OK))
}

#[utoipa::path(
    post,
    path = "/rpc/healthCheck/r2",
    tag = "Health",
    operation_id = "healthCheck.r2",
    summary = "Check the object storage binding",
    description = "Lists the bucket to confirm the configured credentials are accepted.",
    responses(
        (status = 200, description = "Object storage is usable", body = String),
        (status = 412, description = "Storage is not configured (PRECONDITION_FAILED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn r2(State(state): State<AppState>) -> Result<Json<&'static str>, AppError> {
    let storage = state.storage()?;
    let objects = storage.store.list().await?;
    tracing::debug!(
        backend = storage.store.backend_name(),
        objects = objects.len(),
        "Object storage probe succeeded"
    );
    Ok(Json(OK))
}
