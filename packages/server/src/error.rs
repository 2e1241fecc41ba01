use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

/// Structured error response returned by all procedures on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `BAD_REQUEST`, `FORBIDDEN`,
    /// `NOT_FOUND`, `CONFLICT`, `PRECONDITION_FAILED`, `PAYLOAD_TOO_LARGE`,
    /// `INTERNAL_SERVER_ERROR`.
    #[schema(example = "PRECONDITION_FAILED")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "R2 Storage is not configured on the server.")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    /// A binding the procedure depends on is not configured.
    PreconditionFailed(String),
    PayloadTooLarge(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "BAD_REQUEST",
                    message: msg,
                },
            ),
            AppError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "FORBIDDEN",
                    message: msg,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "CONFLICT",
                    message: msg,
                },
            ),
            AppError::PreconditionFailed(msg) => (
                StatusCode::PRECONDITION_FAILED,
                ErrorBody {
                    code: "PRECONDITION_FAILED",
                    message: msg,
                },
            ),
            AppError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorBody {
                    code: "PAYLOAD_TOO_LARGE",
                    message: msg,
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_SERVER_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("Object '{key}' not found")),
            StorageError::InvalidKey(msg) => AppError::Validation(msg),
            StorageError::SizeLimitExceeded { .. } => AppError::PayloadTooLarge(err.to_string()),
            StorageError::InvalidSignature | StorageError::Expired(_) => {
                tracing::warn!("Rejected upload: {err}");
                AppError::Forbidden(err.to_string())
            }
            other => AppError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_failed_maps_to_412() {
        let (status, body) =
            AppError::PreconditionFailed("not configured".into()).status_and_body();
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(body.code, "PRECONDITION_FAILED");
        assert_eq!(body.message, "not configured");
    }

    #[test]
    fn internal_details_are_hidden() {
        let (status, body) = AppError::Internal("db exploded".into()).status_and_body();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.message.contains("exploded"));
    }

    #[test]
    fn storage_errors_map_to_client_errors() {
        let (status, _) = AppError::from(StorageError::InvalidSignature).status_and_body();
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = AppError::from(StorageError::SizeLimitExceeded {
            actual: 10,
            limit: 5,
        })
        .status_and_body();
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

        let (status, body) = AppError::from(StorageError::InvalidKey("bad".into())).status_and_body();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "BAD_REQUEST");
    }
}
