//! Server-specific error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use escheat_common::EscheatError;

/// Application error type for the HTTP surface
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Escheat(#[from] EscheatError),

    #[error("{0}")]
    Conflict(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Escheat(EscheatError::Database(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Escheat(EscheatError::QueryTooShort { .. }) => {
                (StatusCode::BAD_REQUEST, self.to_string())
            },
            AppError::Escheat(EscheatError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, self.to_string())
            },
            AppError::Escheat(
                EscheatError::FetchFailed { .. } | EscheatError::ArchiveEmpty { .. },
            ) => {
                tracing::error!(error = %self, "Source fetch failed");
                (StatusCode::BAD_GATEWAY, self.to_string())
            },
            AppError::Escheat(EscheatError::LoadFailed { .. }) => {
                tracing::error!(error = %self, "Ingestion load failed");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            },
            AppError::Escheat(EscheatError::Database(e)) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            },
            AppError::Escheat(_) => {
                tracing::error!(error = %self, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            },
            AppError::Conflict(message) => (StatusCode::CONFLICT, message.clone()),
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "status": status.as_u16(),
            }
        }));

        (status, body).into_response()
    }
}
