//! Application-wide error types and their HTTP mapping.
//!
//! Ledger errors carry their own classification; the transport concern here
//! is only turning a class into a status code, in one place:
//!
//! | Class      | Status                        |
//! |------------|-------------------------------|
//! | Validation | 400 Bad Request               |
//! | NotFound   | 404 Not Found                 |
//! | State      | 409 Conflict                  |
//! | Conflict   | 503 Service Unavailable + `retry-after` |

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use equilearn_ledger::ErrorClass;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ledger(#[from] equilearn_ledger::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("unknown or missing caller identity")]
    MissingIdentity,

    #[error("admin role required")]
    Forbidden,
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Ledger(e) => match e.class() {
                ErrorClass::Validation => StatusCode::BAD_REQUEST,
                ErrorClass::NotFound => StatusCode::NOT_FOUND,
                ErrorClass::State => StatusCode::CONFLICT,
                ErrorClass::Conflict => StatusCode::SERVICE_UNAVAILABLE,
            },
            ApiError::MissingIdentity => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Database(_)
            | ApiError::Migrate(_)
            | ApiError::Json(_)
            | ApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        if status == StatusCode::SERVICE_UNAVAILABLE {
            // Internal commit retries are already exhausted at this point;
            // tell the client when to come back.
            return (status, [(header::RETRY_AFTER, "3")], body).into_response();
        }
        (status, body).into_response()
    }
}
