use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not the owner: {0}")]
    NotOwner(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Payment session error: {0}")]
    PaymentSession(String),

    /// The posting was saved, only its image was lost.
    #[error("Image upload failed for posting {posting_id}: {reason}")]
    AssetUpload { posting_id: Uuid, reason: String },

    #[error("Activation error: {0}")]
    Activation(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

impl Error {
    /// Stable machine-readable tag rendered next to the message.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::BadRequest(_) => "bad_request",
            Error::Unauthorized(_) => "unauthorized",
            Error::NotFound(_) => "not_found",
            Error::NotOwner(_) => "not_owner",
            Error::Validation(_) => "validation",
            Error::PaymentSession(_) => "payment_session",
            Error::AssetUpload { .. } => "asset_upload",
            Error::Activation(_) => "activation",
            Error::Database(_) => "database",
            Error::Json(_) => "json",
            Error::Reqwest(_) => "http",
            Error::Internal(_) => "internal",
            Error::Io(_) => "io",
            Error::Multipart(_) => "multipart",
        }
    }

    /// Whether the caller should be offered a retry path.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::PaymentSession(_) | Error::Activation(_) | Error::Database(_)
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let kind = self.kind();
        let retryable = self.is_retryable();
        let (status, error_message) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Error::NotOwner(msg) => (StatusCode::FORBIDDEN, msg),
            Error::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::PaymentSession(msg) => (
                StatusCode::BAD_GATEWAY,
                format!("Could not start payment, please try again: {}", msg),
            ),
            Error::AssetUpload { reason, .. } => (StatusCode::BAD_GATEWAY, reason),
            Error::Activation(msg) => {
                tracing::error!(error = %msg, "Posting activation failed");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Failed to activate job posting. Please contact support.".to_string(),
                )
            }
            Error::Database(err) => {
                tracing::error!(error = ?err, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            Error::Json(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Reqwest(err) => (
                StatusCode::BAD_GATEWAY,
                format!("External service error: {}", err),
            ),
            Error::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Error::Io(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            Error::Multipart(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Config(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
            "kind": kind,
            "retryable": retryable,
        }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}
