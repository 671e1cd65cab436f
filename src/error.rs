use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Shared error message constants so handlers and tests agree on wording.
pub mod msg {
    pub const INVOICE_NOT_FOUND: &str = "Invoice not found";
    pub const CLIENT_NOT_FOUND: &str = "Client not found";
    pub const PROJECT_NOT_FOUND: &str = "Project not found";
    pub const INVOICE_NOT_LINKED: &str = "Invoice has no Stripe invoice attached";
    pub const INVOICE_ALREADY_PAID: &str = "Invoice is already paid";
    pub const LINE_ITEMS_EMPTY: &str = "At least one line item is required";
    pub const EMAIL_EMPTY: &str = "Email cannot be empty";
    pub const INVALID_EMAIL_FORMAT: &str = "Invalid email format";
    pub const NAME_EMPTY: &str = "Name cannot be empty";
    pub const INVALID_DUE_DATE: &str = "Invalid due date (expected YYYY-MM-DD)";
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Attempt to charge an invoice that is already paid.
    #[error("Already paid: {0}")]
    AlreadyPaid(String),

    /// Operation requires a Stripe invoice reference the local row lacks.
    #[error("Not linked: {0}")]
    NotLinked(String),

    /// A fetched Stripe invoice could not be mapped to a local user.
    #[error("User resolution failed: {0}")]
    UserResolution(String),

    /// Failure reported by the payment provider.
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
            AppError::AlreadyPaid(m) => (StatusCode::BAD_REQUEST, m.clone()),
            AppError::NotLinked(m) => (StatusCode::BAD_REQUEST, m.clone()),
            AppError::UserResolution(m) => {
                tracing::error!("User resolution failed: {}", m);
                (StatusCode::INTERNAL_SERVER_ERROR, m.clone())
            }
            AppError::Provider(m) => {
                tracing::error!("Provider error: {}", m);
                (StatusCode::INTERNAL_SERVER_ERROR, m.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Json(e) => (StatusCode::BAD_REQUEST, format!("Invalid JSON: {}", e)),
            AppError::Internal(m) => {
                tracing::error!("Internal error: {}", m);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ErrorResponse { error };

        (status, Json(body)).into_response()
    }
}

/// Convert `Option<T>` lookups into `AppError::NotFound` with a fixed message.
pub trait OptionExt<T> {
    fn or_not_found(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_found(self, message: &str) -> Result<T> {
        self.ok_or_else(|| AppError::NotFound(message.to_string()))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
