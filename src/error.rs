use crate::adapters::database::push_token_repo::StoreError;
use crate::adapters::push::PushError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

pub const NO_RECIPIENTS_MESSAGE: &str = "No valid FCM tokens found";
pub const DISPATCH_FAILED_MESSAGE: &str = "Failed to send notification";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Authentication failed")]
    AuthError,
    #[error("No registered push tokens")]
    NoRecipients,
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Broadcast exceeded its {0:?} deadline")]
    Timeout(std::time::Duration),
    #[error("Push provider error: {0}")]
    Provider(#[from] PushError),
    #[error("Token store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => {
                tracing::debug!(message = %msg, "Bad request");
                (StatusCode::BAD_REQUEST, msg)
            }
            Self::AuthError => {
                tracing::debug!("Authentication failed");
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
            }
            Self::NoRecipients => {
                tracing::info!("No push tokens registered, nothing sent");
                (StatusCode::BAD_REQUEST, NO_RECIPIENTS_MESSAGE.to_string())
            }
            Self::RateLimited => {
                tracing::debug!("Rate limit exceeded");
                (StatusCode::TOO_MANY_REQUESTS, "Too many requests".to_string())
            }
            Self::Timeout(limit) => {
                tracing::error!(limit_ms = %limit.as_millis(), "Broadcast timed out");
                (StatusCode::INTERNAL_SERVER_ERROR, DISPATCH_FAILED_MESSAGE.to_string())
            }
            Self::Provider(e) => {
                tracing::error!(error = %e, "Push provider error");
                (StatusCode::INTERNAL_SERVER_ERROR, DISPATCH_FAILED_MESSAGE.to_string())
            }
            Self::Store(e) => {
                tracing::error!(error = %e, "Token store error");
                (StatusCode::INTERNAL_SERVER_ERROR, DISPATCH_FAILED_MESSAGE.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
