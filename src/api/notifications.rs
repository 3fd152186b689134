use crate::api::AppState;
use crate::api::middleware::Authorized;
use crate::api::schemas::notifications::{SendNotificationRequest, SendNotificationResponse};
use crate::error::{AppError, Result};
use axum::{Json, extract::State, extract::rejection::JsonRejection};

/// Broadcasts a notification to every registered device.
///
/// # Errors
/// Returns `AppError::BadRequest` if the payload is malformed or incomplete.
/// Returns `AppError::NoRecipients` if no tokens are registered.
/// Returns `AppError::Store`, `AppError::Provider` or `AppError::Timeout` if the broadcast fails.
pub async fn send_notification(
    _auth: Authorized,
    State(state): State<AppState>,
    payload: std::result::Result<Json<SendNotificationRequest>, JsonRejection>,
) -> Result<Json<SendNotificationResponse>> {
    let Json(payload) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let notification = payload.validate().map_err(AppError::BadRequest)?;

    let report = state.dispatch_service.dispatch(&notification).await?;

    Ok(Json(SendNotificationResponse { success: true, sent: report.sent, failed: report.failed }))
}
