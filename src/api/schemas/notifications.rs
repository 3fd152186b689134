use crate::domain::notification::Notification;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SendNotificationRequest {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl SendNotificationRequest {
    /// Validates the broadcast payload.
    ///
    /// # Errors
    /// Returns an error if `title` or `body` is missing or blank.
    pub fn validate(self) -> Result<Notification, String> {
        let title = self.title.ok_or("Title is required")?;
        let body = self.body.ok_or("Body is required")?;
        Notification::new(title, body)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendNotificationResponse {
    pub success: bool,
    pub sent: usize,
    pub failed: usize,
}
