pub mod fcm;
pub mod service_account;

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

/// Error code the provider attaches to a recipient whose registration is permanently gone.
pub const UNREGISTERED_ERROR_CODE: &str = "messaging/registration-token-not-registered";

#[derive(Error, Debug)]
pub enum PushError {
    #[error("Failed to authenticate with the push provider: {0}")]
    Auth(String),
    #[error("Push provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Provider returned {actual} responses for {expected} tokens")]
    Misaligned { expected: usize, actual: usize },
    #[error("External service error: {0}")]
    Other(#[from] anyhow::Error),
}

/// One data message addressed to many device tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MulticastMessage {
    pub data: BTreeMap<String, String>,
    pub tokens: Vec<String>,
}

/// Delivery result for a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResponse {
    pub success: bool,
    pub error_code: Option<String>,
}

impl SendResponse {
    #[must_use]
    pub const fn success() -> Self {
        Self { success: true, error_code: None }
    }

    #[must_use]
    pub fn failure(code: impl Into<String>) -> Self {
        Self { success: false, error_code: Some(code.into()) }
    }

    /// True only for the provider's "registration no longer valid" failure.
    ///
    /// Rate limiting, malformed tokens, and transient errors all return false.
    #[must_use]
    pub fn is_unregistered(&self) -> bool {
        !self.success && self.error_code.as_deref() == Some(UNREGISTERED_ERROR_CODE)
    }
}

/// Results of a multicast send; `responses[i]` belongs to `tokens[i]` of the message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResponse {
    pub success_count: usize,
    pub failure_count: usize,
    pub responses: Vec<SendResponse>,
}

impl BatchResponse {
    /// Builds a batch response, deriving the counts from the individual results.
    #[must_use]
    pub fn from_responses(responses: Vec<SendResponse>) -> Self {
        let success_count = responses.iter().filter(|r| r.success).count();
        Self { success_count, failure_count: responses.len() - success_count, responses }
    }
}

#[async_trait]
pub trait PushProvider: Send + Sync + std::fmt::Debug {
    /// Sends one data message to every token in `message`.
    ///
    /// Per-recipient rejections are reported inside the returned `BatchResponse`, index-aligned with
    /// `message.tokens`.
    ///
    /// # Errors
    /// Returns `PushError` when the call as a whole fails (credentials, network, quota on the project).
    async fn send_multicast(&self, message: &MulticastMessage) -> Result<BatchResponse, PushError>;
}
