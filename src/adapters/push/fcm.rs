use crate::adapters::push::service_account::ServiceAccount;
use crate::adapters::push::{
    BatchResponse, MulticastMessage, PushError, PushProvider, SendResponse, UNREGISTERED_ERROR_CODE,
};
use crate::config::FcmConfig;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;

pub const INVALID_ARGUMENT_ERROR_CODE: &str = "messaging/invalid-argument";
pub const RATE_EXCEEDED_ERROR_CODE: &str = "messaging/message-rate-exceeded";
pub const MISMATCHED_CREDENTIAL_ERROR_CODE: &str = "messaging/mismatched-credential";
pub const THIRD_PARTY_AUTH_ERROR_CODE: &str = "messaging/third-party-auth-error";
pub const SERVER_UNAVAILABLE_ERROR_CODE: &str = "messaging/server-unavailable";
pub const INTERNAL_ERROR_CODE: &str = "messaging/internal-error";
pub const UNKNOWN_ERROR_CODE: &str = "messaging/unknown-error";

const FCM_ERROR_TYPE: &str = "type.googleapis.com/google.firebase.fcm.v1.FcmError";

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorStatus,
}

#[derive(Debug, Deserialize)]
struct ErrorStatus {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "@type", default)]
    kind: Option<String>,
    #[serde(rename = "errorCode", default)]
    error_code: Option<String>,
}

/// Maps an FCM v1 error response onto the `messaging/*` code vocabulary.
///
/// The FCM-specific `errorCode` detail wins over the canonical gRPC status, which wins over the HTTP status.
fn classify_error(status: StatusCode, body: &str) -> &'static str {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();

    let fcm_code = envelope.as_ref().and_then(|e| {
        e.error
            .details
            .iter()
            .find(|d| d.kind.as_deref() == Some(FCM_ERROR_TYPE))
            .and_then(|d| d.error_code.as_deref())
    });

    if let Some(code) = fcm_code {
        match code {
            "UNREGISTERED" => return UNREGISTERED_ERROR_CODE,
            "INVALID_ARGUMENT" => return INVALID_ARGUMENT_ERROR_CODE,
            "QUOTA_EXCEEDED" => return RATE_EXCEEDED_ERROR_CODE,
            "SENDER_ID_MISMATCH" => return MISMATCHED_CREDENTIAL_ERROR_CODE,
            "THIRD_PARTY_AUTH_ERROR" => return THIRD_PARTY_AUTH_ERROR_CODE,
            "UNAVAILABLE" => return SERVER_UNAVAILABLE_ERROR_CODE,
            "INTERNAL" => return INTERNAL_ERROR_CODE,
            _ => {}
        }
    }

    match envelope.as_ref().and_then(|e| e.error.status.as_deref()) {
        Some("NOT_FOUND") => return UNREGISTERED_ERROR_CODE,
        Some("INVALID_ARGUMENT") => return INVALID_ARGUMENT_ERROR_CODE,
        Some("RESOURCE_EXHAUSTED") => return RATE_EXCEEDED_ERROR_CODE,
        Some("PERMISSION_DENIED") => return MISMATCHED_CREDENTIAL_ERROR_CODE,
        Some("UNAUTHENTICATED") => return THIRD_PARTY_AUTH_ERROR_CODE,
        Some("UNAVAILABLE") => return SERVER_UNAVAILABLE_ERROR_CODE,
        Some("INTERNAL") => return INTERNAL_ERROR_CODE,
        _ => {}
    }

    // A 404 without an FCM body (proxy, wrong base URL) says nothing about the token.
    match status {
        StatusCode::BAD_REQUEST => INVALID_ARGUMENT_ERROR_CODE,
        StatusCode::TOO_MANY_REQUESTS => RATE_EXCEEDED_ERROR_CODE,
        StatusCode::SERVICE_UNAVAILABLE => SERVER_UNAVAILABLE_ERROR_CODE,
        StatusCode::INTERNAL_SERVER_ERROR => INTERNAL_ERROR_CODE,
        _ => UNKNOWN_ERROR_CODE,
    }
}

/// Push provider backed by the Firebase Cloud Messaging HTTP v1 API.
#[derive(Debug)]
pub struct FcmPushProvider {
    client: reqwest::Client,
    account: ServiceAccount,
    send_url: String,
}

impl FcmPushProvider {
    /// Creates a provider from service account configuration.
    ///
    /// # Errors
    /// Returns `PushError` if the credentials are unusable or the HTTP client cannot be built.
    pub fn new(config: &FcmConfig) -> Result<Self, PushError> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        let account = ServiceAccount::from_config(config)?;
        let send_url =
            format!("{}/v1/projects/{}/messages:send", config.api_base_url(), account.project_id());

        Ok(Self { client, account, send_url })
    }

    /// Sends to one token. HTTP error responses become a per-token failure; transport errors fail the call.
    async fn send_one(
        &self,
        access_token: &str,
        token: &str,
        data: &BTreeMap<String, String>,
    ) -> Result<SendResponse, reqwest::Error> {
        let payload = json!({
            "message": {
                "token": token,
                "data": data,
            }
        });

        let resp = self
            .client
            .post(&self.send_url)
            .bearer_auth(access_token)
            .json(&payload)
            .send()
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "FCM send request failed"))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(SendResponse::success());
        }

        let body = resp.text().await.unwrap_or_default();
        let code = classify_error(status, &body);
        tracing::debug!(status = %status.as_u16(), code, "FCM rejected message");
        Ok(SendResponse::failure(code))
    }
}

#[async_trait]
impl PushProvider for FcmPushProvider {
    #[tracing::instrument(level = "debug", skip_all, fields(tokens = message.tokens.len()))]
    async fn send_multicast(&self, message: &MulticastMessage) -> Result<BatchResponse, PushError> {
        let access_token = self.account.access_token(&self.client).await?;

        // join_all yields results in input order, keeping responses aligned with tokens.
        let responses = futures::future::join_all(
            message.tokens.iter().map(|token| self.send_one(&access_token, token, &message.data)),
        )
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

        Ok(BatchResponse::from_responses(responses))
    }
}
