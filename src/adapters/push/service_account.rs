use crate::adapters::push::PushError;
use crate::config::FcmConfig;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::RwLock;

pub const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

const fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: OffsetDateTime,
}

impl CachedToken {
    fn is_fresh(&self, now: OffsetDateTime) -> bool {
        now + time::Duration::seconds(REFRESH_MARGIN_SECS) < self.expires_at
    }
}

/// Environment variables cannot carry raw newlines reliably, so keys usually arrive with `\n` escapes.
#[must_use]
pub fn normalize_private_key(raw: &str) -> String {
    raw.replace("\\n", "\n")
}

/// Google service account able to mint OAuth2 access tokens for FCM.
///
/// Access tokens are cached and refreshed shortly before they expire.
pub struct ServiceAccount {
    project_id: String,
    client_email: String,
    token_uri: String,
    key_id: Option<String>,
    key: EncodingKey,
    cached: RwLock<Option<CachedToken>>,
}

impl std::fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl ServiceAccount {
    /// Loads the service account from configuration.
    ///
    /// # Errors
    /// Returns `PushError::Auth` if the account type is wrong or the private key is not a valid RSA PEM.
    pub fn from_config(config: &FcmConfig) -> Result<Self, PushError> {
        if config.account_type != "service_account" {
            return Err(PushError::Auth(format!("Unsupported credential type: {}", config.account_type)));
        }

        let pem = normalize_private_key(&config.private_key);
        let key = EncodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|e| PushError::Auth(format!("Invalid service account private key: {e}")))?;

        Ok(Self {
            project_id: config.project_id.clone(),
            client_email: config.client_email.clone(),
            token_uri: config.token_uri.clone(),
            key_id: config.private_key_id.clone(),
            key,
            cached: RwLock::new(None),
        })
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Signs the JWT assertion exchanged for an access token.
    ///
    /// # Errors
    /// Returns `PushError::Auth` if signing fails.
    pub fn sign_assertion(&self, now: OffsetDateTime) -> Result<String, PushError> {
        let iat = now.unix_timestamp();
        let claims = AssertionClaims {
            iss: self.client_email.clone(),
            scope: FCM_SCOPE.to_string(),
            aud: self.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid.clone_from(&self.key_id);

        jsonwebtoken::encode(&header, &claims, &self.key)
            .map_err(|e| PushError::Auth(format!("Failed to sign token assertion: {e}")))
    }

    /// Returns a valid access token, fetching a new one if the cached token is missing or about to expire.
    ///
    /// # Errors
    /// Returns `PushError` if the token endpoint is unreachable or rejects the assertion.
    pub async fn access_token(&self, client: &reqwest::Client) -> Result<String, PushError> {
        let now = OffsetDateTime::now_utc();
        if let Some(token) = self.cached.read().await.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        let mut cached = self.cached.write().await;
        // Another request may have refreshed while we waited for the lock.
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        let token = self.fetch_token(client, now).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    #[tracing::instrument(level = "debug", skip(self, client), fields(token_uri = %self.token_uri))]
    async fn fetch_token(&self, client: &reqwest::Client, now: OffsetDateTime) -> Result<CachedToken, PushError> {
        let assertion = self.sign_assertion(now)?;

        let resp = client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PushError::Auth(format!("Token endpoint returned {status}: {body}")));
        }

        let token: TokenResponse = resp.json().await?;
        tracing::debug!(expires_in = token.expires_in, "Obtained FCM access token");

        Ok(CachedToken { value: token.access_token, expires_at: now + time::Duration::seconds(token.expires_in) })
    }
}
