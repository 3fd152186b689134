use clap::{Args, Parser, ValueEnum};

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    #[command(flatten)]
    pub server: ServerConfig,

    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub dispatch: DispatchConfig,

    #[command(flatten)]
    pub fcm: FcmConfig,

    #[command(flatten)]
    pub auth: AuthConfig,

    #[command(flatten)]
    pub rate_limit: RateLimitConfig,

    #[command(flatten)]
    pub health: HealthConfig,

    #[command(flatten)]
    pub telemetry: TelemetryConfig,
}

#[derive(Clone, Debug, Args)]
pub struct ServerConfig {
    /// Host to listen on
    #[arg(long, env = "PUSHCAST_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Port for the management listener (health probes)
    #[arg(long, env = "PUSHCAST_MGMT_PORT", default_value_t = 9090)]
    pub mgmt_port: u16,

    /// How long to wait for in-flight work during shutdown
    #[arg(long, env = "PUSHCAST_SHUTDOWN_TIMEOUT_SECS", default_value_t = 5)]
    pub shutdown_timeout_secs: u64,

    /// Upper bound on the time a single HTTP request may take
    #[arg(long, env = "PUSHCAST_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub request_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[arg(long = "database-url", env = "PUSHCAST_DATABASE_URL")]
    pub url: String,

    /// Maximum number of pooled connections
    #[arg(long, env = "PUSHCAST_DB_MAX_CONNECTIONS", default_value_t = 10)]
    pub max_connections: u32,

    /// How long to wait for a pooled connection
    #[arg(long, env = "PUSHCAST_DB_ACQUIRE_TIMEOUT_SECS", default_value_t = 5)]
    pub acquire_timeout_secs: u64,
}

#[derive(Clone, Debug, Args)]
pub struct DispatchConfig {
    /// Maximum number of recipients per multicast call
    #[arg(
        long,
        env = "PUSHCAST_MAX_BATCH_SIZE",
        default_value_t = 500,
        value_parser = clap::value_parser!(u32).range(1..=500)
    )]
    pub max_batch_size: u32,
}

/// Google service account credentials plus FCM client tuning.
///
/// The environment variable names follow the layout of a downloaded service account JSON file.
#[derive(Clone, Debug, Args)]
pub struct FcmConfig {
    #[arg(long = "service-account-type", env = "SERVICE_ACCOUNT_TYPE", default_value = "service_account")]
    pub account_type: String,

    #[arg(long, env = "SERVICE_ACCOUNT_PROJECT_ID")]
    pub project_id: String,

    #[arg(long, env = "SERVICE_ACCOUNT_PRIVATE_KEY_ID")]
    pub private_key_id: Option<String>,

    /// PEM encoded RSA key; literal `\n` sequences are accepted
    #[arg(long, env = "SERVICE_ACCOUNT_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,

    #[arg(long, env = "SERVICE_ACCOUNT_CLIENT_EMAIL")]
    pub client_email: String,

    // The following identity and certificate fields are accepted so a service account file can be exported
    // as-is; signing only needs the key, key id, email and token URI.
    #[arg(long, env = "SERVICE_ACCOUNT_CLIENT_ID")]
    pub client_id: Option<String>,

    #[arg(long, env = "SERVICE_ACCOUNT_AUTH_URI")]
    pub auth_uri: Option<String>,

    #[arg(long, env = "SERVICE_ACCOUNT_TOKEN_URI", default_value = "https://oauth2.googleapis.com/token")]
    pub token_uri: String,

    #[arg(long, env = "SERVICE_ACCOUNT_AUTH_PROVIDER_X509_CERT_URL")]
    pub auth_provider_x509_cert_url: Option<String>,

    #[arg(long, env = "SERVICE_ACCOUNT_CLIENT_X509_CERT_URL")]
    pub client_x509_cert_url: Option<String>,

    /// Domain the default FCM endpoint lives under
    #[arg(long, env = "SERVICE_ACCOUNT_UNIVERSE_DOMAIN", default_value = "googleapis.com")]
    pub universe_domain: String,

    /// Base URL of the FCM HTTP v1 API; defaults to `https://fcm.<universe domain>`
    #[arg(long = "fcm-base-url", env = "PUSHCAST_FCM_BASE_URL")]
    pub base_url: Option<String>,

    /// Per-request timeout for FCM and OAuth calls
    #[arg(long = "fcm-timeout-secs", env = "PUSHCAST_FCM_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,
}

impl FcmConfig {
    /// FCM API root without a trailing slash.
    #[must_use]
    pub fn api_base_url(&self) -> String {
        self.base_url.as_deref().map_or_else(
            || format!("https://fcm.{}", self.universe_domain),
            |url| url.trim_end_matches('/').to_string(),
        )
    }
}

#[derive(Clone, Debug, Args)]
pub struct AuthConfig {
    /// Shared secret required as a bearer token on the broadcast endpoint. Unset disables the check.
    #[arg(long, env = "PUSHCAST_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct RateLimitConfig {
    /// Requests per second allowed per client IP
    #[arg(long = "rate-limit-per-second", env = "PUSHCAST_RATE_LIMIT_PER_SECOND", default_value_t = 5)]
    pub per_second: u32,

    /// Burst allowance per client IP
    #[arg(long = "rate-limit-burst", env = "PUSHCAST_RATE_LIMIT_BURST", default_value_t = 10)]
    pub burst: u32,
}

#[derive(Clone, Debug, Args)]
pub struct HealthConfig {
    /// Timeout for the database readiness check
    #[arg(long, env = "PUSHCAST_HEALTH_DB_TIMEOUT_MS", default_value_t = 2000)]
    pub db_timeout_ms: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Debug, Args)]
pub struct TelemetryConfig {
    /// Log output format
    #[arg(long, env = "PUSHCAST_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint; telemetry export is disabled when unset
    #[arg(long, env = "PUSHCAST_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

impl Config {
    #[must_use]
    pub fn load() -> Self {
        Self::parse()
    }
}
