//! Environment-sourced configuration, built once at process start and passed
//! explicitly into the adapters that need it.

use crate::domain::DomainError;

pub const API_KEY_ENV: &str = "PERPLEXITY_API_KEY";
pub const BASE_URL_ENV: &str = "PERPLEXITY_BASE_URL";
pub const DEFAULT_MODEL_ENV: &str = "PERPLEXITY_DEFAULT_MODEL";
pub const MAX_RETRIES_ENV: &str = "PERPLEXITY_MAX_RETRIES";
pub const TIMEOUT_ENV: &str = "PERPLEXITY_TIMEOUT";

pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
pub const DEFAULT_MODEL: &str = "sonar";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for the chat-completion API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub default_model: String,
    /// Retry budget for callers that wrap their own retry logic; the client
    /// itself never retries.
    pub max_retries: u32,
    /// Per-request timeout applied to the underlying HTTP transport.
    pub timeout_secs: u64,
}

impl ClientConfig {
    /// Config with an explicit key and defaults for everything else.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Load from environment variables. Fails loudly when the API key is
    /// absent or empty; malformed numeric variables fall back to their
    /// defaults.
    pub fn from_env() -> Result<Self, DomainError> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                DomainError::config(format!(
                    "API key is required. Set the {API_KEY_ENV} environment variable."
                ))
            })?;

        Ok(Self {
            api_key,
            base_url: std::env::var(BASE_URL_ENV)
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            default_model: std::env::var(DEFAULT_MODEL_ENV)
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            max_retries: env_u32(MAX_RETRIES_ENV, DEFAULT_MAX_RETRIES),
            timeout_secs: env_u64(TIMEOUT_ENV, DEFAULT_TIMEOUT_SECS),
        })
    }
}

pub const SMTP_EMAIL_ENV: &str = "SMTP_EMAIL";
pub const SMTP_PASSWORD_ENV: &str = "SMTP_PASSWORD";
pub const SMTP_SERVER_ENV: &str = "SMTP_SERVER";
pub const SMTP_PORT_ENV: &str = "SMTP_PORT";

const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;

/// Settings for the SMTP report sender.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// Sender address, also used as the SMTP username.
    pub email: String,
    pub password: String,
    pub server: String,
    pub port: u16,
}

impl SmtpConfig {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            server: DEFAULT_SMTP_SERVER.to_string(),
            port: DEFAULT_SMTP_PORT,
        }
    }

    pub fn with_server(mut self, server: impl Into<String>, port: u16) -> Self {
        self.server = server.into();
        self.port = port;
        self
    }

    pub fn from_env() -> Result<Self, DomainError> {
        let email = std::env::var(SMTP_EMAIL_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                DomainError::config(format!(
                    "Sender address is required. Set the {SMTP_EMAIL_ENV} environment variable."
                ))
            })?;
        let password = std::env::var(SMTP_PASSWORD_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                DomainError::config(format!(
                    "SMTP password is required. Set the {SMTP_PASSWORD_ENV} environment variable."
                ))
            })?;

        Ok(Self {
            email,
            password,
            server: std::env::var(SMTP_SERVER_ENV)
                .unwrap_or_else(|_| DEFAULT_SMTP_SERVER.to_string()),
            port: std::env::var(SMTP_PORT_ENV)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
        })
    }
}

fn env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
