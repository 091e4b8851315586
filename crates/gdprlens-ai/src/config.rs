//! Annotator configuration, validated once at startup.

use std::time::Duration;

use thiserror::Error;

use crate::retry::RetryPolicy;

/// Key shipped in sample configuration; never a real credential.
pub const PLACEHOLDER_API_KEY: &str = "your-deepseek-api-key";

pub const DEFAULT_ENDPOINT: &str = "https://api.deepseek.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "deepseek-chat";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API key is not set")]
    MissingApiKey,
    #[error("API key is still the placeholder \"your-deepseek-api-key\"")]
    PlaceholderApiKey,
    #[error("endpoint must be an http(s) URL, got {0:?}")]
    InvalidEndpoint(String),
    #[error("retry policy must allow at least one attempt")]
    NoAttempts,
}

/// Process-wide settings for the completion endpoint.
#[derive(Clone)]
pub struct AnnotatorConfig {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-attempt timeout for annotation requests.
    pub request_timeout: Duration,
    /// Timeout for the connectivity check.
    pub check_timeout: Duration,
    pub retry: RetryPolicy,
}

// Keeps the key out of logs.
impl std::fmt::Debug for AnnotatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotatorConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout", &self.request_timeout)
            .field("check_timeout", &self.check_timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl AnnotatorConfig {
    /// Configuration with the default endpoint, model, and limits.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.3,
            max_tokens: 1024,
            request_timeout: Duration::from_secs(120),
            check_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let key = self.api_key.trim();
        if key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if key == PLACEHOLDER_API_KEY {
            return Err(ConfigError::PlaceholderApiKey);
        }
        if !(self.endpoint.starts_with("https://") || self.endpoint.starts_with("http://")) {
            return Err(ConfigError::InvalidEndpoint(self.endpoint.clone()));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::NoAttempts);
        }
        Ok(())
    }
}
