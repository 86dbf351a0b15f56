use garde::Validate;
use serde::Deserialize;
use std::path::PathBuf;

use crate::services::validation::validate_struct;

/// Connector settings, read from `TRYON_`-prefixed environment variables.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ConnectorConfig {
    /// Single-call endpoint (multipart POST, answers with JSON or image bytes)
    #[serde(default = "default_sync_endpoint")]
    #[garde(length(min = 1))]
    pub sync_endpoint: String,

    /// Job submission endpoint
    #[serde(default = "default_async_submit_url")]
    #[garde(length(min = 1))]
    pub async_submit_url: String,

    /// Job status endpoint; `{job_id}` is replaced by the job identifier
    #[serde(default = "default_async_status_url")]
    #[garde(length(min = 1))]
    pub async_status_url: String,

    /// Bearer token used when a request carries none
    #[serde(default)]
    #[garde(skip)]
    pub api_token: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    #[garde(range(min = 1))]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    #[garde(range(min = 1))]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_poll_interval_ms")]
    #[garde(range(min = 1, max = 600_000))]
    pub poll_interval_ms: u64,

    #[serde(default = "default_poll_max_attempts")]
    #[garde(range(min = 1, max = 1000))]
    pub poll_max_attempts: u32,

    /// Directory binary results are written into
    #[serde(default = "default_scratch_dir")]
    #[garde(skip)]
    pub scratch_dir: PathBuf,
}

const JOB_ID_PLACEHOLDER: &str = "{job_id}";

fn default_sync_endpoint() -> String {
    "https://tryon-api.com".to_string()
}

fn default_async_submit_url() -> String {
    "https://tryon-api.com/api/v1/tryon".to_string()
}

fn default_async_status_url() -> String {
    "https://tryon-api.com/api/v1/tryon/status/{job_id}".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_connect_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_poll_max_attempts() -> u32 {
    40
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("tryon-connector")
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            sync_endpoint: default_sync_endpoint(),
            async_submit_url: default_async_submit_url(),
            async_status_url: default_async_status_url(),
            api_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_max_attempts: default_poll_max_attempts(),
            scratch_dir: default_scratch_dir(),
        }
    }
}

impl ConnectorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config: Self = envy::prefixed("TRYON_").from_env()?;
        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        validate_struct(self).map_err(ConfigError::Invalid)?;
        self.status_url("job").map(|_| ())
    }

    /// Configured token, trimmed, if non-empty.
    pub fn bearer(&self) -> Option<&str> {
        self.api_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// Status URL for `job_id`, with the id percent-encoded as one path segment.
    ///
    /// The id replaces `{job_id}` in the template, or is appended as the last
    /// segment when the template has no placeholder.
    pub fn status_url(&self, job_id: &str) -> Result<String, ConfigError> {
        let template = self.async_status_url.trim();
        let (base, rest) = template.split_once(JOB_ID_PLACEHOLDER).unwrap_or((template, ""));

        let invalid = |reason: String| ConfigError::StatusUrl {
            template: template.to_string(),
            reason,
        };
        let mut url = reqwest::Url::parse(base).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(job_id);

        Ok(format!("{}{}", url, rest))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration from environment: {0}")]
    Env(#[from] envy::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("invalid status URL template {template}: {reason}")]
    StatusUrl { template: String, reason: String },
}
