use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::net::RetryPolicy;

/// Runtime settings of the sync core. Every field has a default, so an
/// empty JSON object is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the document-generation service. Overridden by
    /// `FIELDWORK_BACKEND_URL`.
    #[serde(default)]
    pub base_url: Option<String>,
    /// SQLite file. Defaults to `~/.fieldwork/data/fieldwork.db`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_drain_interval_secs")]
    pub drain_interval_secs: u64,
    /// Largest serialized submission accepted before any network attempt.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
    #[serde(default = "default_max_photos")]
    pub max_photos: usize,
    #[serde(default = "default_draft_max_bytes")]
    pub draft_max_bytes: usize,
    /// Photos older than this many days are purged at startup. Never when unset.
    #[serde(default)]
    pub photo_retention_days: Option<u32>,
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_drain_interval_secs() -> u64 {
    20
}

fn default_max_payload_bytes() -> usize {
    8 * 1024 * 1024
}

fn default_max_photos() -> usize {
    4
}

fn default_draft_max_bytes() -> usize {
    180_000
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            database_path: None,
            request_timeout_ms: default_request_timeout_ms(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            drain_interval_secs: default_drain_interval_secs(),
            max_payload_bytes: default_max_payload_bytes(),
            max_photos: default_max_photos(),
            draft_max_bytes: default_draft_max_bytes(),
            photo_retention_days: None,
        }
    }
}

impl SyncConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(self.request_timeout_ms),
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }

    pub fn drain_interval(&self) -> Duration {
        Duration::from_secs(self.drain_interval_secs)
    }
}

/// Deployment flavor, used only to pick a fallback base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn fallback_base_url(&self) -> &'static str {
        match self {
            Environment::Development => "http://127.0.0.1:8000",
            // Placeholder; production builds must configure a real URL.
            Environment::Production => "https://fieldwork.invalid",
        }
    }
}
