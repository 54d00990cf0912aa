use std::path::{Path, PathBuf};

use reqwest::Url;

use crate::config::schema::{Environment, SyncConfig};
use crate::db::default_database_path;
use crate::error::ConfigError;

/// Environment variable that overrides the configured base URL.
pub const BACKEND_URL_ENV: &str = "FIELDWORK_BACKEND_URL";

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SyncConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<SyncConfig, ConfigError> {
    let config: SyncConfig = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

pub fn validate_config(config: &SyncConfig) -> Result<(), ConfigError> {
    if config.request_timeout_ms == 0 {
        return Err(ConfigError::Validation {
            message: "request_timeout_ms must be greater than 0".to_string(),
        });
    }

    if config.drain_interval_secs == 0 {
        return Err(ConfigError::Validation {
            message: "drain_interval_secs must be greater than 0".to_string(),
        });
    }

    if config.max_photos == 0 {
        return Err(ConfigError::Validation {
            message: "max_photos must be at least 1".to_string(),
        });
    }

    if let Some(url) = &config.base_url {
        validate_base_url(url)?;
    }

    Ok(())
}

fn validate_base_url(url: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        url: url.to_string(),
        reason,
    };
    let parsed = Url::parse(url.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https".to_string()));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(())
}

/// Resolves the service base URL.
///
/// Order: `FIELDWORK_BACKEND_URL` when set and non-empty, then the config
/// value, then the environment fallback. Trailing slashes are removed.
pub fn resolve_base_url(config: &SyncConfig, env: Environment) -> Result<String, ConfigError> {
    let from_env = std::env::var(BACKEND_URL_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty());

    let url = match (from_env, config.base_url.as_deref()) {
        (Some(url), _) => {
            validate_base_url(&url)?;
            url
        }
        (None, Some(url)) if !url.trim().is_empty() => url.to_string(),
        _ => {
            log::debug!("No base URL configured, using {:?} fallback", env);
            env.fallback_base_url().to_string()
        }
    };

    Ok(url.trim().trim_end_matches('/').to_string())
}

/// The configured database path, or the per-user default.
pub fn resolve_database_path(config: &SyncConfig) -> Result<PathBuf, ConfigError> {
    config
        .database_path
        .clone()
        .or_else(default_database_path)
        .ok_or(ConfigError::NoDatabasePath)
}
