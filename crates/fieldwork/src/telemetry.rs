//! Process-wide logging setup.
//!
//! Library code logs through `log` and opens `tracing` spans; this installs
//! one `tracing-subscriber` registry for both and bridges `log` records into
//! it.

use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. Returns `false` if one was already set,
/// so calling it twice is harmless.
pub fn init_logging(format: LogFormat) -> bool {
    let installed = match format {
        LogFormat::Text => {
            let subscriber = Registry::default()
                .with(env_filter())
                .with(fmt::layer().with_target(true));
            tracing::subscriber::set_global_default(subscriber).is_ok()
        }
        LogFormat::Json => {
            let subscriber = Registry::default()
                .with(env_filter())
                .with(fmt::layer().json().with_current_span(true));
            tracing::subscriber::set_global_default(subscriber).is_ok()
        }
    };

    if !installed {
        return false;
    }

    if let Err(e) = LogTracer::init() {
        tracing::debug!("log bridge not installed: {}", e);
    }
    tracing::debug!("Logging initialized ({:?})", format);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(LogFormat::Text);
        assert!(!init_logging(LogFormat::Json));
        log::info!("still logging after a second init");
    }
}
