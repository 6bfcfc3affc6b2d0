//! Log subscriber setup for the gateway binary.
//!
//! `RUST_LOG`, when set, takes precedence over `log.level` from the configuration.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LogConfig, LogFormat};
use crate::error::ConfigError;

/// Builds the level filter: `RUST_LOG` first, then `log.level`.
pub fn build_filter(cfg: &LogConfig) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&cfg.level).map_err(|e| ConfigError::invalid("log", "level", e.to_string()))
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init(cfg: &LogConfig) -> Result<(), ConfigError> {
    let filter = build_filter(cfg)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match cfg.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_thread_names(true).with_target(true))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().pretty().with_thread_names(true))
            .try_init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_thread_names(true).with_target(false))
            .try_init(),
    };
    installed.map_err(|e| ConfigError::invalid("log", "format", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_malformed_level() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let cfg = LogConfig {
            level: "firestation_gateway=loud".into(),
            format: LogFormat::Compact,
        };
        assert_eq!(build_filter(&cfg).unwrap_err().as_label(), "config_invalid");
    }

    #[test]
    fn test_accepts_directives() {
        let cfg = LogConfig {
            level: "info,firestation_gateway::consumers=debug".into(),
            format: LogFormat::Json,
        };
        assert!(build_filter(&cfg).is_ok());
    }
}
