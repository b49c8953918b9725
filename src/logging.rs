//! Structured logging setup.
//!
//! Everything in the crate logs through `tracing` with key/value fields
//! (`request_id`, `operation`, `status`, `latency_ms`, ...). Applications call
//! [`init_logging`] once at startup to install a subscriber; libraries and
//! tests that install their own subscriber need not call it at all.
//!
//! ## Environment Variables
//!
//! | Variable                     | Default | Meaning                          |
//! |------------------------------|---------|----------------------------------|
//! | `BRRTR_LOG_LEVEL`            | `info`  | trace/debug/info/warn/error      |
//! | `BRRTR_LOG_FORMAT`           | `json`  | `json` or `pretty`               |
//! | `BRRTR_LOG_TARGET_FILTER`    | unset   | extra comma-separated directives |
//! | `BRRTR_LOG_INCLUDE_LOCATION` | `false` | include file and line            |
//!
//! `RUST_LOG`, when set, takes precedence over `BRRTR_LOG_LEVEL`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    /// Module filter (comma-separated directives)
    pub target_filter: Option<String>,
    /// Include file:line location (dev only)
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            target_filter: None,
            include_location: false,
        }
    }
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Same as [`LogConfig::from_env`] over an arbitrary variable source.
    #[must_use]
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            log_level: var("BRRTR_LOG_LEVEL").unwrap_or(defaults.log_level),
            format: var("BRRTR_LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or(defaults.format),
            target_filter: var("BRRTR_LOG_TARGET_FILTER").filter(|s| !s.trim().is_empty()),
            include_location: var("BRRTR_LOG_INCLUDE_LOCATION")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.include_location),
        }
    }

    /// Verbose pretty logging for local development
    #[must_use]
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            target_filter: None,
            include_location: true,
        }
    }

    /// Build the level filter, with `RUST_LOG` taking precedence over `log_level`.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        let mut filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.log_level.to_lowercase()))
            .with_context(|| format!("invalid log level '{}'", self.log_level))?;

        // Connection-level noise from the HTTP server stays at warn.
        filter = filter.add_directive(
            "may_minihttp::http_server=warn"
                .parse()
                .context("invalid may_minihttp directive")?,
        );

        if let Some(targets) = &self.target_filter {
            for directive in targets.split(',').map(str::trim).filter(|d| !d.is_empty()) {
                filter = filter.add_directive(
                    directive
                        .parse()
                        .with_context(|| format!("invalid log filter directive '{directive}'"))?,
                );
            }
        }
        Ok(filter)
    }
}

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// Fails on an invalid filter directive or when a global subscriber is
/// already installed.
///
/// # Example
///
/// ```no_run
/// use brrtdispatch::logging::{init_logging, LogConfig};
///
/// init_logging(&LogConfig::from_env()).expect("Failed to initialize logging");
/// ```
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = config.env_filter()?;

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    tracing::info!(
        log_level = %config.log_level,
        format = ?config.format,
        "Logging initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = LogConfig::from_vars(vars(&[]));
        assert_eq!(cfg, LogConfig::default());
    }

    #[test]
    fn test_from_vars() {
        let cfg = LogConfig::from_vars(vars(&[
            ("BRRTR_LOG_LEVEL", "debug"),
            ("BRRTR_LOG_FORMAT", "Pretty"),
            ("BRRTR_LOG_TARGET_FILTER", "brrtdispatch::binder=trace"),
            ("BRRTR_LOG_INCLUDE_LOCATION", "true"),
        ]));
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.format, LogFormat::Pretty);
        assert!(cfg.include_location);
        assert!(cfg.env_filter().is_ok());
    }

    #[test]
    fn test_unknown_format_falls_back_to_json() {
        assert_eq!(LogFormat::parse("xml"), LogFormat::Json);
    }
}
