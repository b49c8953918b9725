//! # Runtime Configuration Module
//!
//! Two layers of configuration:
//!
//! - [`RuntimeConfig`]: environment variables tuning the runtime, read with
//!   [`RuntimeConfig::from_env`]
//! - [`ServiceConfig`]: an optional YAML file for the HTTP adapter and the
//!   default request context
//!
//! ## Environment Variables
//!
//! ### `BRRTR_STACK_SIZE`
//!
//! Stack size for `may` coroutines. Accepts decimal (`16384`) or hex
//! (`0x4000`). Default: `0x4000` (16 KB).
//!
//! ### `BRRTR_MAX_BODY_BYTES`
//!
//! Largest request body the HTTP adapter reads. Default: 1 MiB.
//!
//! ### `BRRTR_VALIDATION_MODE`
//!
//! `strict` (presence and schema) or `lenient` (presence only). Default: `strict`.
//!
//! ## YAML
//!
//! ```yaml
//! http:
//!   addr: 0.0.0.0:8080
//!   max_body_bytes: 1048576
//! validation:
//!   mode: lenient
//! logging:
//!   log_level: debug
//!   format: pretty
//! ```
//!
//! Every section and field is optional.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::logging::LogConfig;
use crate::validator::ValidationMode;

pub const DEFAULT_STACK_SIZE: usize = 0x4000;
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes (default: 16 KB / 0x4000)
    pub stack_size: usize,
    pub max_body_bytes: usize,
    /// `None` when the variable is unset, so a config file can decide
    pub validation_mode: Option<ValidationMode>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            validation_mode: None,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Same as [`RuntimeConfig::from_env`] over an arbitrary variable source.
    #[must_use]
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            stack_size: var("BRRTR_STACK_SIZE")
                .and_then(|v| parse_size(&v))
                .unwrap_or(DEFAULT_STACK_SIZE),
            max_body_bytes: var("BRRTR_MAX_BODY_BYTES")
                .and_then(|v| parse_size(&v))
                .unwrap_or(DEFAULT_MAX_BODY_BYTES),
            validation_mode: var("BRRTR_VALIDATION_MODE").and_then(|v| v.parse().ok()),
        }
    }
}

fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub addr: String,
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub mode: ValidationMode,
}

/// Service configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub http: HttpConfig,
    pub validation: ValidationConfig,
    pub logging: LogConfig,
}

impl ServiceConfig {
    /// Read a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Let set environment variables override the file.
    ///
    /// The body limit only follows the environment when the variable is set
    /// to something other than the default.
    #[must_use]
    pub fn with_runtime_overrides(mut self, runtime: &RuntimeConfig) -> Self {
        if let Some(mode) = runtime.validation_mode {
            self.validation.mode = mode;
        }
        if runtime.max_body_bytes != DEFAULT_MAX_BODY_BYTES {
            self.http.max_body_bytes = runtime.max_body_bytes;
        }
        self
    }
}
