// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{DEFAULT_BACKOFF_FACTOR, DEFAULT_MAX_ATTEMPTS, MAX_CONFIG_ATTEMPTS};
use crate::context::Params;
use crate::engine::{ConcurrencyLimit, RetryPolicy};
use crate::errors::ConfigError;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Engine-wide settings applied when building graphs and batch flows.
///
/// Every section is optional; an empty file yields the built-in defaults
/// (single attempt, unbounded parallelism, no default params).
///
/// # Fields
/// * `retry` - Default retry policy for nodes that do not declare their own
/// * `parallel` - Concurrency bound for parallel batch flows and nodes
/// * `default_params` - Params every flow run starts from
///
/// # Example
/// ```yaml
/// retry:
///   max_attempts: 3
///   wait_ms: 100
///   backoff_factor: 2.0
///   max_wait_ms: 5000
/// parallel:
///   max_concurrency: 8
/// default_params:
///   model: "echo"
/// ```
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub parallel: ParallelConfig,
    #[serde(default)]
    pub default_params: HashMap<String, serde_json::Value>,
}

/// Retry settings as written in a config file. Unset fields use the policy defaults.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    pub max_attempts: Option<u32>,
    pub wait_ms: Option<u64>,
    pub backoff_factor: Option<f64>,
    pub max_wait_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ParallelConfig {
    /// `None` means unbounded.
    pub max_concurrency: Option<usize>,
}

/// Serialization format of a config file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Ok(ConfigFormat::Yaml)
            }
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(ConfigFormat::Toml),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}

impl EngineConfig {
    /// Reject values the engine would otherwise have to silently clamp.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(attempts) = self.retry.max_attempts {
            if attempts == 0 {
                return Err(ConfigError::Invalid {
                    field: "retry.max_attempts",
                    reason: "must be at least 1".to_string(),
                });
            }
            if attempts > MAX_CONFIG_ATTEMPTS {
                return Err(ConfigError::Invalid {
                    field: "retry.max_attempts",
                    reason: format!("must not exceed {MAX_CONFIG_ATTEMPTS}, got {attempts}"),
                });
            }
        }

        if let Some(factor) = self.retry.backoff_factor {
            if !factor.is_finite() || factor < 1.0 {
                return Err(ConfigError::Invalid {
                    field: "retry.backoff_factor",
                    reason: format!("must be a finite number >= 1.0, got {factor}"),
                });
            }
        }

        if let (Some(wait), Some(max_wait)) = (self.retry.wait_ms, self.retry.max_wait_ms) {
            if max_wait < wait {
                return Err(ConfigError::Invalid {
                    field: "retry.max_wait_ms",
                    reason: format!("must be >= retry.wait_ms ({wait}), got {max_wait}"),
                });
            }
        }

        if self.parallel.max_concurrency == Some(0) {
            return Err(ConfigError::Invalid {
                field: "parallel.max_concurrency",
                reason: "must be at least 1; omit it for unbounded".to_string(),
            });
        }

        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let retry = &self.retry;
        let mut policy = RetryPolicy::new(retry.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS))
            .with_backoff_factor(retry.backoff_factor.unwrap_or(DEFAULT_BACKOFF_FACTOR));
        if let Some(wait_ms) = retry.wait_ms {
            policy = policy.with_wait(Duration::from_millis(wait_ms));
        }
        if let Some(max_wait_ms) = retry.max_wait_ms {
            policy = policy.with_max_wait(Duration::from_millis(max_wait_ms));
        }
        policy
    }

    pub fn max_concurrency(&self) -> Option<usize> {
        self.parallel.max_concurrency
    }

    pub fn concurrency_limit(&self) -> ConcurrencyLimit {
        ConcurrencyLimit::from(self.parallel.max_concurrency)
    }

    pub fn default_params(&self) -> Params {
        Params::from(self.default_params.clone())
    }
}

/// Parse config text in the given format without validating it.
pub fn parse_config(content: &str, format: ConfigFormat) -> Result<EngineConfig, ConfigError> {
    let cfg = match format {
        ConfigFormat::Yaml if content.trim().is_empty() => EngineConfig::default(),
        ConfigFormat::Yaml => serde_yaml::from_str(content)?,
        ConfigFormat::Toml => toml::from_str(content)?,
    };
    Ok(cfg)
}

/// Load a config from a YAML or TOML file, picking the parser by extension.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let format = ConfigFormat::from_path(path)?;
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content, format)
}

/// Load a config file and reject out-of-range values.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<EngineConfig, ConfigError> {
    let cfg = load_config(path)?;
    cfg.validate()?;
    Ok(cfg)
}
