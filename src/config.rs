//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! The bearer token is referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`; it is never written into
//! the config file itself.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
///
/// Every field has a default so a minimal (or empty) `config.toml`
/// still yields a runnable daemon.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub verifier: VerifierConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EngineConfig {
    /// Path to the orders file.
    pub orders_file: String,
    /// Delay between passes, in milliseconds.
    pub poll_interval_ms: u64,
    /// Extended delay after an unexpected pass error, in milliseconds.
    pub error_cooldown_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            orders_file: "pedidos.json".to_string(),
            poll_interval_ms: 20_000,
            error_cooldown_ms: 60_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct VerifierConfig {
    /// Base URL of the verification service.
    pub base_url: String,
    /// Name of the env var holding the bearer token. An unset or empty
    /// variable means unauthenticated calls.
    pub token_env: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ejemplo.com".to_string(),
            token_env: "ORDERMON_TOKEN".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve the configured token env var to its value.
    /// Returns None when the variable is unset or empty.
    pub fn resolve_token(&self) -> Option<String> {
        match std::env::var(&self.verifier.token_env) {
            Ok(v) if !v.is_empty() => Some(v),
            _ => None,
        }
    }
}
