use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::inference::Provider;

/// Application configuration loaded from environment variables.
/// Fails at startup on malformed values. A missing credential is tolerated here
/// and reported per request instead.
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: Provider,
    pub inference_url: String,
    pub inference_model: String,
    pub api_key: Option<String>,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub request_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let provider: Provider = lookup("INFERENCE_PROVIDER")
            .unwrap_or_else(|| "huggingface".to_string())
            .parse()?;

        let max_attempts = parse_or(&lookup, "INFERENCE_MAX_ATTEMPTS", 3u32)?;
        if max_attempts == 0 {
            bail!("INFERENCE_MAX_ATTEMPTS must be at least 1");
        }

        Ok(Config {
            inference_url: lookup("INFERENCE_API_URL")
                .unwrap_or_else(|| provider.default_url().to_string()),
            inference_model: lookup("INFERENCE_MODEL")
                .unwrap_or_else(|| "gpt-3.5-turbo".to_string()),
            api_key: lookup(provider.credential_var()).filter(|key| !key.trim().is_empty()),
            max_attempts,
            retry_delay: Duration::from_secs(parse_or(&lookup, "INFERENCE_RETRY_DELAY_SECS", 10)?),
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "INFERENCE_TIMEOUT_SECS",
                120,
            )?),
            port: parse_or(&lookup, "PORT", 8080u16).context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            provider,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'")),
        None => Ok(default),
    }
}
