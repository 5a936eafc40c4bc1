use crate::types::Config;
use anyhow::{Context, Result};
use reqwest::Url;
use std::env;
use std::str::FromStr;

pub fn load_config() -> Result<Config> {
    dotenv::dotenv().ok();
    config_from_lookup(|key| env::var(key).ok())
}

pub fn config_from_lookup<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Config::default();

    Ok(Config {
        api_base_url: lookup("DASHBOARD_API_URL").unwrap_or(defaults.api_base_url),
        access_token: lookup("DASHBOARD_ACCESS_TOKEN").filter(|t| !t.trim().is_empty()),
        request_timeout_ms: parse_or(&lookup, "REQUEST_TIMEOUT_MS", defaults.request_timeout_ms)?,

        retry_attempts: parse_or(&lookup, "RETRY_ATTEMPTS", defaults.retry_attempts)?,
        retry_delay_ms: parse_or(&lookup, "RETRY_DELAY_MS", defaults.retry_delay_ms)?,

        wallet_cache_ttl_ms: parse_or(&lookup, "WALLET_CACHE_TTL_MS", defaults.wallet_cache_ttl_ms)?,
    })
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} is not a valid number: {}", key, raw)),
        None => Ok(default),
    }
}

pub fn validate_config(config: &Config) -> Result<()> {
    let url = Url::parse(&config.api_base_url)
        .with_context(|| format!("Invalid DASHBOARD_API_URL: {}", config.api_base_url))?;
    if !matches!(url.scheme(), "http" | "https") {
        anyhow::bail!("DASHBOARD_API_URL must be http or https");
    }

    if config.request_timeout_ms == 0 {
        anyhow::bail!("REQUEST_TIMEOUT_MS must be > 0");
    }

    if config.retry_attempts == 0 {
        anyhow::bail!("RETRY_ATTEMPTS must be >= 1");
    }

    if config.wallet_cache_ttl_ms == 0 {
        anyhow::bail!("WALLET_CACHE_TTL_MS must be > 0");
    }

    tracing::info!("Config validation passed");
    Ok(())
}
