//! Runtime settings, read from the environment (and `.env` via dotenv)

use std::time::Duration;

use thiserror::Error;

use crate::api::ledger::RetryPolicy;
use crate::services::transaction_store::DEFAULT_PAGE_SIZE;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(5000);
pub const DEFAULT_HIGHLIGHT_DURATION: Duration = Duration::from_millis(1000);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a whole number, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
    #[error("{name} must be at least {min}, got {value}")]
    TooSmall {
        name: &'static str,
        min: u64,
        value: u64,
    },
}

/// Timing and paging knobs for the transaction feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedConfig {
    pub page_size: usize,
    pub refresh_interval: Duration,
    pub highlight_duration: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            highlight_duration: DEFAULT_HIGHLIGHT_DURATION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub feed: FeedConfig,
    pub retry: RetryPolicy,
}

impl AppConfig {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, falling back to defaults for unset keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("LEDGER_API_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let page_size = read_number(&lookup, "LEDGER_PAGE_SIZE", DEFAULT_PAGE_SIZE as u64, 1)?;
        let refresh_ms = read_number(
            &lookup,
            "LEDGER_REFRESH_INTERVAL_MS",
            DEFAULT_REFRESH_INTERVAL.as_millis() as u64,
            1,
        )?;
        let highlight_ms = read_number(
            &lookup,
            "LEDGER_HIGHLIGHT_MS",
            DEFAULT_HIGHLIGHT_DURATION.as_millis() as u64,
            0,
        )?;
        let retries = read_number(
            &lookup,
            "LEDGER_HTTP_RETRIES",
            RetryPolicy::DEFAULT_RETRIES as u64,
            0,
        )?;
        let retry_delay_ms = read_number(
            &lookup,
            "LEDGER_HTTP_RETRY_DELAY_MS",
            RetryPolicy::DEFAULT_DELAY.as_millis() as u64,
            0,
        )?;

        Ok(AppConfig {
            api_base_url,
            feed: FeedConfig {
                page_size: usize::try_from(page_size).unwrap_or(usize::MAX),
                refresh_interval: Duration::from_millis(refresh_ms),
                highlight_duration: Duration::from_millis(highlight_ms),
            },
            retry: RetryPolicy {
                retries: u32::try_from(retries).unwrap_or(u32::MAX),
                delay: Duration::from_millis(retry_delay_ms),
            },
        })
    }
}

fn read_number<F>(lookup: &F, name: &'static str, default: u64, min: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber {
                    name,
                    value: raw.clone(),
                })?
        }
        _ => default,
    };

    if value < min {
        return Err(ConfigError::TooSmall { name, min, value });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = AppConfig::from_lookup(|_| None).unwrap();

        assert_eq!(config.api_base_url, DEFAULT_API_URL);
        assert_eq!(config.feed, FeedConfig::default());
        assert_eq!(config.feed.page_size, 10);
        assert_eq!(config.feed.refresh_interval, Duration::from_millis(5000));
        assert_eq!(config.feed.highlight_duration, Duration::from_millis(1000));
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("LEDGER_API_URL", " http://ledger.internal:8080 "),
            ("LEDGER_PAGE_SIZE", "25"),
            ("LEDGER_REFRESH_INTERVAL_MS", "2000"),
            ("LEDGER_HTTP_RETRIES", "0"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "http://ledger.internal:8080");
        assert_eq!(config.feed.page_size, 25);
        assert_eq!(config.feed.refresh_interval, Duration::from_millis(2000));
        assert_eq!(config.retry.retries, 0);
        assert_eq!(config.retry.delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_rejects_garbage_numbers() {
        let err = AppConfig::from_lookup(lookup_from(&[("LEDGER_PAGE_SIZE", "ten")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                name: "LEDGER_PAGE_SIZE",
                value: "ten".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_zero_page_size_and_interval() {
        let err = AppConfig::from_lookup(lookup_from(&[("LEDGER_PAGE_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::TooSmall { name: "LEDGER_PAGE_SIZE", .. }));

        let err = AppConfig::from_lookup(lookup_from(&[("LEDGER_REFRESH_INTERVAL_MS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::TooSmall { .. }));
    }
}
