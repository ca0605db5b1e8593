use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use feed_client::{DEFAULT_BASE_URL, FeedConfig};

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) feed: FeedConfig,
    pub(crate) log_level: String,
}

impl Settings {
    pub(crate) fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = FeedConfig::default();

        let base_url = env("FEED_BASE_URL")
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let request_timeout_ms = parse_positive(
            "FEED_REQUEST_TIMEOUT_MS",
            env("FEED_REQUEST_TIMEOUT_MS"),
            defaults.request_timeout.as_millis() as u64,
        )?;
        let max_retries = parse_u64(
            "FEED_MAX_RETRIES",
            env("FEED_MAX_RETRIES"),
            u64::from(defaults.max_retries),
        )?;
        let max_retries = u32::try_from(max_retries)
            .map_err(|_| anyhow!("FEED_MAX_RETRIES is too large"))?;
        let retry_delay_ms = parse_u64(
            "FEED_RETRY_DELAY_MS",
            env("FEED_RETRY_DELAY_MS"),
            defaults.retry_delay.as_millis() as u64,
        )?;
        let max_concurrent = parse_positive(
            "FEED_MAX_CONCURRENT",
            env("FEED_MAX_CONCURRENT"),
            defaults.max_concurrent as u64,
        )? as usize;
        let cache_ttl_ms = parse_positive(
            "FEED_CACHE_TTL_MS",
            env("FEED_CACHE_TTL_MS"),
            defaults.cache_ttl.as_millis() as u64,
        )?;
        let page_size = parse_positive(
            "FEED_PAGE_SIZE",
            env("FEED_PAGE_SIZE"),
            defaults.page_size as u64,
        )? as usize;
        let log_level = env("LOG_LEVEL")
            .or_else(|| env("RUST_LOG"))
            .unwrap_or_else(|| "warn".to_string());

        Ok(Self {
            feed: FeedConfig {
                base_url,
                request_timeout: Duration::from_millis(request_timeout_ms),
                max_retries,
                retry_delay: Duration::from_millis(retry_delay_ms),
                max_concurrent,
                cache_ttl: Duration::from_millis(cache_ttl_ms),
                page_size,
            },
            log_level,
        })
    }

    /// Применяет значения из флагов командной строки поверх окружения.
    pub(crate) fn with_overrides(
        mut self,
        server: Option<String>,
        page_size: Option<usize>,
        concurrency: Option<usize>,
    ) -> Result<Self> {
        if let Some(server) = server {
            self.feed.base_url = normalize_server(server);
        }
        if let Some(page_size) = page_size {
            if page_size == 0 {
                return Err(anyhow!("--page-size must be > 0"));
            }
            self.feed.page_size = page_size;
        }
        if let Some(concurrency) = concurrency {
            if concurrency == 0 {
                return Err(anyhow!("--concurrency must be > 0"));
            }
            self.feed.max_concurrent = concurrency;
        }
        Ok(self)
    }
}

pub(crate) fn normalize_server(server: String) -> String {
    if server.starts_with("http://") || server.starts_with("https://") {
        return server;
    }

    format!("https://{server}")
}

fn parse_u64(key: &str, raw: Option<String>, default: u64) -> Result<u64> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("Failed to parse {key}, expecting non-negative integer")),
        None => Ok(default),
    }
}

fn parse_positive(key: &str, raw: Option<String>, default: u64) -> Result<u64> {
    let value = match raw {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .with_context(|| format!("Failed to parse {key}, expecting positive integer"))?,
        None => default,
    };

    if value == 0 {
        return Err(anyhow!("{key} must be > 0"));
    }
    Ok(value)
}
