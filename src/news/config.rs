use std::env;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://gnews.io";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Freshness window for `secs`, or the default when it does not fit a
/// `chrono::Duration`.
fn cache_ttl_from_secs(secs: u64) -> chrono::Duration {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or_else(|| {
            log::warn!(
                "NEWS_CACHE_TTL_SECS={} is out of range; using {}s",
                secs,
                DEFAULT_CACHE_TTL_SECS
            );
            chrono::Duration::seconds(DEFAULT_CACHE_TTL_SECS as i64)
        })
}

/// Configuration for the news provider client and the article cache.
#[derive(Debug, Clone)]
pub struct NewsConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
    pub cache_ttl: chrono::Duration,
    /// Maximum cached preference keys; `None` leaves the cache unbounded.
    pub cache_max_entries: Option<usize>,
}

impl NewsConfig {
    pub fn from_env() -> Self {
        let api_key = env_non_empty("NEWS_API_KEY").or_else(|| env_non_empty("GNEWS_API_KEY"));
        if api_key.is_none() {
            log::warn!("NEWS_API_KEY is not set; provider requests will be unauthenticated");
        }

        let max_entries = env_u64("NEWS_CACHE_MAX_ENTRIES", 1000) as usize;

        Self {
            base_url: env_string("GNEWS_BASE_URL", DEFAULT_BASE_URL),
            api_key,
            request_timeout: Duration::from_millis(env_u64("NEWS_API_TIMEOUT_MS", 10_000)),
            cache_ttl: cache_ttl_from_secs(env_u64("NEWS_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)),
            cache_max_entries: (max_entries > 0).then_some(max_entries),
        }
    }
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(10),
            cache_ttl: chrono::Duration::seconds(DEFAULT_CACHE_TTL_SECS as i64),
            cache_max_entries: Some(1000),
        }
    }
}
