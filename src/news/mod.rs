//! Preference-filtered news feed: provider client, in-memory cache, and the
//! service façade that ties them together with stale fallback.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod service;

pub use cache::{CacheEntry, NewsCache, PreferenceKey};
pub use client::{GNewsClient, NewsProvider};
pub use config::NewsConfig;
pub use error::NewsFetchError;
pub use service::NewsService;

/// Provider article, passed through to callers without any schema applied.
pub type Article = serde_json::Value;
