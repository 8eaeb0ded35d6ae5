use std::sync::Arc;

use super::cache::{NewsCache, PreferenceKey};
use super::client::{GNewsClient, NewsProvider};
use super::config::NewsConfig;
use super::error::NewsFetchError;
use super::Article;

/// Serves preference-filtered articles from the cache, refreshing from the
/// provider when stale and falling back to stale data when the provider fails.
#[derive(Clone)]
pub struct NewsService {
    cache: Arc<NewsCache>,
    provider: Arc<dyn NewsProvider>,
}

impl NewsService {
    pub fn new(cache: Arc<NewsCache>, provider: Arc<dyn NewsProvider>) -> Self {
        Self { cache, provider }
    }

    /// Build the service with a [`GNewsClient`] and a cache sized from `config`.
    pub fn from_config(config: &NewsConfig) -> Result<Self, NewsFetchError> {
        let client = GNewsClient::new(config)?;
        let cache = NewsCache::new(config.cache_ttl, config.cache_max_entries);
        Ok(Self::new(Arc::new(cache), Arc::new(client)))
    }

    pub fn cache(&self) -> &NewsCache {
        &self.cache
    }

    pub async fn get_news(&self, preferences: &[String]) -> Result<Vec<Article>, NewsFetchError> {
        let mut keywords = preferences.to_vec();
        keywords.sort();
        let key = PreferenceKey::from_sorted(&keywords);
        let cached = self.cache.get(&key);

        if let Some(entry) = &cached {
            if self.cache.is_fresh(entry) {
                log::debug!("news cache hit for '{}'", key);
                return Ok(entry.articles.clone());
            }
        }

        match self.provider.fetch_articles(&keywords).await {
            Ok(articles) => {
                self.cache.put(key, articles.clone());
                Ok(articles)
            }
            Err(err) => {
                log::error!("error fetching news from API for '{}': {}", key, err);
                match cached {
                    Some(entry) => {
                        log::warn!("returning cached news data due to API error");
                        Ok(entry.articles)
                    }
                    None => Err(err),
                }
            }
        }
    }
}
