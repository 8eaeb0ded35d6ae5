//! Preference-filtered news feed for the authenticated user.

use rocket::serde::json::Json;
use rocket::{State, get};
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::news::{Article, NewsService};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct NewsResponse {
    /// Provider articles, passed through unmodified.
    pub news: Vec<Article>,
}

/// Fetch news matching the caller's stored preferences.
#[openapi(tag = "News")]
#[get("/news")]
pub async fn get_news(
    news: &State<NewsService>,
    user: AuthUser,
) -> Result<Json<NewsResponse>, ApiError> {
    let preferences = &user.0.preferences;
    log::info!(
        "fetching news for user {} (preferences: {:?})",
        user.email(),
        preferences
    );

    match news.get_news(preferences).await {
        Ok(articles) => {
            log::info!(
                "news fetched for user {}: {} articles",
                user.email(),
                articles.len()
            );
            Ok(Json(NewsResponse { news: articles }))
        }
        Err(err) => {
            log::error!(
                "error fetching news for user {} (preferences: {:?}): {}",
                user.id(),
                preferences,
                err
            );
            Err(ApiError::InternalError("Failed to fetch news".to_string()))
        }
    }
}
