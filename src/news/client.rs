use reqwest::StatusCode;
use serde_json::Value;

use super::config::NewsConfig;
use super::error::NewsFetchError;
use super::Article;

const SEARCH_PATH: &str = "/api/v4/search";
const TOP_HEADLINES_PATH: &str = "/api/v4/top-headlines";
const LANGUAGE: &str = "en";
const COUNTRY: &str = "us";
const MAX_RESULTS: &str = "10";
const HEADLINE_CATEGORY: &str = "general";

/// Source of articles for a list of preference keywords.
#[rocket::async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch_articles(&self, keywords: &[String]) -> Result<Vec<Article>, NewsFetchError>;
}

/// HTTP client for the GNews v4 API.
#[derive(Clone)]
pub struct GNewsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl GNewsClient {
    pub fn new(config: &NewsConfig) -> Result<Self, NewsFetchError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent("news-api/0.1")
            .build()
            .map_err(NewsFetchError::Request)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn request_for(&self, keywords: &[String]) -> reqwest::RequestBuilder {
        let mut params: Vec<(&str, String)> = vec![
            ("lang", LANGUAGE.to_string()),
            ("country", COUNTRY.to_string()),
            ("max", MAX_RESULTS.to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("apikey", key.clone()));
        }

        let path = if keywords.is_empty() {
            log::info!("fetching top headlines");
            params.push(("category", HEADLINE_CATEGORY.to_string()));
            TOP_HEADLINES_PATH
        } else {
            let query = keywords.join(" OR ");
            log::info!("fetching news for keywords: {}", query);
            params.push(("q", query));
            SEARCH_PATH
        };

        self.http
            .get(format!("{}{}", self.base_url, path))
            .query(&params)
    }
}

#[rocket::async_trait]
impl NewsProvider for GNewsClient {
    async fn fetch_articles(&self, keywords: &[String]) -> Result<Vec<Article>, NewsFetchError> {
        let response = self
            .request_for(keywords)
            .send()
            .await
            .map_err(NewsFetchError::from_transport)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(NewsFetchError::from_transport)?;
        // Non-JSON bodies carry no structured error or articles.
        let payload: Value = serde_json::from_str(&body).unwrap_or(Value::Null);

        if !status.is_success() {
            return Err(http_error(status, &payload));
        }

        articles_from_payload(payload)
    }
}

fn http_error(status: StatusCode, payload: &Value) -> NewsFetchError {
    let message = indicator_field(payload, "message")
        .or_else(|| indicator_field(payload, "error"))
        .or_else(|| first_error(payload).and_then(first_error_message))
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    NewsFetchError::ProviderHttp { status, message }
}

fn articles_from_payload(payload: Value) -> Result<Vec<Article>, NewsFetchError> {
    if let Some(first) = first_error(&payload) {
        let message = first_error_message(first).unwrap_or_else(|| "API error".to_string());
        return Err(NewsFetchError::ProviderPayload(message));
    }

    if let Some(message) = indicator_field(&payload, "message") {
        return Err(NewsFetchError::ProviderPayload(message));
    }

    match payload {
        Value::Object(mut map) => match map.remove("articles") {
            Some(Value::Array(articles)) => Ok(articles),
            _ => Ok(Vec::new()),
        },
        _ => Ok(Vec::new()),
    }
}

/// Text of `field` when it is present and truthy: `null`, `false`, `0` and
/// `""` do not count. Non-string values are rendered as JSON.
fn indicator_field(payload: &Value, field: &str) -> Option<String> {
    match payload.get(field)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(text) if text.is_empty() => None,
        Value::Number(number) if number.as_f64() == Some(0.0) => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn first_error(payload: &Value) -> Option<&Value> {
    payload
        .get("errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
}

fn first_error_message(error: &Value) -> Option<String> {
    match error {
        Value::String(message) => Some(message.clone()),
        other => indicator_field(other, "message"),
    }
}
