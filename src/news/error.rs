use reqwest::StatusCode;
use thiserror::Error;

/// Uniform failure raised while fetching articles from the news provider.
///
/// Provider variants display the extracted message verbatim so callers never
/// see raw provider payloads.
#[derive(Debug, Error)]
pub enum NewsFetchError {
    #[error("{message}")]
    ProviderHttp { status: StatusCode, message: String },
    #[error("{0}")]
    ProviderPayload(String),
    #[error("No response from API")]
    ProviderUnreachable,
    #[error("news request error: {0}")]
    Request(reqwest::Error),
}

impl NewsFetchError {
    /// Classify a transport error: anything that means no response arrived
    /// becomes [`NewsFetchError::ProviderUnreachable`].
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() || err.is_body() {
            NewsFetchError::ProviderUnreachable
        } else {
            NewsFetchError::Request(err)
        }
    }
}
