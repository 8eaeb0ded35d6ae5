use crate::auth::{AuthError, AuthResult};

const DEV_JWT_SECRET: &str = "your-secret-key-change-in-production";

/// Authentication configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub issuer: String,
    pub audience: String,
    pub access_token_ttl_secs: i64,
    pub jwt_secret: String,
}

impl AuthConfig {
    pub fn from_env() -> AuthResult<Self> {
        let issuer = std::env::var("JWT_ISSUER").unwrap_or_else(|_| "news-api".into());
        let audience = std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "news-api".into());
        let access_token_ttl_secs = match std::env::var("JWT_EXPIRES_IN") {
            Ok(value) => parse_ttl_secs(&value).ok_or_else(|| {
                AuthError::Config(format!("JWT_EXPIRES_IN has an invalid value: '{value}'"))
            })?,
            Err(_) => 24 * 60 * 60,
        };
        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                log::warn!("JWT_SECRET is not set; falling back to the development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        Ok(Self {
            issuer,
            audience,
            access_token_ttl_secs,
            jwt_secret,
        })
    }
}

/// Parse a token lifetime such as `90`, `45s`, `30m`, `24h` or `7d` into seconds.
pub fn parse_ttl_secs(value: &str) -> Option<i64> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);
    let amount: i64 = digits.parse().ok()?;
    let multiplier = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return None,
    };
    amount.checked_mul(multiplier).filter(|secs| *secs > 0)
}
