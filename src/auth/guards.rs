use rocket::Request;
use rocket::State;
use rocket::request::{FromRequest, Outcome};
use rocket_db_pools::sqlx;
use rocket_okapi::request::OpenApiFromRequest;

use crate::auth::{AuthError, AuthResult, AuthState};
use crate::users::{User, UserStore, UserStoreError};

/// Authenticated account resolved from a bearer token.
#[derive(Debug, Clone, OpenApiFromRequest)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn id(&self) -> i32 {
        self.0.id
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }
}

/// Message of the most recent guard failure, read back by the 401 catcher.
#[derive(Debug, Default)]
pub struct AuthFailure(pub Option<String>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = AuthError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match extract_user(request).await {
            Ok(user) => Outcome::Success(user),
            Err(err) => {
                let status = err.status();
                match &err {
                    AuthError::MissingToken | AuthError::TokenInvalid | AuthError::UserNotFound => {
                        log::warn!("authentication failed: {}", err);
                    }
                    _ => log::error!("authentication error: {}", err),
                }
                request.local_cache(|| AuthFailure(Some(err.to_string())));
                Outcome::Error((status, err))
            }
        }
    }
}

async fn extract_user(request: &Request<'_>) -> AuthResult<AuthUser> {
    let token = bearer_token_from_request(request)?;

    let auth_state = request
        .guard::<&State<AuthState>>()
        .await
        .succeeded()
        .ok_or_else(|| AuthError::Config("AuthState missing from state".into()))?;

    let pool = request
        .guard::<&State<sqlx::PgPool>>()
        .await
        .succeeded()
        .ok_or_else(|| AuthError::Config("database pool missing from state".into()))?;

    let claims = auth_state
        .jwt_service
        .decode_access_token(token)
        .map_err(|err| {
            log::debug!("rejecting access token: {}", err);
            AuthError::TokenInvalid
        })?;
    let user_id = claims.user_id()?;

    let store = UserStore::new(pool.inner().clone());
    let user = store
        .find_by_id(user_id)
        .await
        .map_err(|err| match err {
            UserStoreError::Database(db_err) => AuthError::Sqlx(db_err),
            UserStoreError::AlreadyExists | UserStoreError::NotFound => AuthError::UserNotFound,
        })?
        .ok_or(AuthError::UserNotFound)?;

    Ok(AuthUser(user))
}

fn bearer_token_from_request<'a>(request: &'a Request<'_>) -> AuthResult<&'a str> {
    let header = request
        .headers()
        .get_one("Authorization")
        .ok_or(AuthError::MissingToken)?;
    let mut parts = header.splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default().trim();
    if scheme.eq_ignore_ascii_case("Bearer") && !token.is_empty() {
        Ok(token)
    } else {
        Err(AuthError::MissingToken)
    }
}
