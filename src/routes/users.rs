//! Account signup, login, and stored news preferences.

use rocket::serde::json::Json;
use rocket::{State, get, post, put};
use rocket_db_pools::sqlx;
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

use crate::auth::{AuthState, AuthUser};
use crate::error::ApiError;
use crate::users::validation::{LoginRequest, PreferencesRequest, SignupRequest};
use crate::users::{NewUser, PublicUser, UserStore, UserStoreError};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SignupResponse {
    pub message: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LoginResponse {
    pub message: String,
    /// Bearer token for the `Authorization` header.
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PreferencesResponse {
    pub preferences: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PreferencesUpdateResponse {
    pub message: String,
    pub preferences: Vec<String>,
}

/// Register a new account.
#[openapi(tag = "Users")]
#[post("/users/signup", data = "<payload>")]
pub async fn signup(
    state: &State<AuthState>,
    pool: &State<sqlx::PgPool>,
    payload: Json<SignupRequest>,
) -> Result<Json<SignupResponse>, ApiError> {
    let input = payload.into_inner().validate()?;
    let password_hash = state
        .password_service
        .hash_password(&input.password)
        .map_err(|err| {
            log::error!("password hashing failed for {}: {}", input.email, err);
            ApiError::InternalError("Internal server error".to_string())
        })?;

    let store = UserStore::new(pool.inner().clone());
    let created = store
        .create_user(NewUser {
            name: input.name,
            email: input.email.clone(),
            password_hash,
            preferences: input.preferences,
        })
        .await;

    match created {
        Ok(user) => {
            log::info!("user created successfully: {}", user.email);
            Ok(Json(SignupResponse {
                message: "User created successfully".to_string(),
                user: user.into(),
            }))
        }
        Err(UserStoreError::AlreadyExists) => {
            log::warn!("signup attempt with existing email: {}", input.email);
            Err(UserStoreError::AlreadyExists.into())
        }
        Err(err) => {
            log::error!("error creating user {}: {}", input.email, err);
            Err(err.into())
        }
    }
}

/// Exchange credentials for a bearer token.
#[openapi(tag = "Users")]
#[post("/users/login", data = "<payload>")]
pub async fn login(
    state: &State<AuthState>,
    pool: &State<sqlx::PgPool>,
    payload: Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let input = payload.into_inner().validate()?;
    let store = UserStore::new(pool.inner().clone());

    let user = match store.find_by_email(&input.email).await? {
        Some(user) => user,
        None => {
            log::warn!("login attempt with unknown email: {}", input.email);
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
    };

    let verified = state
        .password_service
        .verify_password(&input.password, &user.password_hash)?;
    if !verified {
        log::warn!("login attempt with invalid password for email: {}", input.email);
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = state.jwt_service.issue_access_token(user.id, &user.email)?;
    log::info!("user logged in successfully: {}", user.email);

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token: token.token,
    }))
}

/// Return the caller's stored preferences.
#[openapi(tag = "Users")]
#[get("/users/preferences")]
pub async fn get_preferences(user: AuthUser) -> Json<PreferencesResponse> {
    Json(PreferencesResponse {
        preferences: user.0.preferences,
    })
}

/// Replace the caller's preferences.
#[openapi(tag = "Users")]
#[put("/users/preferences", data = "<payload>")]
pub async fn update_preferences(
    pool: &State<sqlx::PgPool>,
    user: AuthUser,
    payload: Json<PreferencesRequest>,
) -> Result<Json<PreferencesUpdateResponse>, ApiError> {
    let preferences = payload.into_inner().validate()?;
    let store = UserStore::new(pool.inner().clone());

    let updated = store
        .update_preferences(user.id(), &preferences)
        .await
        .map_err(|err| {
            match &err {
                UserStoreError::NotFound => {
                    log::warn!("preferences update failed: user {} not found", user.id())
                }
                _ => log::error!("error updating preferences for user {}: {}", user.id(), err),
            }
            ApiError::from(err)
        })?;

    log::info!(
        "preferences updated for user {}: {:?}",
        updated.email,
        updated.preferences
    );

    Ok(Json(PreferencesUpdateResponse {
        message: "Preferences updated successfully".to_string(),
        preferences: updated.preferences,
    }))
}
