use rocket::http::Status;
use rocket::response::{self, Responder, status};
use rocket::serde::json::Json;
use rocket::{Catcher, Request};
use rocket_okapi::OpenApiError;
use rocket_okapi::okapi::openapi3::Responses;
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::response::OpenApiResponderInner;
use rocket_okapi::util::add_schema_response;
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::auth::guards::AuthFailure;
use crate::users::UserStoreError;
use crate::users::validation::ValidationError;

#[derive(Debug)]
pub enum ApiError {
    DatabaseError(sqlx::Error),
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    InternalError(String),
}

/// JSON body for every error response.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let (status, message) = match self {
            ApiError::DatabaseError(e) => {
                log::error!("database error: {}", e);
                (Status::InternalServerError, "Internal server error".to_string())
            }
            ApiError::BadRequest(msg) => {
                log::debug!("bad request: {}", msg);
                (Status::BadRequest, msg)
            }
            ApiError::Unauthorized(msg) => {
                log::debug!("unauthorized: {}", msg);
                (Status::Unauthorized, msg)
            }
            ApiError::NotFound(msg) => {
                log::debug!("not found: {}", msg);
                (Status::NotFound, msg)
            }
            ApiError::InternalError(msg) => (Status::InternalServerError, msg),
        };

        status::Custom(status, Json(ErrorResponse::new(message))).respond_to(request)
    }
}

impl OpenApiResponderInner for ApiError {
    fn responses(generator: &mut OpenApiGenerator) -> Result<Responses, OpenApiError> {
        let mut responses = Responses::default();
        let schema = generator.json_schema::<ErrorResponse>();
        for status in [400, 401, 404, 500] {
            add_schema_response(&mut responses, status, "application/json", schema.clone())?;
        }
        Ok(responses)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::DatabaseError(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<UserStoreError> for ApiError {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::AlreadyExists => ApiError::BadRequest(err.to_string()),
            UserStoreError::NotFound => ApiError::NotFound(err.to_string()),
            UserStoreError::Database(e) => ApiError::DatabaseError(e),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        if err.status() == Status::Unauthorized {
            ApiError::Unauthorized(err.to_string())
        } else {
            log::error!("auth error: {}", err);
            ApiError::InternalError("Internal server error".to_string())
        }
    }
}

type CaughtError = status::Custom<Json<ErrorResponse>>;

fn caught(status: Status, message: impl Into<String>) -> CaughtError {
    status::Custom(status, Json(ErrorResponse::new(message)))
}

#[catch(400)]
fn bad_request(request: &Request<'_>) -> CaughtError {
    log::warn!(
        "invalid JSON in request body - {} {}",
        request.method(),
        request.uri().path()
    );
    caught(Status::BadRequest, "Invalid JSON in request body")
}

#[catch(401)]
fn unauthorized(request: &Request<'_>) -> CaughtError {
    let failure = request.local_cache(AuthFailure::default);
    let message = failure.0.as_deref().unwrap_or("Unauthorized");
    caught(Status::Unauthorized, message)
}

#[catch(404)]
fn not_found() -> CaughtError {
    caught(Status::NotFound, "Not found")
}

#[catch(422)]
fn unprocessable(request: &Request<'_>) -> CaughtError {
    log::warn!(
        "request body has unexpected field types - {} {}",
        request.method(),
        request.uri().path()
    );
    caught(Status::BadRequest, "Request body has fields of the wrong type")
}

#[catch(500)]
fn internal_error(request: &Request<'_>) -> CaughtError {
    log::error!(
        "unhandled error - {} {}",
        request.method(),
        request.uri().path()
    );
    caught(Status::InternalServerError, "Something went wrong!")
}

#[catch(default)]
fn fallback(status: Status, _request: &Request<'_>) -> CaughtError {
    caught(status, status.reason().unwrap_or("Something went wrong!"))
}

/// Catchers rendering framework-level failures in the API's JSON error shape.
pub fn catchers() -> Vec<Catcher> {
    catchers![
        bad_request,
        unauthorized,
        not_found,
        unprocessable,
        internal_error,
        fallback
    ]
}
