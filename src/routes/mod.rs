//! HTTP route handlers grouped by resource.
//!
//! Handlers are annotated with `#[openapi]` so `rocket_okapi` can derive an
//! OpenAPI document for the whole surface.

pub mod health;
pub mod news;
pub mod users;
