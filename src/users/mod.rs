//! User accounts: persistence, public representations, and request validation.

pub mod models;
pub mod store;
pub mod validation;

pub use models::{PublicUser, User};
pub use store::{NewUser, UserStore, UserStoreError};
