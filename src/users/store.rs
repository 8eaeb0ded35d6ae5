use rocket_db_pools::sqlx::{self, PgPool};
use thiserror::Error;

use crate::users::User;

const UNIQUE_VIOLATION: &str = "23505";
const USER_COLUMNS: &str = "id, name, email, password_hash, preferences, created_at, updated_at";

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("User already exists")]
    AlreadyExists,
    #[error("User not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Fields needed to insert a new account; `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub preferences: Vec<String>,
}

/// Postgres-backed account storage. Emails are matched case-insensitively.
#[derive(Debug, Clone)]
pub struct UserStore {
    pool: PgPool,
}

impl UserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserStoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<User>, UserStoreError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<User, UserStoreError> {
        let email = new_user.email.trim().to_lowercase();

        if self.find_by_email(&email).await?.is_some() {
            return Err(UserStoreError::AlreadyExists);
        }

        let query = format!(
            "INSERT INTO users (name, email, password_hash, preferences) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        let result = sqlx::query_as::<_, User>(&query)
            .bind(&new_user.name)
            .bind(&email)
            .bind(&new_user.password_hash)
            .bind(&new_user.preferences)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(user) => Ok(user),
            // Lost a race with a concurrent signup for the same address.
            Err(err) if is_unique_violation(&err) => Err(UserStoreError::AlreadyExists),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn update_preferences(
        &self,
        id: i32,
        preferences: &[String],
    ) -> Result<User, UserStoreError> {
        let query = format!(
            "UPDATE users SET preferences = $1, updated_at = NOW() WHERE id = $2 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(preferences)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(UserStoreError::NotFound)
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err)
            if db_err.code().map(|code| code == UNIQUE_VIOLATION).unwrap_or(false)
    )
}
