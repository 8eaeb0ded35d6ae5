use std::io::{self, Write};

use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use news_api::auth::passwords::PasswordService;
use news_api::db;
use news_api::users::validation::SignupRequest;
use news_api::users::{NewUser, UserStore, UserStoreError};

#[derive(Parser, Debug)]
#[command(name = "create_user", about = "Create a news API user account")]
struct Args {
    /// Display name for the account.
    #[arg(long)]
    name: String,

    /// Email address for the account (case insensitive).
    #[arg(long)]
    email: String,

    /// Plaintext password to hash and store for this user.
    #[arg(long)]
    password: String,

    /// Comma-separated news topics, e.g. `technology,science`.
    #[arg(long, value_delimiter = ',')]
    preferences: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    let preferences: Vec<serde_json::Value> = args
        .preferences
        .iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(|tag| serde_json::Value::String(tag.to_string()))
        .collect();

    let input = match (SignupRequest {
        name: Some(serde_json::Value::String(args.name)),
        email: Some(serde_json::Value::String(args.email)),
        password: Some(serde_json::Value::String(args.password)),
        preferences: Some(serde_json::Value::Array(preferences)),
    })
    .validate()
    {
        Ok(input) => input,
        Err(err) => {
            writeln!(io::stderr(), "error: {err}")?;
            std::process::exit(1);
        }
    };

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;
    db::run_migrations(&pool).await?;

    let password_service = PasswordService::new().map_err(|err| {
        io::Error::new(io::ErrorKind::Other, format!("argon2 init failed: {err}"))
    })?;
    let password_hash = password_service
        .hash_password(&input.password)
        .map_err(|err| {
            io::Error::new(io::ErrorKind::Other, format!("password hash failed: {err}"))
        })?;

    let store = UserStore::new(pool);
    let user = match store
        .create_user(NewUser {
            name: input.name,
            email: input.email,
            password_hash,
            preferences: input.preferences,
        })
        .await
    {
        Ok(user) => user,
        Err(UserStoreError::AlreadyExists) => {
            writeln!(io::stderr(), "error: a user with that email already exists.")?;
            std::process::exit(1);
        }
        Err(err) => return Err(err.into()),
    };

    println!(
        "Created user '{}' with id {} (preferences: {:?})",
        user.email, user.id, user.preferences
    );
    Ok(())
}
