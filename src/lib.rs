#[macro_use]
extern crate rocket;

pub mod auth;
pub mod db;
pub mod error;
pub mod news;
pub mod request_logger;
pub mod routes;
pub mod users;

use crate::auth::AuthState;
use crate::db::NewsDb;
use crate::news::{NewsConfig, NewsService};
use crate::request_logger::RequestLogger;
use env_logger::Env;
use rocket::fairing::AdHoc;
use rocket::figment::Figment;
use rocket::http::Method;
use rocket::{Build, Rocket};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_db_pools::Database;
use rocket_okapi::{
    openapi_get_routes,
    rapidoc::{GeneralConfig, HideShowConfig, RapiDocConfig, make_rapidoc},
    settings::UrlObject,
    swagger_ui::{SwaggerUIConfig, make_swagger_ui},
};
use std::sync::Once;

static LOGGER: Once = Once::new();

fn init_logger() {
    LOGGER.call_once(|| {
        let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        env_logger::Builder::from_env(Env::default().default_filter_or(format!(
            "{level},rocket::server=warn,rocket::request=warn"
        )))
        .init();
    });
}

/// Rocket configuration with `PORT` and `DATABASE_URL` shortcuts layered on
/// top of `Rocket.toml` and `ROCKET_*` variables.
fn figment() -> Figment {
    let mut figment = rocket::Config::figment();

    if let Some(port) = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
    {
        figment = figment.merge(("port", port));
    }

    if let Ok(url) = std::env::var("DATABASE_URL") {
        figment = figment.merge(("databases.news_db.url", url));
    }

    figment
}

pub fn rocket() -> Rocket<Build> {
    init_logger();

    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Put]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allow_credentials(true)
        .to_cors()
        .expect("Error creating CORS");

    rocket::custom(figment())
        .attach(RequestLogger)
        .attach(NewsDb::init())
        .attach(cors)
        .attach(AdHoc::try_on_ignite(
            "Run Migrations",
            |rocket| async move {
                match NewsDb::fetch(&rocket) {
                    Some(db) => {
                        let pool = (**db).clone();
                        match db::run_migrations(&pool).await {
                            Ok(_) => Ok(rocket.manage(pool)),
                            Err(e) => {
                                log::error!("database migrations failed: {}", e);
                                Err(rocket)
                            }
                        }
                    }
                    None => {
                        log::error!("database pool not available for migrations");
                        Err(rocket)
                    }
                }
            },
        ))
        .attach(AdHoc::try_on_ignite(
            "Auth Configuration",
            |rocket| async move {
                match AuthState::from_env() {
                    Ok(state) => Ok(rocket.manage(state)),
                    Err(err) => {
                        log::error!("failed to initialize authentication: {}", err);
                        Err(rocket)
                    }
                }
            },
        ))
        .attach(AdHoc::try_on_ignite("News Service", |rocket| async move {
            let config = NewsConfig::from_env();
            match NewsService::from_config(&config) {
                Ok(service) => {
                    log::info!(
                        "news service ready (provider: {}, cache ttl: {}s, max entries: {:?})",
                        config.base_url,
                        config.cache_ttl.num_seconds(),
                        config.cache_max_entries
                    );
                    Ok(rocket.manage(service))
                }
                Err(err) => {
                    log::error!("failed to initialize news client: {}", err);
                    Err(rocket)
                }
            }
        }))
        .attach(AdHoc::on_liftoff("Startup Banner", |rocket| {
            Box::pin(async move {
                let config = rocket.config();
                log::info!(
                    "server is listening on {}:{} (profile: {})",
                    config.address,
                    config.port,
                    rocket.figment().profile()
                );
            })
        }))
        .register("/", error::catchers())
        .mount(
            "/",
            openapi_get_routes![
                routes::health::health_check,
                routes::users::signup,
                routes::users::login,
                routes::users::get_preferences,
                routes::users::update_preferences,
                routes::news::get_news,
            ],
        )
        .mount(
            "/docs/swagger/",
            make_swagger_ui(&SwaggerUIConfig {
                url: "../../openapi.json".to_owned(),
                ..Default::default()
            }),
        )
        .mount(
            "/docs/rapidoc/",
            make_rapidoc(&RapiDocConfig {
                general: GeneralConfig {
                    spec_urls: vec![UrlObject::new("News API", "../../openapi.json")],
                    ..Default::default()
                },
                hide_show: HideShowConfig {
                    allow_spec_url_load: false,
                    allow_spec_file_load: false,
                    ..Default::default()
                },
                ..Default::default()
            }),
        )
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::local::asynchronous::Client as AsyncClient;
    use rocket::local::blocking::Client;
    use rocket::{Build, Rocket, Route};
    use rocket_db_pools::sqlx::PgPool;

    use crate::auth::AuthState;
    use crate::news::NewsService;

    pub use database::{TestDatabase, TestDatabaseError};

    pub mod database {
        use log::LevelFilter;
        use rocket_db_pools::sqlx::postgres::{PgConnectOptions, PgPoolOptions};
        use rocket_db_pools::sqlx::{self, ConnectOptions, PgPool};
        use testcontainers::ImageExt;
        use testcontainers_modules::postgres::Postgres;
        use testcontainers_modules::testcontainers::{
            ContainerAsync, core::error::TestcontainersError, runners::AsyncRunner,
        };
        use thiserror::Error;

        use crate::db::MIGRATOR;

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("migration error: {0}")]
            Migration(#[from] sqlx::migrate::MigrateError),
            #[error("container error: {0}")]
            Container(#[from] TestcontainersError),
        }

        /// Disposable Postgres instance with the schema applied.
        pub struct TestDatabase {
            pool: Option<PgPool>,
            container: Option<ContainerAsync<Postgres>>,
        }

        impl TestDatabase {
            /// Launch a fresh Postgres container and run migrations against it.
            pub async fn new() -> Result<Self, TestDatabaseError> {
                let container = Postgres::default().with_tag("16-alpine").start().await?;

                let host = container.get_host().await?.to_string();
                let port = container.get_host_port_ipv4(5432).await?;
                let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

                let options: PgConnectOptions = url.parse()?;
                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect_with(options.log_statements(LevelFilter::Off))
                    .await?;

                MIGRATOR.run(&pool).await?;

                Ok(Self {
                    pool: Some(pool),
                    container: Some(container),
                })
            }

            pub fn pool(&self) -> &PgPool {
                self.pool.as_ref().expect("test database pool is available")
            }

            pub fn pool_clone(&self) -> PgPool {
                self.pool().clone()
            }

            /// Close pool connections and stop the container.
            pub async fn close(mut self) -> Result<(), TestDatabaseError> {
                if let Some(pool) = self.pool.take() {
                    pool.close().await;
                }
                if let Some(container) = self.container.take() {
                    drop(container);
                }
                Ok(())
            }
        }
    }

    /// Builder for constructing Rocket instances tailored for integration tests.
    #[derive(Default)]
    pub struct TestRocketBuilder {
        figment: Figment,
        routes: Vec<Route>,
        pg_pool: Option<PgPool>,
        auth_state: Option<AuthState>,
        news_service: Option<NewsService>,
    }

    impl TestRocketBuilder {
        /// Start a builder with sensible defaults: random port, logging disabled.
        pub fn new() -> Self {
            let figment = rocket::Config::figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false));

            Self {
                figment,
                ..Self::default()
            }
        }

        /// Mount routes at the root, as the production server does.
        pub fn mount_routes(mut self, routes: Vec<Route>) -> Self {
            self.routes.extend(routes);
            self
        }

        pub fn manage_pg_pool(mut self, pool: PgPool) -> Self {
            self.pg_pool = Some(pool);
            self
        }

        pub fn manage_auth_state(mut self, state: AuthState) -> Self {
            self.auth_state = Some(state);
            self
        }

        pub fn manage_news_service(mut self, service: NewsService) -> Self {
            self.news_service = Some(service);
            self
        }

        /// Finish building the Rocket instance, with the JSON error catchers registered.
        pub fn build(self) -> Rocket<Build> {
            let mut rocket = rocket::custom(self.figment)
                .register("/", crate::error::catchers())
                .mount("/", self.routes);

            if let Some(pool) = self.pg_pool {
                rocket = rocket.manage(pool);
            }
            if let Some(state) = self.auth_state {
                rocket = rocket.manage(state);
            }
            if let Some(service) = self.news_service {
                rocket = rocket.manage(service);
            }

            rocket
        }

        pub fn blocking_client(self) -> Client {
            Client::tracked(self.build()).expect("valid Rocket instance")
        }

        pub async fn async_client(self) -> AsyncClient {
            AsyncClient::tracked(self.build())
                .await
                .expect("valid Rocket instance")
        }
    }
}
