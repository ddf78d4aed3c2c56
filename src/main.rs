use std::net::TcpListener;
use std::sync::Arc;

use authcore::auth::{AccountService, TokenService};
use authcore::configuration::get_configuration;
use authcore::repository::{PgAccountRepository, RedisRevocationStore};
use authcore::startup::run;
use authcore::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;

fn fatal(message: &str, error: impl std::fmt::Display) -> std::io::Error {
    tracing::error!(error = %error, "{}", message);
    std::io::Error::new(std::io::ErrorKind::Other, message.to_string())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry("info");

    tracing::info!("Starting application");

    let configuration =
        get_configuration().map_err(|e| fatal("Failed to read configuration", e))?;
    configuration
        .tokens
        .validate()
        .map_err(|e| fatal("Invalid token configuration", e))?;
    tracing::info!("Configuration loaded successfully");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| fatal("Failed to create connection pool", e))?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| fatal("Failed to migrate the database", e))?;
    tracing::info!("Database ready");

    let store = RedisRevocationStore::connect(&configuration.redis.url)
        .await
        .map_err(|e| fatal("Failed to connect to Redis", e))?;

    // Missing or unreadable signing keys are the one unrecoverable case
    let token_service = TokenService::from_settings(&configuration.tokens, Arc::new(store))
        .map_err(|e| fatal("Failed to load signing keys", e))?;
    let account_service = AccountService::new(Arc::new(PgAccountRepository::new(pool)));

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    run(listener, account_service, token_service)?.await
}
