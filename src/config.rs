use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::stats::StatsError;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Environment-driven configuration for the Postgres-backed stores.
#[derive(Debug, Clone)]
pub struct StatsConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl StatsConfig {
    /// Reads `DATABASE_URL` (required) and `DATABASE_MAX_CONNECTIONS`
    /// (optional, defaults to 5).
    pub fn from_env() -> Result<Self, StatsError> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| StatsError::Config("DATABASE_URL must be set".to_string()))?;

        let max_connections = match std::env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw.parse().map_err(|_| {
                StatsError::Config(format!("DATABASE_MAX_CONNECTIONS is not a number: {raw}"))
            })?,
            Err(_) => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url,
            max_connections,
        })
    }
}

/// Builds the connection pool shared by the Postgres repositories.
pub async fn connect_pool(config: &StatsConfig) -> Result<PgPool, StatsError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .map_err(|e| StatsError::Storage(e.to_string()))
}
