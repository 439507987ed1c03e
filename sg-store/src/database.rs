use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use crate::app_config::StoreConfig;

/// Connection pool authenticated as the store's service role.
///
/// Everything read through this pool skips row-level security; only the
/// repositories in this crate hold it.
#[derive(Clone)]
pub struct ServiceClient {
    pub pool: Pool<Postgres>,
}

impl ServiceClient {
    pub async fn connect(config: &StoreConfig) -> Result<Self, sqlx::Error> {
        let options = Self::connect_options(config)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect_with(options)
            .await?;

        info!("Connected to store as service role");
        Ok(Self { pool })
    }

    /// The service secret overrides any password embedded in the URL.
    pub fn connect_options(config: &StoreConfig) -> Result<PgConnectOptions, sqlx::Error> {
        Ok(PgConnectOptions::from_str(&config.url)?.password(config.service_secret.expose()))
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}
