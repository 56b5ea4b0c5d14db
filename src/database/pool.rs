use crate::config::get_config;
use crate::error::Result;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// Connection pool sized from config. The service is request-scoped with no
/// background workers, so a small pool with a short acquire timeout suffices;
/// deployments override via DATABASE_MAX_CONNECTIONS and
/// DATABASE_ACQUIRE_TIMEOUT_SECS.
pub async fn create_pool() -> Result<PgPool> {
    let config = get_config();
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(Duration::from_secs(config.database_acquire_timeout_secs))
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}
