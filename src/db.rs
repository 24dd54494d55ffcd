use crate::config::Config;
use anyhow::{Context, Result};
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use std::time::Duration;

pub async fn init_db(config: &Config) -> Result<MySqlPool> {
    let options = config.database.connect_options()?;

    let pool = MySqlPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(10))
        // recycle connections every 5 minutes
        .max_lifetime(Duration::from_secs(300))
        .test_before_acquire(true)
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    if config.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to apply database migrations")?;
        tracing::info!("Database migrations applied");
    }

    Ok(pool)
}

/// Liveness probe used by `/health`.
pub async fn ping(pool: &MySqlPool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}
