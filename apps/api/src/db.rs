use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the `creations` table if it does not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    pool.execute(include_str!("../migrations/0001_creations.sql"))
        .await?;
    info!("Schema check complete");
    Ok(())
}
