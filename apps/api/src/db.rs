use std::path::Path;

use anyhow::{Context, Result};
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Migrations under `apps/api/migrations`, embedded at compile time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Applies pending SQL migrations. `override_dir` loads them from disk instead of
/// the embedded set.
pub async fn run_migrations(pool: &PgPool, override_dir: Option<&str>) -> Result<()> {
    match override_dir {
        Some(dir) => {
            let migrator = Migrator::new(Path::new(dir))
                .await
                .with_context(|| format!("Failed to load migrations from '{dir}'"))?;
            migrator.run(pool).await.context("Failed to apply migrations")?;
            info!("Migrations applied from {dir}");
        }
        None => {
            MIGRATOR.run(pool).await.context("Failed to apply migrations")?;
            info!("Embedded migrations applied ({} known)", MIGRATOR.iter().count());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_embedded_in_order() {
        let versions: Vec<i64> = MIGRATOR.iter().map(|m| m.version).collect();
        assert_eq!(versions, vec![20240101000000, 20240201000000]);
    }
}
