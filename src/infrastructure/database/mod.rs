use crate::shared::error::AppError;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::Path;
use tracing::info;

pub type DbPool = Pool<Sqlite>;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

pub struct Database;

impl Database {
    pub async fn initialize(database_url: &str, max_connections: u32) -> Result<DbPool, AppError> {
        // Make sure the data directory exists for file-backed databases.
        let file_path = database_url
            .trim_start_matches("sqlite://")
            .trim_start_matches("sqlite:");
        let file_path = file_path.split('?').next().unwrap_or(file_path);
        if !file_path.is_empty() && !file_path.starts_with(':') {
            if let Some(parent) = Path::new(file_path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("Database connected: {}", database_url);

        MIGRATOR.run(&pool).await?;

        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn initialize_creates_file_and_schema() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test_init.db");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

        let pool = Database::initialize(&db_url, 1).await.expect("initialize");
        assert!(db_path.exists());

        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('key_value', 'offline_queue')",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 2);

        pool.close().await;
    }
}
