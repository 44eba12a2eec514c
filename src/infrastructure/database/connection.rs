use crate::shared::config::DatabaseConfig;
use crate::shared::error::AppError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

pub type DbPool = Pool<Sqlite>;

pub struct Database;

impl Database {
    /// Opens the pool and brings the schema up to date. Every failure is
    /// reported as [`AppError::StorageUnavailable`].
    pub async fn connect(config: &DatabaseConfig) -> Result<DbPool, AppError> {
        if let Some(path) = database_path(&config.url) {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        info!(target: "offline::store", url = %config.url, "database connected");

        Self::run_migrations(&pool).await?;

        Ok(pool)
    }

    /// Private in-memory database, mostly for tests and ephemeral embeddings.
    pub async fn connect_in_memory() -> Result<DbPool, AppError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::run_migrations(&pool).await?;
        Ok(pool)
    }

    async fn run_migrations(pool: &DbPool) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!(target: "offline::store", "database migrations completed");
        Ok(())
    }
}

/// Filesystem location behind a `sqlite:` URL, if it has one.
pub fn database_path(url: &str) -> Option<PathBuf> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };
    if path.is_empty()
        || path == ":memory:"
        || query.is_some_and(|q| q.split('&').any(|kv| kv == "mode=memory"))
    {
        return None;
    }
    Some(PathBuf::from(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn database_path_handles_url_shapes() {
        assert_eq!(
            database_path("sqlite://data/app.db?mode=rwc"),
            Some(PathBuf::from("data/app.db"))
        );
        assert_eq!(
            database_path("sqlite:/tmp/app.db"),
            Some(PathBuf::from("/tmp/app.db"))
        );
        assert_eq!(database_path("sqlite::memory:"), None);
        assert_eq!(database_path("sqlite://file.db?mode=memory"), None);
        assert_eq!(database_path("postgres://x"), None);
    }

    #[tokio::test]
    async fn test_database_connect_creates_file_and_schema() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("offline.db");
        let config = DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", db_path.display()),
            max_connections: 2,
        };

        let pool = Database::connect(&config).await.unwrap();
        assert!(db_path.exists());

        let table: Option<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name='pending_writes'",
        )
        .fetch_optional(&pool)
        .await
        .unwrap();
        assert!(table.is_some());

        pool.close().await;
    }

    #[tokio::test]
    async fn test_unreachable_location_is_storage_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", blocker.join("offline.db").display()),
            max_connections: 1,
        };

        let err = Database::connect(&config).await.unwrap_err();
        assert!(matches!(err, AppError::StorageUnavailable(_)));
    }
}
