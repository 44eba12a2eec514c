use super::rows::PendingWriteRow;
use crate::application::ports::offline_store::PendingWriteStore;
use crate::domain::entities::PendingWrite;
use crate::domain::value_objects::{PendingWriteId, WritePayload};
use crate::infrastructure::database::connection::{Database, DbPool, database_path};
use crate::shared::config::DatabaseConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::OnceCell;

const SELECT_PENDING: &str = r#"
    SELECT id, payload, created_at, attempts, last_error, last_attempt_at
    FROM pending_writes
    ORDER BY seq ASC
"#;

/// SQLite-backed pending write queue.
///
/// A store built with [`SqlitePendingWriteStore::lazy`] opens its database on
/// the first write; reads against a database that was never created report an
/// empty queue without creating it.
pub struct SqlitePendingWriteStore {
    database: Option<DatabaseConfig>,
    pool: OnceCell<DbPool>,
}

impl SqlitePendingWriteStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            database: None,
            pool: OnceCell::from(pool),
        }
    }

    pub fn lazy(database: DatabaseConfig) -> Self {
        Self {
            database: Some(database),
            pool: OnceCell::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.pool.initialized()
    }

    pub async fn teardown(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
        }
    }

    async fn pool(&self) -> Result<&DbPool, AppError> {
        self.pool
            .get_or_try_init(|| async {
                let config = self.database.as_ref().ok_or_else(|| {
                    AppError::StorageUnavailable("no database configured".to_string())
                })?;
                Database::connect(config).await
            })
            .await
    }

    /// Pool for read paths; `None` while the database has never been created.
    async fn existing_pool(&self) -> Result<Option<&DbPool>, AppError> {
        if self.pool.initialized() {
            return self.pool().await.map(Some);
        }
        let exists = self
            .database
            .as_ref()
            .and_then(|config| database_path(&config.url))
            .is_some_and(|path| path.exists());
        if exists {
            self.pool().await.map(Some)
        } else {
            Ok(None)
        }
    }
}

#[async_trait]
impl PendingWriteStore for SqlitePendingWriteStore {
    async fn enqueue_with_id(
        &self,
        id: PendingWriteId,
        payload: WritePayload,
    ) -> Result<(), AppError> {
        let pool = self.pool().await?;
        let created_at = Utc::now().timestamp_millis();

        sqlx::query(
            r#"
            INSERT INTO pending_writes (id, payload, created_at, attempts)
            VALUES (?1, ?2, ?3, 0)
            "#,
        )
        .bind(id.as_str())
        .bind(payload.to_json_string())
        .bind(created_at)
        .execute(pool)
        .await?;

        tracing::debug!(target: "offline::store", id = %id, "pending write enqueued");
        Ok(())
    }

    async fn list_pending(&self) -> Result<Vec<PendingWrite>, AppError> {
        let Some(pool) = self.existing_pool().await? else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query_as::<_, PendingWriteRow>(SELECT_PENDING)
            .fetch_all(pool)
            .await?;

        rows.into_iter().map(PendingWriteRow::into_domain).collect()
    }

    async fn mark_synced(&self, id: &PendingWriteId) -> Result<(), AppError> {
        let Some(pool) = self.existing_pool().await? else {
            return Ok(());
        };

        let result = sqlx::query("DELETE FROM pending_writes WHERE id = ?1")
            .bind(id.as_str())
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(target: "offline::store", id = %id, "mark_synced on unknown id");
        }
        Ok(())
    }

    async fn record_failure(&self, id: &PendingWriteId, reason: &str) -> Result<(), AppError> {
        let Some(pool) = self.existing_pool().await? else {
            return Ok(());
        };

        sqlx::query(
            r#"
            UPDATE pending_writes
            SET attempts = attempts + 1, last_error = ?1, last_attempt_at = ?2
            WHERE id = ?3
            "#,
        )
        .bind(reason)
        .bind(Utc::now().timestamp_millis())
        .bind(id.as_str())
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn discard(&self, id: &PendingWriteId) -> Result<bool, AppError> {
        let Some(pool) = self.existing_pool().await? else {
            return Ok(false);
        };

        let result = sqlx::query("DELETE FROM pending_writes WHERE id = ?1")
            .bind(id.as_str())
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<u64, AppError> {
        let Some(pool) = self.existing_pool().await? else {
            return Ok(0);
        };

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pending_writes")
            .fetch_one(pool)
            .await?;

        Ok(count.max(0) as u64)
    }
}
