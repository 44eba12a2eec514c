use crate::application::ports::response_cache::ResponseCache;
use crate::domain::entities::CachedResponse;
use crate::infrastructure::database::DbPool;
use crate::shared::error::AppError;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::DateTime;
use reqwest::Url;
use sqlx::FromRow;

const UPSERT_ENTRY: &str = r#"
    INSERT INTO cached_responses (
        partition, cache_key, url, status, content_type, headers, body, cached_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT(partition, cache_key) DO UPDATE SET
        url = excluded.url,
        status = excluded.status,
        content_type = excluded.content_type,
        headers = excluded.headers,
        body = excluded.body,
        cached_at = excluded.cached_at
"#;

#[derive(Debug, FromRow)]
struct CachedResponseRow {
    url: String,
    status: i64,
    content_type: Option<String>,
    headers: String,
    body: Vec<u8>,
    cached_at: i64,
}

impl CachedResponseRow {
    fn into_domain(self) -> Result<CachedResponse, AppError> {
        let url = Url::parse(&self.url)
            .map_err(|e| AppError::Internal(format!("Invalid cached URL {}: {e}", self.url)))?;
        let headers: Vec<(String, String)> = serde_json::from_str(&self.headers)?;
        let cached_at = DateTime::from_timestamp_millis(self.cached_at)
            .ok_or_else(|| AppError::Internal(format!("Invalid timestamp: {}", self.cached_at)))?;
        let status = u16::try_from(self.status)
            .map_err(|_| AppError::Internal(format!("Invalid cached status: {}", self.status)))?;

        Ok(CachedResponse {
            url,
            status,
            content_type: self.content_type,
            headers,
            body: Bytes::from(self.body),
            cached_at,
        })
    }
}

/// Response cache persisted next to the pending write queue.
pub struct SqliteResponseCache {
    pool: DbPool,
}

impl SqliteResponseCache {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResponseCache for SqliteResponseCache {
    async fn get(&self, partition: &str, key: &str) -> Result<Option<CachedResponse>, AppError> {
        let row = sqlx::query_as::<_, CachedResponseRow>(
            r#"
            SELECT url, status, content_type, headers, body, cached_at
            FROM cached_responses
            WHERE partition = ?1 AND cache_key = ?2
            "#,
        )
        .bind(partition)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(CachedResponseRow::into_domain).transpose()
    }

    async fn put(
        &self,
        partition: &str,
        key: &str,
        response: CachedResponse,
    ) -> Result<(), AppError> {
        let headers = serde_json::to_string(&response.headers)?;

        sqlx::query(UPSERT_ENTRY)
            .bind(partition)
            .bind(key)
            .bind(response.url.as_str())
            .bind(i64::from(response.status))
            .bind(response.content_type.as_deref())
            .bind(headers)
            .bind(response.body.to_vec())
            .bind(response.cached_at.timestamp_millis())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn put_all(
        &self,
        partition: &str,
        entries: Vec<(String, CachedResponse)>,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        for (key, response) in entries {
            let headers = serde_json::to_string(&response.headers)?;
            sqlx::query(UPSERT_ENTRY)
                .bind(partition)
                .bind(key)
                .bind(response.url.as_str())
                .bind(i64::from(response.status))
                .bind(response.content_type.as_deref())
                .bind(headers)
                .bind(response.body.to_vec())
                .bind(response.cached_at.timestamp_millis())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_partition(&self, partition: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM cached_responses WHERE partition = ?1")
            .bind(partition)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn partitions(&self) -> Result<Vec<String>, AppError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT partition FROM cached_responses ORDER BY partition ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn len(&self, partition: &str) -> Result<u64, AppError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM cached_responses WHERE partition = ?1")
                .bind(partition)
                .fetch_one(&self.pool)
                .await?;

        Ok(count.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::Database;
    use chrono::Utc;

    async fn setup_cache() -> SqliteResponseCache {
        SqliteResponseCache::new(Database::connect_in_memory().await.unwrap())
    }

    fn entry(path: &str, body: &'static [u8]) -> CachedResponse {
        CachedResponse {
            url: Url::parse("https://app.example.com")
                .unwrap()
                .join(path)
                .unwrap(),
            status: 200,
            content_type: Some("text/html".into()),
            headers: vec![("content-type".into(), "text/html".into())],
            body: Bytes::from_static(body),
            cached_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_put_get_preserves_bytes() {
        let cache = setup_cache().await;
        let original = entry("/", b"<html>shell</html>");

        cache.put("static-v1", "GET /", original.clone()).await.unwrap();

        let hit = cache.get("static-v1", "GET /").await.unwrap().unwrap();
        assert_eq!(hit.body, original.body);
        assert_eq!(hit.url, original.url);
        assert_eq!(hit.headers, original.headers);
        assert_eq!(hit.content_type.as_deref(), Some("text/html"));
    }

    #[tokio::test]
    async fn test_put_replaces_entry() {
        let cache = setup_cache().await;
        cache.put("api-v1", "GET /api/products", entry("/api/products", b"[1]")).await.unwrap();
        cache.put("api-v1", "GET /api/products", entry("/api/products", b"[2]")).await.unwrap();

        let hit = cache.get("api-v1", "GET /api/products").await.unwrap().unwrap();
        assert_eq!(&hit.body[..], b"[2]");
        assert_eq!(cache.len("api-v1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_put_all_and_delete_partition() {
        let cache = setup_cache().await;
        cache
            .put_all(
                "static-v1",
                vec![
                    ("GET /".into(), entry("/", b"a")),
                    ("GET /app.js".into(), entry("/app.js", b"b")),
                ],
            )
            .await
            .unwrap();
        cache.put("api-v1", "GET /api/x", entry("/api/x", b"c")).await.unwrap();

        assert_eq!(cache.len("static-v1").await.unwrap(), 2);
        assert_eq!(cache.partitions().await.unwrap(), vec!["api-v1", "static-v1"]);

        assert!(cache.delete_partition("static-v1").await.unwrap());
        assert!(cache.get("static-v1", "GET /").await.unwrap().is_none());
        assert_eq!(cache.partitions().await.unwrap(), vec!["api-v1"]);
    }
}
