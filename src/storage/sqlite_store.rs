/// SQLite storage backend
///
/// Plain key/value tier without native expiry. The tiered store pairs every
/// value in this tier with a companion `<key>_exp` record.
use crate::error::IdResult;
use crate::storage::StorageBackend;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool};
use sqlx::Row;
use std::path::Path;
use std::time::Duration;

/// SQLite-backed plain key/value store
#[derive(Clone)]
pub struct SqliteStore {
    db: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the store at `path`
    pub async fn connect(path: &Path) -> IdResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let pool = SqlitePool::connect_with(
            SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
                .busy_timeout(Duration::from_secs(5)),
        )
        .await?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool and ensure the schema exists
    pub async fn from_pool(db: SqlitePool) -> IdResult<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS identity_kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&db)
        .await?;

        Ok(Self { db })
    }
}

#[async_trait]
impl StorageBackend for SqliteStore {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn supports(&self) -> bool {
        !self.db.is_closed()
    }

    fn tracks_expiry(&self) -> bool {
        false
    }

    async fn get(&self, key: &str) -> IdResult<Option<String>> {
        let result = sqlx::query("SELECT value FROM identity_kv WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.db)
            .await?;

        match result {
            Some(row) => Ok(Some(row.try_get("value")?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, _expires_at_ms: i64) -> IdResult<()> {
        sqlx::query(
            r#"
            INSERT INTO identity_kv (key, value)
            VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> IdResult<()> {
        sqlx::query("DELETE FROM identity_kv WHERE key = ?1")
            .bind(key)
            .execute(&self.db)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_store() -> SqliteStore {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        SqliteStore::from_pool(pool).await.unwrap()
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = create_test_store().await;
        store.set("corelink_id", "u-123", 0).await.unwrap();
        assert_eq!(
            store.get("corelink_id").await.unwrap(),
            Some("u-123".to_string())
        );
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let store = create_test_store().await;
        assert_eq!(store.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites_existing_value() {
        let store = create_test_store().await;
        store.set("k", "first", 0).await.unwrap();
        store.set("k", "second", 0).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("second".to_string()));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = create_test_store().await;
        store.set("k", "v", 0).await.unwrap();
        store.delete("k").await.unwrap();
        store.delete("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_connect_creates_file_and_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("identity.sqlite");
        let store = SqliteStore::connect(&path).await.unwrap();
        store.set("k", "v", 0).await.unwrap();
        assert!(path.exists());
    }
}
