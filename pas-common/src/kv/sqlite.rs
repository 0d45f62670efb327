//! SQLite-backed key-value store
//!
//! One table, one row per key. Each operation is a single statement, so
//! single-key reads and writes are atomic. The pool is bounded and every
//! call carries a per-operation timeout.

use super::{KeyValueStore, KvError, KvResult};
use crate::config::StoreConfig;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// SQLite result codes that mean "try again later"
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

/// Production store handle, created once at startup and shared by reference
#[derive(Debug, Clone)]
pub struct SqliteKvStore {
    pool: SqlitePool,
    operation_timeout: Duration,
}

impl SqliteKvStore {
    /// Open (creating if needed) the store file and prepare the schema
    pub async fn connect(config: &StoreConfig) -> KvResult<Self> {
        if let Some(parent) = config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    KvError::Backend(format!(
                        "Cannot create store directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.database_path)
            .create_if_missing(true)
            .busy_timeout(config.operation_timeout());

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout())
            .connect_with(options)
            .await
            .map_err(classify)?;

        let store = Self {
            pool,
            operation_timeout: config.operation_timeout(),
        };

        // WAL lets readers proceed while a writer holds the lock
        store
            .timed("configure", sqlx::query("PRAGMA journal_mode = WAL").execute(&store.pool))
            .await?;
        store
            .timed(
                "create_table",
                sqlx::query(
                    "CREATE TABLE IF NOT EXISTS kv_store (
                        key TEXT PRIMARY KEY NOT NULL,
                        value TEXT NOT NULL
                    )",
                )
                .execute(&store.pool),
            )
            .await?;

        info!(
            database_path = %config.database_path.display(),
            max_connections = config.max_connections,
            "Key-value store initialized"
        );

        Ok(store)
    }

    async fn timed<T, F>(&self, operation: &'static str, fut: F) -> KvResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.operation_timeout, fut).await {
            Ok(result) => result.map_err(|e| {
                let err = classify(e);
                warn!(operation, error = %err, "Store operation failed");
                err
            }),
            Err(_) => {
                warn!(operation, timeout_ms = self.operation_timeout.as_millis() as u64, "Store operation timed out");
                Err(KvError::Unavailable(format!(
                    "{} timed out after {:?}",
                    operation, self.operation_timeout
                )))
            }
        }
    }
}

/// Translate a driver error into the store taxonomy
fn classify(err: sqlx::Error) -> KvError {
    match &err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => KvError::Unavailable(err.to_string()),
        sqlx::Error::Database(db) => {
            let primary = db
                .code()
                .and_then(|code| code.parse::<i32>().ok())
                .map(|code| code & 0xff);
            match primary {
                Some(SQLITE_BUSY) | Some(SQLITE_LOCKED) => KvError::Unavailable(err.to_string()),
                _ => KvError::Backend(err.to_string()),
            }
        }
        _ => KvError::Backend(err.to_string()),
    }
}

#[async_trait]
impl KeyValueStore for SqliteKvStore {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let row: Option<(String,)> = self
            .timed(
                "get",
                sqlx::query_as("SELECT value FROM kv_store WHERE key = ?")
                    .bind(key)
                    .fetch_optional(&self.pool),
            )
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> KvResult<bool> {
        let result = self
            .timed(
                "set",
                sqlx::query(
                    "INSERT INTO kv_store (key, value) VALUES (?, ?)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                )
                .bind(key)
                .bind(value)
                .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> KvResult<bool> {
        let result = self
            .timed(
                "set_if_absent",
                sqlx::query(
                    "INSERT INTO kv_store (key, value) VALUES (?, ?)
                     ON CONFLICT(key) DO NOTHING",
                )
                .bind(key)
                .bind(value)
                .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists(&self, key: &str) -> KvResult<bool> {
        let (found,): (i64,) = self
            .timed(
                "exists",
                sqlx::query_as("SELECT EXISTS(SELECT 1 FROM kv_store WHERE key = ?)")
                    .bind(key)
                    .fetch_one(&self.pool),
            )
            .await?;
        Ok(found != 0)
    }

    async fn delete(&self, key: &str) -> KvResult<bool> {
        let result = self
            .timed(
                "delete",
                sqlx::query("DELETE FROM kv_store WHERE key = ?")
                    .bind(key)
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> KvResult<()> {
        self.timed("ping", sqlx::query("SELECT 1").execute(&self.pool))
            .await?;
        debug!("Store ping succeeded");
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Key-value store closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::ConnectOptions;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> StoreConfig {
        StoreConfig {
            database_path: dir.path().join("store").join("kv.db"),
            max_connections: 4,
            ..StoreConfig::default()
        }
    }

    async fn open_store(dir: &TempDir) -> SqliteKvStore {
        SqliteKvStore::connect(&test_config(dir))
            .await
            .expect("Should open store")
    }

    #[tokio::test]
    async fn test_crud_cycle() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        assert_eq!(store.get("phone:+1").await.unwrap(), None);
        assert!(!store.exists("phone:+1").await.unwrap());

        assert!(store.set("phone:+1", "first").await.unwrap());
        assert!(store.set("phone:+1", "second").await.unwrap());
        assert_eq!(
            store.get("phone:+1").await.unwrap().as_deref(),
            Some("second")
        );
        assert!(store.exists("phone:+1").await.unwrap());

        assert!(store.delete("phone:+1").await.unwrap());
        assert!(!store.delete("phone:+1").await.unwrap());
        assert_eq!(store.get("phone:+1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = open_store(&dir).await;
            store.set("k", "улица Пушкина 🏠").await.unwrap();
            store.close().await;
        }

        let store = open_store(&dir).await;
        assert_eq!(
            store.get("k").await.unwrap().as_deref(),
            Some("улица Пушкина 🏠")
        );
    }

    #[tokio::test]
    async fn test_ping_and_closed_pool_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        assert!(store.ping().await.is_ok());

        store.close().await;
        let err = store.ping().await.unwrap_err();
        assert!(err.is_unavailable(), "closed pool should be unavailable: {:?}", err);
    }

    #[tokio::test]
    async fn test_set_if_absent_keeps_existing_value() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).await;

        assert!(store.set_if_absent("phone:+1", "first").await.unwrap());
        assert!(!store.set_if_absent("phone:+1", "second").await.unwrap());
        assert_eq!(
            store.get("phone:+1").await.unwrap().as_deref(),
            Some("first")
        );
    }

    #[tokio::test]
    async fn test_write_blocked_past_timeout_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig {
            operation_timeout_secs: 1,
            ..test_config(&dir)
        };
        let store = SqliteKvStore::connect(&config).await.unwrap();

        // Second connection holds the write lock for the whole test
        let mut locker = SqliteConnectOptions::new()
            .filename(&config.database_path)
            .connect()
            .await
            .unwrap();
        sqlx::query("BEGIN EXCLUSIVE")
            .execute(&mut locker)
            .await
            .unwrap();

        let started = std::time::Instant::now();
        let err = store.set("phone:+1", "blocked").await.unwrap_err();
        assert!(err.is_unavailable(), "locked store should be unavailable: {:?}", err);
        assert!(started.elapsed() < Duration::from_secs(5));

        sqlx::query("ROLLBACK").execute(&mut locker).await.unwrap();
        assert!(store.set("phone:+1", "after").await.unwrap());
    }
}
