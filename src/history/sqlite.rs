//! SQLite-backed citation history.
//!
//! Owns its connection pool: WAL mode and a busy timeout for file-backed
//! databases, automatic migration on open, and a bounded recent-items
//! window enforced on every append.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::instrument;

use super::{DEFAULT_HISTORY_CAP, HistoryEntry, HistoryError, HistoryStore};

/// Maximum connections in the pool. Kept low for SQLite since it uses
/// file-level locking.
const MAX_CONNECTIONS: u32 = 5;

/// SQLite busy timeout in milliseconds. Connections wait this long before
/// returning SQLITE_BUSY.
const BUSY_TIMEOUT_MS: u32 = 5000;

/// Persistent history store backed by SQLite.
///
/// # Example
///
/// ```no_run
/// use citegen_core::SqliteHistoryStore;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = SqliteHistoryStore::open(Path::new("history.db"), 50).await?;
/// // Inject into the application as a HistoryStore...
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SqliteHistoryStore {
    pool: SqlitePool,
    cap: usize,
}

impl SqliteHistoryStore {
    /// Opens (creating if needed) a file-backed store keeping at most
    /// `cap` entries.
    ///
    /// Enables WAL mode and a busy timeout, then runs pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Database`] if the connection fails, or
    /// [`HistoryError::Migration`] if migrations fail.
    #[instrument(skip(db_path), fields(path = %db_path.display()))]
    pub async fn open(db_path: &Path, cap: usize) -> Result<Self, HistoryError> {
        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect(&db_url)
            .await?;

        // WAL mode for concurrent reads
        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&pool)
            .await?;

        // Avoid immediate lock errors under contention
        sqlx::query(&format!("PRAGMA busy_timeout={BUSY_TIMEOUT_MS}"))
            .execute(&pool)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self {
            pool,
            cap: cap.max(1),
        })
    }

    /// Creates an in-memory store for testing. WAL mode is skipped since
    /// it provides no benefit without a file.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Database`] if the connection fails, or
    /// [`HistoryError::Migration`] if migrations fail.
    #[instrument]
    pub async fn in_memory(cap: usize) -> Result<Self, HistoryError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self {
            pool,
            cap: cap.max(1),
        })
    }

    /// Creates an in-memory store with the default cap.
    ///
    /// # Errors
    ///
    /// Same as [`SqliteHistoryStore::in_memory`].
    pub async fn in_memory_default() -> Result<Self, HistoryError> {
        Self::in_memory(DEFAULT_HISTORY_CAP).await
    }

    /// Gracefully closes all pool connections.
    pub async fn close(self) {
        self.pool.close().await;
    }

    async fn prune(&self) -> Result<(), HistoryError> {
        // Keep only the newest `cap` rows by insertion order.
        #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
        let cap = self.cap as i64;
        sqlx::query(
            "DELETE FROM citation_history
             WHERE id NOT IN (
                 SELECT id FROM citation_history ORDER BY id DESC LIMIT ?1
             )",
        )
        .bind(cap)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    #[instrument(skip(self, entries), fields(count = entries.len()))]
    async fn append(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        let mut tx = self.pool.begin().await?;
        for entry in entries {
            sqlx::query(
                "INSERT INTO citation_history (text, title, created_at) VALUES (?1, ?2, ?3)",
            )
            .bind(&entry.text)
            .bind(&entry.title)
            .bind(entry.timestamp.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        self.prune().await
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let rows = sqlx::query(
            "SELECT text, title, created_at FROM citation_history ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let text: String = row.get("text");
            let title: String = row.get("title");
            let created_at: String = row.get("created_at");
            let timestamp = DateTime::parse_from_rfc3339(&created_at)
                .map_err(|_| HistoryError::InvalidTimestamp { value: created_at })?
                .with_timezone(&Utc);
            entries.push(HistoryEntry {
                text,
                title,
                timestamp,
            });
        }
        Ok(entries)
    }

    #[instrument(skip(self))]
    async fn remove(&self, index: usize) -> Result<(), HistoryError> {
        // Translate the newest-first index into a row id.
        let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM citation_history ORDER BY id DESC")
            .fetch_all(&self.pool)
            .await?;

        let Some(id) = ids.get(index) else {
            return Err(HistoryError::IndexOutOfRange {
                index,
                len: ids.len(),
            });
        };

        sqlx::query("DELETE FROM citation_history WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
