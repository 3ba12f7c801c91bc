//! Citation history as an injected, caller-owned store.
//!
//! The pipeline never reaches into global storage: callers hand the batch
//! result's history entries to whichever [`HistoryStore`] they own. Two
//! implementations ship here: [`MemoryHistoryStore`] for tests and
//! ephemeral runs, and [`SqliteHistoryStore`] for persistence across runs.
//! Both enforce a bounded recent-items window on append.

mod sqlite;

pub use sqlite::SqliteHistoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Mutex;

/// Default recent-items cap for history stores.
pub const DEFAULT_HISTORY_CAP: usize = 50;

/// One saved citation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// The formatted citation text.
    pub text: String,
    /// Display title for the entry (policy-dependent: metadata title or URL).
    pub title: String,
    /// When the entry was created.
    pub timestamp: DateTime<Utc>,
}

/// Errors from history store operations.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Underlying database operation failed.
    #[error("history database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed while opening a store.
    #[error("history migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Removal index outside the current list.
    #[error("history index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// Current number of entries.
        len: usize,
    },

    /// A stored timestamp could not be parsed back.
    #[error("invalid timestamp in history row: {value}")]
    InvalidTimestamp {
        /// The unparseable stored value.
        value: String,
    },
}

/// Caller-owned persistence for generated citations.
///
/// Lifecycle contract: the store is initialized once at application start,
/// persisted on every mutation, and has no implicit teardown. `list`
/// returns newest first; `remove` indexes into that newest-first order.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Appends entries, then prunes anything beyond the recent-items cap.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Database`] when the underlying store fails.
    async fn append(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError>;

    /// Lists stored entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Database`] when the underlying store fails.
    async fn list(&self) -> Result<Vec<HistoryEntry>, HistoryError>;

    /// Removes the entry at `index` in the newest-first list.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::IndexOutOfRange`] when `index` does not name
    /// a stored entry.
    async fn remove(&self, index: usize) -> Result<(), HistoryError>;
}

/// In-memory history store with a bounded recent-items window.
#[derive(Debug)]
pub struct MemoryHistoryStore {
    entries: Mutex<Vec<HistoryEntry>>,
    cap: usize,
}

impl MemoryHistoryStore {
    /// Creates a store with the default cap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_cap(DEFAULT_HISTORY_CAP)
    }

    /// Creates a store keeping at most `cap` entries (minimum 1).
    #[must_use]
    pub fn with_cap(cap: usize) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            cap: cap.max(1),
        }
    }
}

impl Default for MemoryHistoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(&self, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
        let mut guard = self.entries.lock().await;
        guard.extend_from_slice(entries);
        // Oldest entries fall out of the window first.
        let len = guard.len();
        if len > self.cap {
            guard.drain(0..len - self.cap);
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let guard = self.entries.lock().await;
        Ok(guard.iter().rev().cloned().collect())
    }

    async fn remove(&self, index: usize) -> Result<(), HistoryError> {
        let mut guard = self.entries.lock().await;
        let len = guard.len();
        if index >= len {
            return Err(HistoryError::IndexOutOfRange { index, len });
        }
        // `index` addresses the newest-first view.
        guard.remove(len - 1 - index);
        Ok(())
    }
}
