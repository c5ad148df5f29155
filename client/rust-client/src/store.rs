//! Durable per-device activity log, keyed by date.

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

use crate::activity::ActivityEntry;
use crate::error::StoreError;

/// Current schema version, kept in `PRAGMA user_version`.
pub const SCHEMA_VERSION: u32 = 1;

#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Inserts or replaces the entry for `entry.date`.
    async fn put(&self, entry: &ActivityEntry) -> Result<(), StoreError>;

    async fn get(&self, date: NaiveDate) -> Result<Option<ActivityEntry>, StoreError>;

    /// All entries, oldest first.
    async fn get_all(&self) -> Result<Vec<ActivityEntry>, StoreError>;

    async fn get_unsynced(&self) -> Result<Vec<ActivityEntry>, StoreError>;

    /// Flags the given dates as uploaded in one step. Unknown dates are
    /// skipped. Returns how many entries changed.
    async fn mark_synced(&self, dates: &[NaiveDate]) -> Result<usize, StoreError>;
}

#[derive(Default)]
pub struct MemoryActivityStore {
    entries: RwLock<BTreeMap<NaiveDate, ActivityEntry>>,
}

impl MemoryActivityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivityStore for MemoryActivityStore {
    async fn put(&self, entry: &ActivityEntry) -> Result<(), StoreError> {
        self.entries.write().await.insert(entry.date, entry.clone());
        Ok(())
    }

    async fn get(&self, date: NaiveDate) -> Result<Option<ActivityEntry>, StoreError> {
        Ok(self.entries.read().await.get(&date).cloned())
    }

    async fn get_all(&self) -> Result<Vec<ActivityEntry>, StoreError> {
        Ok(self.entries.read().await.values().cloned().collect())
    }

    async fn get_unsynced(&self) -> Result<Vec<ActivityEntry>, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .values()
            .filter(|entry| !entry.synced)
            .cloned()
            .collect())
    }

    async fn mark_synced(&self, dates: &[NaiveDate]) -> Result<usize, StoreError> {
        let mut entries = self.entries.write().await;
        let mut changed = 0;
        for date in dates {
            if let Some(entry) = entries.get_mut(date) {
                if !entry.synced {
                    entry.synced = true;
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }
}

/// SQLite-backed store. Calls run on the blocking pool.
#[derive(Clone)]
pub struct SqliteActivityStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteActivityStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    /// Open an in-memory database (for testing).
    pub fn open_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA synchronous = NORMAL;",
        )?;
        migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut *guard)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn migrate(conn: &Connection) -> Result<(), StoreError> {
    let version: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if version < 1 {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS daily_activity (
                 date       TEXT PRIMARY KEY NOT NULL,
                 solved     INTEGER NOT NULL,
                 score      INTEGER NOT NULL,
                 time_taken INTEGER,
                 difficulty INTEGER,
                 synced     INTEGER NOT NULL DEFAULT 0
             );
             CREATE INDEX IF NOT EXISTS idx_daily_activity_synced
                 ON daily_activity(synced);",
        )?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }
    Ok(())
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<ActivityEntry> {
    Ok(ActivityEntry {
        date: row.get("date")?,
        solved: row.get("solved")?,
        score: row.get("score")?,
        time_taken: row.get("time_taken")?,
        difficulty: row.get("difficulty")?,
        synced: row.get("synced")?,
    })
}

const SELECT_COLUMNS: &str =
    "SELECT date, solved, score, time_taken, difficulty, synced FROM daily_activity";

#[async_trait]
impl ActivityStore for SqliteActivityStore {
    async fn put(&self, entry: &ActivityEntry) -> Result<(), StoreError> {
        let entry = entry.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO daily_activity
                     (date, solved, score, time_taken, difficulty, synced)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    entry.date,
                    entry.solved,
                    entry.score,
                    entry.time_taken,
                    entry.difficulty,
                    entry.synced
                ],
            )?;
            Ok(())
        })
        .await
    }

    async fn get(&self, date: NaiveDate) -> Result<Option<ActivityEntry>, StoreError> {
        self.with_conn(move |conn| {
            Ok(conn
                .query_row(
                    &format!("{SELECT_COLUMNS} WHERE date = ?1"),
                    [date],
                    row_to_entry,
                )
                .optional()?)
        })
        .await
    }

    async fn get_all(&self) -> Result<Vec<ActivityEntry>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY date"))?;
            let rows = stmt.query_map([], row_to_entry)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn get_unsynced(&self) -> Result<Vec<ActivityEntry>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("{SELECT_COLUMNS} WHERE synced = 0 ORDER BY date"))?;
            let rows = stmt.query_map([], row_to_entry)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn mark_synced(&self, dates: &[NaiveDate]) -> Result<usize, StoreError> {
        let dates = dates.to_vec();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            let mut changed = 0;
            {
                let mut stmt = tx.prepare(
                    "UPDATE daily_activity SET synced = 1 WHERE date = ?1 AND synced = 0",
                )?;
                for date in &dates {
                    changed += stmt.execute([date])?;
                }
            }
            tx.commit()?;
            Ok(changed)
        })
        .await
    }
}
