//! SQLite persistence for daily quotes and generation-attempt logs.
//!
//! The `date` column carries a UNIQUE constraint; a losing concurrent
//! insert surfaces as [`StoreError::DuplicateDate`] so the pipeline can
//! convert the race into an "already existed" success.

use std::path::Path;
use std::sync::Arc;

use rusqlite::{Connection, Row, params};
use serde::Serialize;
use tokio::sync::Mutex;

use super::error::StoreError;

#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub id: i64,
    pub date: String,
    pub content: String,
    pub author: String,
    pub is_generated: bool,
    pub is_fallback: bool,
    pub attempt_count: u32,
    pub created_at: String,
    pub updated_at: String,
}

/// Insert payload; timestamps and id come from the database.
#[derive(Debug)]
pub struct NewQuote<'a> {
    pub date: &'a str,
    pub content: &'a str,
    pub author: &'a str,
    pub is_generated: bool,
    pub is_fallback: bool,
    pub attempt_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptLog {
    pub id: i64,
    pub date: String,
    pub attempt_number: u32,
    pub success: bool,
    pub error_message: Option<String>,
    pub generated_content: Option<String>,
    pub created_at: String,
}

#[derive(Clone)]
pub struct QuoteStore {
    db: Arc<Mutex<Connection>>,
}

impl QuoteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(db: Connection) -> Result<Self, StoreError> {
        db.execute(
            "CREATE TABLE IF NOT EXISTS daily_quotes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL UNIQUE,
                content TEXT NOT NULL,
                author TEXT NOT NULL DEFAULT 'AI智慧',
                is_generated INTEGER NOT NULL DEFAULT 1,
                is_fallback INTEGER NOT NULL DEFAULT 0,
                attempt_count INTEGER NOT NULL DEFAULT 1,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        db.execute(
            "CREATE TABLE IF NOT EXISTS quote_generation_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT NOT NULL,
                attempt_number INTEGER NOT NULL,
                success INTEGER NOT NULL,
                error_message TEXT,
                generated_content TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        db.execute(
            "CREATE INDEX IF NOT EXISTS idx_generation_logs_date ON quote_generation_logs(date)",
            [],
        )?;

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    pub async fn get_by_date(&self, date: &str) -> Result<Option<Quote>, StoreError> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(
            "SELECT id, date, content, author, is_generated, is_fallback, attempt_count,
                    created_at, updated_at
             FROM daily_quotes WHERE date = ?1",
        )?;
        let mut rows = stmt.query_map(params![date], Self::row_to_quote)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Insert a new quote. A second insert for the same date fails with
    /// [`StoreError::DuplicateDate`] instead of overwriting.
    pub async fn insert(&self, quote: &NewQuote<'_>) -> Result<Quote, StoreError> {
        let db = self.db.lock().await;
        let result = db.execute(
            "INSERT INTO daily_quotes (date, content, author, is_generated, is_fallback, attempt_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                quote.date,
                quote.content,
                quote.author,
                quote.is_generated,
                quote.is_fallback,
                quote.attempt_count
            ],
        );
        match result {
            Ok(_) => {
                let id = db.last_insert_rowid();
                let stored = db.query_row(
                    "SELECT id, date, content, author, is_generated, is_fallback, attempt_count,
                            created_at, updated_at
                     FROM daily_quotes WHERE id = ?1",
                    params![id],
                    Self::row_to_quote,
                )?;
                Ok(stored)
            }
            Err(e) if is_unique_violation(&e) => {
                Err(StoreError::DuplicateDate(quote.date.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All quotes whose date differs from `date`, for fallback sourcing.
    pub async fn list_excluding(&self, date: &str) -> Result<Vec<Quote>, StoreError> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(
            "SELECT id, date, content, author, is_generated, is_fallback, attempt_count,
                    created_at, updated_at
             FROM daily_quotes WHERE date != ?1",
        )?;
        let rows = stmt.query_map(params![date], Self::row_to_quote)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// Most recent quotes, descending by date. `limit` is clamped to 1..=50.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<Quote>, StoreError> {
        let limit = limit.clamp(1, 50);
        let db = self.db.lock().await;
        let mut stmt = db.prepare(
            "SELECT id, date, content, author, is_generated, is_fallback, attempt_count,
                    created_at, updated_at
             FROM daily_quotes ORDER BY date DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], Self::row_to_quote)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// Append one attempt-log row. Append-only; never updated or deleted.
    pub async fn append_attempt_log(
        &self,
        date: &str,
        attempt_number: u32,
        success: bool,
        error_message: Option<&str>,
        generated_content: Option<&str>,
    ) -> Result<(), StoreError> {
        let db = self.db.lock().await;
        db.execute(
            "INSERT INTO quote_generation_logs (date, attempt_number, success, error_message, generated_content)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![date, attempt_number, success, error_message, generated_content],
        )?;
        Ok(())
    }

    /// Attempt logs for one target date, oldest first. Diagnostic only.
    pub async fn attempt_logs(&self, date: &str) -> Result<Vec<AttemptLog>, StoreError> {
        let db = self.db.lock().await;
        let mut stmt = db.prepare(
            "SELECT id, date, attempt_number, success, error_message, generated_content, created_at
             FROM quote_generation_logs WHERE date = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![date], |row| {
            Ok(AttemptLog {
                id: row.get(0)?,
                date: row.get(1)?,
                attempt_number: row.get(2)?,
                success: row.get(3)?,
                error_message: row.get(4)?,
                generated_content: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    fn row_to_quote(row: &Row<'_>) -> rusqlite::Result<Quote> {
        Ok(Quote {
            id: row.get(0)?,
            date: row.get(1)?,
            content: row.get(2)?,
            author: row.get(3)?,
            is_generated: row.get(4)?,
            is_fallback: row.get(5)?,
            attempt_count: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample<'a>(date: &'a str, content: &'a str) -> NewQuote<'a> {
        NewQuote {
            date,
            content,
            author: "测试作者",
            is_generated: true,
            is_fallback: false,
            attempt_count: 1,
        }
    }

    #[tokio::test]
    async fn insert_and_get_roundtrip() {
        let store = QuoteStore::open_in_memory().unwrap();
        let stored = store.insert(&sample("2025-07-01", "内容一")).await.unwrap();
        assert_eq!(stored.date, "2025-07-01");
        assert_eq!(stored.content, "内容一");
        assert!(stored.is_generated);
        assert!(!stored.is_fallback);
        assert!(!stored.created_at.is_empty());

        let fetched = store.get_by_date("2025-07-01").await.unwrap().unwrap();
        assert_eq!(fetched.id, stored.id);
        assert_eq!(fetched.author, "测试作者");
    }

    #[tokio::test]
    async fn get_missing_date_returns_none() {
        let store = QuoteStore::open_in_memory().unwrap();
        assert!(store.get_by_date("2025-01-01").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_date_insert_fails_with_tagged_error() {
        let store = QuoteStore::open_in_memory().unwrap();
        store.insert(&sample("2025-07-01", "第一条")).await.unwrap();

        let err = store
            .insert(&sample("2025-07-01", "第二条"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateDate(d) if d == "2025-07-01"));

        // The original row survives untouched.
        let kept = store.get_by_date("2025-07-01").await.unwrap().unwrap();
        assert_eq!(kept.content, "第一条");
    }

    #[tokio::test]
    async fn list_excluding_skips_the_given_date() {
        let store = QuoteStore::open_in_memory().unwrap();
        store.insert(&sample("2025-07-01", "a")).await.unwrap();
        store.insert(&sample("2025-07-02", "b")).await.unwrap();

        let others = store.list_excluding("2025-07-02").await.unwrap();
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].date, "2025-07-01");
    }

    #[tokio::test]
    async fn list_recent_orders_descending_and_clamps() {
        let store = QuoteStore::open_in_memory().unwrap();
        for d in ["2025-07-01", "2025-07-03", "2025-07-02"] {
            store.insert(&sample(d, "x")).await.unwrap();
        }

        let recent = store.list_recent(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].date, "2025-07-03");
        assert_eq!(recent[1].date, "2025-07-02");

        // 0 clamps to 1, oversized clamps to 50.
        assert_eq!(store.list_recent(0).await.unwrap().len(), 1);
        assert_eq!(store.list_recent(500).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn attempt_logs_append_and_read_in_order() {
        let store = QuoteStore::open_in_memory().unwrap();
        store
            .append_attempt_log("2025-07-01", 1, false, Some("timeout"), None)
            .await
            .unwrap();
        store
            .append_attempt_log("2025-07-01", 2, true, None, Some("内容"))
            .await
            .unwrap();
        store
            .append_attempt_log("2025-07-02", 1, true, None, Some("其他"))
            .await
            .unwrap();

        let logs = store.attempt_logs("2025-07-01").await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].attempt_number, 1);
        assert!(!logs[0].success);
        assert_eq!(logs[0].error_message.as_deref(), Some("timeout"));
        assert!(logs[1].success);
        assert_eq!(logs[1].generated_content.as_deref(), Some("内容"));
    }

    #[tokio::test]
    async fn open_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quotes.db");
        let store = QuoteStore::open(&path).unwrap();
        store.insert(&sample("2025-07-01", "持久化")).await.unwrap();
        assert!(path.exists());
    }
}
