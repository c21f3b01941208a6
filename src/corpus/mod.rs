//! Read-only access to the scraped article corpus.
//!
//! The corpus is populated out-of-band by the scraping job; this module only
//! ever reads it. The schema matches what the ingestion side creates: one row
//! per article, keyed by a unique title.

use std::path::Path;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use crate::core::errors::ApiError;

/// One scraped news article. Immutable once stored.
#[derive(Debug, Clone)]
pub struct Article {
    pub title: String,
    pub content: String,
}

#[derive(Clone)]
pub struct CorpusStore {
    pub(crate) pool: SqlitePool,
}

impl CorpusStore {
    pub async fn connect(db_path: &Path) -> Result<Self, ApiError> {
        if let Some(parent) = db_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn_str = format!("sqlite://{}?mode=rwc", db_path.to_string_lossy());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&conn_str)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to connect to corpus db: {}", e)))?;

        // Same shape the ingestion job creates, so a fresh deployment starts
        // with an empty (but queryable) corpus instead of a hard failure.
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS 电力交易数据 (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL UNIQUE,
                content TEXT,
                created_time TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to init corpus table: {}", e)))?;

        Ok(Self { pool })
    }

    /// Load every article in insertion order. May be empty.
    pub async fn load_all(&self) -> Result<Vec<Article>, ApiError> {
        let rows = sqlx::query("SELECT title, content FROM 电力交易数据 ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to load corpus: {}", e)))?;

        let articles = rows
            .into_iter()
            .map(|row| Article {
                title: row.get::<String, _>("title"),
                content: row.get::<Option<String>, _>("content").unwrap_or_default(),
            })
            .collect();

        Ok(articles)
    }
}
