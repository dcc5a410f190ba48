use crate::store::StoreError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS articles (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id INTEGER NOT NULL,
        title TEXT NOT NULL,
        source TEXT NOT NULL,
        url TEXT NOT NULL,
        category TEXT NOT NULL,
        spam_score INTEGER NOT NULL,
        spam_level TEXT NOT NULL,
        credibility INTEGER NOT NULL,
        timestamp TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS spam_stats (
        level TEXT PRIMARY KEY,
        count INTEGER NOT NULL DEFAULT 0
    )",
    "INSERT OR IGNORE INTO spam_stats (level, count) VALUES
        ('legitimate', 0), ('suspicious', 0), ('likely_spam', 0), ('spam', 0)",
];

pub async fn init_db(database_url: &str) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let in_memory = database_url.contains(":memory:");

    if !in_memory {
        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    // Every in-memory connection is its own database, so keep exactly one alive.
    let pool = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?
    };

    for statement in SCHEMA {
        sqlx::query(statement).execute(&pool).await?;
    }
    info!(database_url, "Database ready");

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_creation_is_idempotent() {
        let pool = init_db("sqlite::memory:").await.unwrap();
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await.unwrap();
        }
        let (levels,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM spam_stats")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(levels, 4);
    }

    #[tokio::test]
    async fn file_database_creates_its_directory() {
        let dir = std::env::temp_dir().join(format!("spam_db_{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("articles.db");
        let url = format!("sqlite://{}", path.display());

        let pool = init_db(&url).await.unwrap();
        assert!(path.exists());

        pool.close().await;
        std::fs::remove_dir_all(dir).ok();
    }
}
