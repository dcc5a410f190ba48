use crate::db;
use crate::models::article::{ArticleRecord, NewArticle, StatCounts};
use async_trait::async_trait;
use news_spam_cli::detector::SpamLevel;
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Append-only article log plus per-level counters.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn append_record(&self, article: &NewArticle) -> Result<ArticleRecord, StoreError>;

    /// Oldest first.
    async fn read_all_records(&self) -> Result<Vec<ArticleRecord>, StoreError>;

    /// Bumps one counter and returns all counters as seen right after the bump.
    async fn increment_stat(&self, level: SpamLevel) -> Result<StatCounts, StoreError>;

    /// Appends the record and bumps its level counter as one unit: either both land or neither does.
    async fn append_and_count(
        &self,
        article: &NewArticle,
    ) -> Result<(ArticleRecord, StatCounts), StoreError>;

    async fn read_stats(&self) -> Result<StatCounts, StoreError>;
}

#[derive(sqlx::FromRow)]
struct ArticleRow {
    id: i64,
    title: String,
    source: String,
    url: String,
    category: String,
    spam_score: i64,
    spam_level: String,
    credibility: i64,
    timestamp: String,
}

impl TryFrom<ArticleRow> for ArticleRecord {
    type Error = StoreError;

    fn try_from(row: ArticleRow) -> Result<Self, Self::Error> {
        let percent = |name: &str, value: i64| {
            u8::try_from(value)
                .ok()
                .filter(|v| *v <= 100)
                .ok_or_else(|| StoreError::Corrupt(format!("{} out of range: {}", name, value)))
        };

        Ok(ArticleRecord {
            id: row.id,
            spam_score: percent("spam_score", row.spam_score)?,
            spam_level: row.spam_level.parse().map_err(StoreError::Corrupt)?,
            credibility: percent("credibility", row.credibility)?,
            title: row.title,
            source: row.source,
            url: row.url,
            category: row.category,
            timestamp: row.timestamp,
        })
    }
}

fn counts_from_rows(rows: Vec<(String, i64)>) -> StatCounts {
    let mut counts = StatCounts::default();
    for (level, count) in rows {
        match level.parse::<SpamLevel>() {
            Ok(level) => counts.set(level, count.max(0) as u64),
            Err(e) => warn!(error = %e, "Ignoring unknown stats row"),
        }
    }
    counts
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        Ok(Self::new(db::init_db(database_url).await?))
    }
}

async fn insert_article(
    conn: &mut SqliteConnection,
    article: &NewArticle,
) -> Result<ArticleRecord, StoreError> {
    let timestamp = article.timestamp.to_rfc3339();
    sqlx::query(
        "INSERT INTO articles (id, title, source, url, category, spam_score, spam_level, credibility, timestamp)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(article.id())
    .bind(&article.title)
    .bind(&article.source)
    .bind(&article.url)
    .bind(&article.category)
    .bind(article.spam_score as i64)
    .bind(article.spam_level.as_str())
    .bind(article.credibility as i64)
    .bind(&timestamp)
    .execute(&mut *conn)
    .await?;

    Ok(ArticleRecord {
        id: article.id(),
        title: article.title.clone(),
        source: article.source.clone(),
        url: article.url.clone(),
        category: article.category.clone(),
        spam_score: article.spam_score,
        spam_level: article.spam_level,
        credibility: article.credibility,
        timestamp,
    })
}

async fn bump_stat(conn: &mut SqliteConnection, level: SpamLevel) -> Result<StatCounts, StoreError> {
    let updated = sqlx::query("UPDATE spam_stats SET count = count + 1 WHERE level = ?")
        .bind(level.as_str())
        .execute(&mut *conn)
        .await?;
    if updated.rows_affected() != 1 {
        return Err(StoreError::Corrupt(format!("no stats row for {}", level)));
    }
    let rows = sqlx::query_as::<_, (String, i64)>("SELECT level, count FROM spam_stats")
        .fetch_all(&mut *conn)
        .await?;
    Ok(counts_from_rows(rows))
}

#[async_trait]
impl ArticleStore for SqliteStore {
    async fn append_record(&self, article: &NewArticle) -> Result<ArticleRecord, StoreError> {
        let mut conn = self.pool.acquire().await?;
        insert_article(&mut conn, article).await
    }

    async fn read_all_records(&self) -> Result<Vec<ArticleRecord>, StoreError> {
        let rows = sqlx::query_as::<_, ArticleRow>(
            "SELECT id, title, source, url, category, spam_score, spam_level, credibility, timestamp
             FROM articles ORDER BY seq",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ArticleRecord::try_from).collect()
    }

    async fn increment_stat(&self, level: SpamLevel) -> Result<StatCounts, StoreError> {
        let mut tx = self.pool.begin().await?;
        let counts = bump_stat(&mut tx, level).await?;
        tx.commit().await?;
        Ok(counts)
    }

    async fn append_and_count(
        &self,
        article: &NewArticle,
    ) -> Result<(ArticleRecord, StatCounts), StoreError> {
        let mut tx = self.pool.begin().await?;
        let record = insert_article(&mut tx, article).await?;
        let counts = bump_stat(&mut tx, article.spam_level).await?;
        tx.commit().await?;
        Ok((record, counts))
    }

    async fn read_stats(&self) -> Result<StatCounts, StoreError> {
        let rows = sqlx::query_as::<_, (String, i64)>("SELECT level, count FROM spam_stats")
            .fetch_all(&self.pool)
            .await?;
        Ok(counts_from_rows(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    async fn memory_store() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:").await.unwrap()
    }

    fn article(title: &str, level: SpamLevel, score: u8) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            source: "Manual Entry".to_string(),
            url: "https://example.com".to_string(),
            category: "General".to_string(),
            spam_score: score,
            spam_level: level,
            credibility: 60,
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn records_come_back_in_insertion_order() {
        let store = memory_store().await;
        store
            .append_record(&article("First", SpamLevel::Legitimate, 0))
            .await
            .unwrap();
        let second = store
            .append_record(&article("Second", SpamLevel::Spam, 80))
            .await
            .unwrap();

        let records = store.read_all_records().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "First");
        assert_eq!(records[1], second);
        assert_eq!(records[1].id, 1_714_564_800_000);
        assert_eq!(records[1].timestamp, "2024-05-01T12:00:00+00:00");
    }

    #[tokio::test]
    async fn stats_start_at_zero_and_increment() {
        let store = memory_store().await;
        assert_eq!(store.read_stats().await.unwrap(), StatCounts::default());

        store.increment_stat(SpamLevel::Spam).await.unwrap();
        let counts = store.increment_stat(SpamLevel::LikelySpam).await.unwrap();
        assert_eq!(counts.spam, 1);
        assert_eq!(counts.likely_spam, 1);
        assert_eq!(counts.legitimate, 0);
        assert_eq!(store.read_stats().await.unwrap(), counts);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_not_lost() {
        let store = Arc::new(memory_store().await);
        let mut handles = Vec::new();
        for i in 0..40 {
            let store = store.clone();
            let level = SpamLevel::ALL[i % 4];
            handles.push(tokio::spawn(async move { store.increment_stat(level).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let counts = store.read_stats().await.unwrap();
        assert_eq!(counts.total(), 40);
        assert_eq!(counts.legitimate, 10);
        assert_eq!(counts.spam, 10);
    }

    #[tokio::test]
    async fn append_and_count_commits_both_together() {
        let store = memory_store().await;
        let (record, counts) = store
            .append_and_count(&article("Flagged", SpamLevel::LikelySpam, 45))
            .await
            .unwrap();

        assert_eq!(counts.likely_spam, 1);
        assert_eq!(counts.total(), 1);
        assert_eq!(store.read_all_records().await.unwrap(), vec![record]);
        assert_eq!(store.read_stats().await.unwrap(), counts);
    }

    #[tokio::test]
    async fn failed_counter_update_rolls_back_the_article() {
        let store = memory_store().await;
        sqlx::query("DROP TABLE spam_stats")
            .execute(&store.pool)
            .await
            .unwrap();

        let err = store
            .append_and_count(&article("Lost", SpamLevel::Spam, 90))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Sqlx(_)));
        assert!(store.read_all_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_stats_row_rolls_back_the_article() {
        let store = memory_store().await;
        sqlx::query("DELETE FROM spam_stats WHERE level = 'spam'")
            .execute(&store.pool)
            .await
            .unwrap();

        let err = store
            .append_and_count(&article("Lost", SpamLevel::Spam, 90))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
        assert!(store.read_all_records().await.unwrap().is_empty());
        assert_eq!(store.read_stats().await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn corrupt_level_is_reported() {
        let store = memory_store().await;
        sqlx::query(
            "INSERT INTO articles (id, title, source, url, category, spam_score, spam_level, credibility, timestamp)
             VALUES (1, 't', 's', 'u', 'c', 10, 'bogus', 40, 'now')",
        )
        .execute(&store.pool)
        .await
        .unwrap();

        let err = store.read_all_records().await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
