use chrono::{DateTime, Utc};
use news_spam_cli::detector::SpamLevel;
use serde::{Deserialize, Serialize};

/// Everything needed to persist one analyzed article.
#[derive(Clone, Debug)]
pub struct NewArticle {
    pub title: String,
    pub source: String,
    pub url: String,
    pub category: String,
    pub spam_score: u8,
    pub spam_level: SpamLevel,
    pub credibility: u8,
    pub timestamp: DateTime<Utc>,
}

impl NewArticle {
    /// Record IDs are the creation time in milliseconds.
    pub fn id(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Source")]
    pub source: String,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Spam_Score")]
    pub spam_score: u8,
    #[serde(rename = "Spam_Level")]
    pub spam_level: SpamLevel,
    #[serde(rename = "Credibility")]
    pub credibility: u8,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
}

impl ArticleRecord {
    pub fn matches(&self, needle_lower: &str) -> bool {
        self.title.to_lowercase().contains(needle_lower)
            || self.source.to_lowercase().contains(needle_lower)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCounts {
    pub legitimate: u64,
    pub suspicious: u64,
    pub likely_spam: u64,
    pub spam: u64,
}

impl StatCounts {
    pub fn set(&mut self, level: SpamLevel, count: u64) {
        match level {
            SpamLevel::Legitimate => self.legitimate = count,
            SpamLevel::Suspicious => self.suspicious = count,
            SpamLevel::LikelySpam => self.likely_spam = count,
            SpamLevel::Spam => self.spam = count,
        }
    }

    pub fn total(&self) -> u64 {
        self.legitimate + self.suspicious + self.likely_spam + self.spam
    }

    /// Share of spam and likely spam among `analyzed`, in percent with two decimals.
    pub fn spam_percentage(&self, analyzed: u64) -> f64 {
        let flagged = (self.spam + self.likely_spam) as f64;
        let ratio = flagged / analyzed.max(1) as f64 * 100.0;
        (ratio * 100.0).round() / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_uses_persisted_column_names() {
        let record = ArticleRecord {
            id: 1_700_000_000_000,
            title: "Budget passes".to_string(),
            source: "Manual Entry".to_string(),
            url: "".to_string(),
            category: "General".to_string(),
            spam_score: 0,
            spam_level: SpamLevel::Legitimate,
            credibility: 20,
            timestamp: "2023-11-14T22:13:20+00:00".to_string(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["ID"], 1_700_000_000_000i64);
        assert_eq!(json["Spam_Level"], "legitimate");
        assert_eq!(json["URL"], "");
        assert!(json.get("title").is_none());
    }

    #[test]
    fn spam_percentage_rounds_and_guards_zero() {
        let empty = StatCounts::default();
        assert_eq!(empty.spam_percentage(0), 0.0);

        let counts = StatCounts {
            legitimate: 1,
            suspicious: 0,
            likely_spam: 1,
            spam: 1,
        };
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.spam_percentage(3), 66.67);
    }
}
