//! Keyword and trusted-domain lists used by the detector.
//!
//! Rules are built once at startup, either from the built-in lists or from a
//! JSON file, and handed to [`crate::detector::SpamDetector::new`]. Nothing
//! mutates them afterwards.

use crate::error::RulesError;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const CLICKBAIT: &[&str] = &[
    "click here",
    "you won't believe",
    "shocking",
    "doctors hate this",
    "viral",
    "trending now",
    "breaking",
    "exclusive",
    "unbelievable",
    "this will",
    "what happened next",
];

const FAKE_NEWS: &[&str] = &[
    "fake news",
    "hoax",
    "conspiracy",
    "illuminati",
    "coverup",
    "deep state",
    "secret government",
    "truth",
    "wake up sheeple",
    "mainstream media lies",
];

const SPAM: &[&str] = &[
    "buy now",
    "click here",
    "limited time",
    "act now",
    "guaranteed",
    "risk-free",
    "make money fast",
    "earn $",
    "work from home",
    "spam",
    "promotional",
];

const TRUSTED_DOMAINS: &[&str] = &[
    "bbc.com",
    "reuters.com",
    "apnews.com",
    "theguardian.com",
    "nytimes.com",
    "washingtonpost.com",
    "ft.com",
    "economist.com",
    "aljazeera.com",
    "dw.com",
    "bbc.co.uk",
    "independent.co.uk",
    "telegraph.co.uk",
    "cnn.com",
    "nbcnews.com",
    "abcnews.com",
    "cbsnews.com",
    "foxnews.com",
];

/// Category name → lowercase trigger phrases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpamKeywordSet {
    categories: BTreeMap<String, Vec<String>>,
}

impl SpamKeywordSet {
    pub fn new<C, P>(categories: C) -> Self
    where
        C: IntoIterator<Item = (String, P)>,
        P: IntoIterator<Item = String>,
    {
        let categories = categories
            .into_iter()
            .map(|(name, phrases)| {
                let mut normalized: Vec<String> = Vec::new();
                for phrase in phrases {
                    let phrase = phrase.trim().to_lowercase();
                    if !phrase.is_empty() && !normalized.contains(&phrase) {
                        normalized.push(phrase);
                    }
                }
                (name.trim().to_string(), normalized)
            })
            .filter(|(name, phrases)| !name.is_empty() && !phrases.is_empty())
            .collect();

        Self { categories }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.categories
            .iter()
            .map(|(name, phrases)| (name.as_str(), phrases.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl Default for SpamKeywordSet {
    fn default() -> Self {
        let builtin = [("clickbait", CLICKBAIT), ("fake_news", FAKE_NEWS), ("spam", SPAM)];
        Self::new(builtin.iter().map(|(name, phrases)| {
            (
                name.to_string(),
                phrases.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
            )
        }))
    }
}

/// Domains that get the top credibility tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedDomainSet {
    domains: BTreeSet<String>,
}

impl TrustedDomainSet {
    pub fn new<I: IntoIterator<Item = String>>(domains: I) -> Self {
        Self {
            domains: domains
                .into_iter()
                .map(|d| d.trim().to_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, host: &str) -> bool {
        self.domains.contains(host)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

impl Default for TrustedDomainSet {
    fn default() -> Self {
        Self::new(TRUSTED_DOMAINS.iter().map(|d| d.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectorRules {
    pub keywords: SpamKeywordSet,
    pub trusted_domains: TrustedDomainSet,
}

#[derive(Deserialize)]
struct RuleFile {
    #[serde(default)]
    keywords: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    trusted_domains: Vec<String>,
}

impl DetectorRules {
    /// Parses `{"keywords": {category: [phrase, ...]}, "trusted_domains": [...]}`.
    pub fn from_json_str(raw: &str) -> Result<Self, RulesError> {
        let file: RuleFile = serde_json::from_str(raw)?;
        Ok(Self {
            keywords: SpamKeywordSet::new(file.keywords),
            trusted_domains: TrustedDomainSet::new(file.trusted_domains),
        })
    }

    pub fn from_json_file(path: &Path) -> Result<Self, RulesError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Loads `path` when given, otherwise the built-in lists.
    pub fn load(path: Option<&Path>) -> Result<Self, RulesError> {
        match path {
            Some(p) => Self::from_json_file(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_rules_have_three_categories() {
        let rules = DetectorRules::default();
        let names: Vec<&str> = rules.keywords.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["clickbait", "fake_news", "spam"]);
        assert_eq!(rules.trusted_domains.len(), 18);
        assert!(rules.trusted_domains.contains("bbc.com"));
    }

    #[test]
    fn phrases_are_lowercased_and_blank_entries_dropped() {
        let set = SpamKeywordSet::new(vec![
            ("promo".to_string(), vec!["  BUY Now ".to_string(), "".to_string()]),
            ("empty".to_string(), vec!["   ".to_string()]),
        ]);
        let collected: Vec<(&str, &[String])> = set.iter().collect();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].0, "promo");
        assert_eq!(collected[0].1, &["buy now".to_string()][..]);
    }

    #[test]
    fn rule_file_parses() {
        let rules = DetectorRules::from_json_str(
            r#"{"keywords": {"scam": ["Free Crypto"]}, "trusted_domains": ["Example.org"]}"#,
        )
        .unwrap();
        assert_eq!(rules.keywords.len(), 1);
        assert!(rules.trusted_domains.contains("example.org"));
    }

    #[test]
    fn rule_file_with_bad_json_is_an_error() {
        let err = DetectorRules::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, RulesError::Json(_)));
    }

    #[test]
    fn missing_rule_file_is_an_io_error() {
        let path = std::env::temp_dir().join(format!("missing_rules_{}.json", uuid::Uuid::new_v4()));
        let err = DetectorRules::load(Some(&path)).unwrap_err();
        assert!(matches!(err, RulesError::Io(_)));
    }
}
