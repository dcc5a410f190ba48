//! Rule-based spam and clickbait scoring.
//!
//! [`SpamDetector::analyze`] combines three parts:
//!
//! - [`TextSpamScorer`]: keyword hits plus structural title signals, capped at 100
//! - [`SourceCredibilityRater`]: domain trust tier from the article URL
//! - [`SpamLevel`]: fixed thresholds over the score
//!
//! Everything here is pure. A detector can be shared between any number of
//! tasks without locking.

use crate::error::AnalyzeError;
use crate::rules::{DetectorRules, SpamKeywordSet, TrustedDomainSet};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use url::Url;

static CLICKBAIT_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+\s*(ways|reasons|things|secrets|tips|tricks)").expect("Invalid clickbait regex")
});

const KEYWORD_WEIGHT: u32 = 15;
const CAPS_PERCENT_LIMIT: usize = 30;
const CAPS_WEIGHT: u32 = 20;
const EXCLAMATION_LIMIT: usize = 2;
const EXCLAMATION_WEIGHT: u32 = 10;
const QUESTION_LIMIT: usize = 1;
const QUESTION_WEIGHT: u32 = 5;
const CLICKBAIT_PATTERN_WEIGHT: u32 = 15;
const MAX_SCORE: u32 = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisInput {
    pub title: String,
    pub content: String,
    pub url: String,
}

/// Evidence behind a score. Only triggered signals are serialized, plus
/// `word_count` which is always present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignalDetails {
    #[serde(flatten)]
    pub keyword_matches: BTreeMap<String, Vec<String>>,
    pub word_count: usize,
    #[serde(skip_serializing_if = "is_false")]
    pub excessive_caps: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub excessive_exclamation: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub excessive_questions: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub clickbait_pattern: bool,
}

fn is_false(flag: &bool) -> bool {
    !*flag
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpamLevel {
    Legitimate,
    Suspicious,
    LikelySpam,
    Spam,
}

impl SpamLevel {
    pub const ALL: [SpamLevel; 4] = [
        SpamLevel::Legitimate,
        SpamLevel::Suspicious,
        SpamLevel::LikelySpam,
        SpamLevel::Spam,
    ];

    /// Lower bounds are inclusive: 20 is already suspicious.
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=19 => SpamLevel::Legitimate,
            20..=39 => SpamLevel::Suspicious,
            40..=59 => SpamLevel::LikelySpam,
            _ => SpamLevel::Spam,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpamLevel::Legitimate => "legitimate",
            SpamLevel::Suspicious => "suspicious",
            SpamLevel::LikelySpam => "likely_spam",
            SpamLevel::Spam => "spam",
        }
    }
}

impl fmt::Display for SpamLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpamLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpamLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| format!("unknown spam level: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub spam_score: u8,
    pub spam_level: SpamLevel,
    pub credibility: u8,
    pub details: SignalDetails,
}

pub struct TextSpamScorer {
    keywords: SpamKeywordSet,
}

impl TextSpamScorer {
    pub fn new(keywords: SpamKeywordSet) -> Self {
        Self { keywords }
    }

    pub fn score(&self, title: &str, content: &str) -> (u8, SignalDetails) {
        let text = format!("{} {}", title, content).to_lowercase();
        let mut total: u32 = 0;
        let mut details = SignalDetails {
            word_count: content.split_whitespace().count(),
            ..SignalDetails::default()
        };

        // Phrases are counted once each, and the same phrase may hit in several categories.
        for (category, phrases) in self.keywords.iter() {
            let found: Vec<String> = phrases
                .iter()
                .filter(|phrase| text.contains(phrase.as_str()))
                .cloned()
                .collect();
            if !found.is_empty() {
                total += KEYWORD_WEIGHT * found.len() as u32;
                details.keyword_matches.insert(category.to_string(), found);
            }
        }

        let title_len = title.chars().count().max(1);
        let caps = title.chars().filter(|c| c.is_uppercase()).count();
        if caps * 100 > CAPS_PERCENT_LIMIT * title_len {
            total += CAPS_WEIGHT;
            details.excessive_caps = true;
        }

        let exclamations = title.matches('!').count();
        if exclamations > EXCLAMATION_LIMIT {
            total += EXCLAMATION_WEIGHT * exclamations as u32;
            details.excessive_exclamation = true;
        }

        let questions = title.matches('?').count();
        if questions > QUESTION_LIMIT {
            total += QUESTION_WEIGHT * questions as u32;
            details.excessive_questions = true;
        }

        if CLICKBAIT_NUMBER.is_match(&title.to_lowercase()) {
            total += CLICKBAIT_PATTERN_WEIGHT;
            details.clickbait_pattern = true;
        }

        (total.min(MAX_SCORE) as u8, details)
    }
}

pub struct SourceCredibilityRater {
    trusted: TrustedDomainSet,
}

impl SourceCredibilityRater {
    pub const TRUSTED: u8 = 90;
    pub const INSTITUTIONAL: u8 = 85;
    pub const COMMERCIAL: u8 = 60;
    pub const OTHER: u8 = 40;
    pub const UNKNOWN: u8 = 20;

    pub fn new(trusted: TrustedDomainSet) -> Self {
        Self { trusted }
    }

    /// Never fails: anything without a parsable host rates as [`Self::UNKNOWN`].
    pub fn credibility(&self, url: &str) -> u8 {
        let host = match Url::parse(url.trim()).ok().and_then(|u| u.host_str().map(str::to_lowercase)) {
            Some(h) if !h.is_empty() => h,
            _ => return Self::UNKNOWN,
        };
        let domain = host.strip_prefix("www.").unwrap_or(&host);

        if self.trusted.contains(domain) {
            Self::TRUSTED
        } else if domain.ends_with(".edu") || domain.ends_with(".gov") {
            Self::INSTITUTIONAL
        } else if domain.ends_with(".com") {
            Self::COMMERCIAL
        } else {
            Self::OTHER
        }
    }
}

pub struct SpamDetector {
    scorer: TextSpamScorer,
    rater: SourceCredibilityRater,
}

impl SpamDetector {
    pub fn new(rules: DetectorRules) -> Self {
        Self {
            scorer: TextSpamScorer::new(rules.keywords),
            rater: SourceCredibilityRater::new(rules.trusted_domains),
        }
    }

    pub fn analyze(&self, input: &AnalysisInput) -> Result<AnalysisResult, AnalyzeError> {
        if input.title.trim().is_empty() {
            return Err(AnalyzeError::MissingField { field: "title" });
        }
        if input.content.trim().is_empty() {
            return Err(AnalyzeError::MissingField { field: "content" });
        }

        let (spam_score, details) = self.scorer.score(&input.title, &input.content);
        Ok(AnalysisResult {
            spam_score,
            spam_level: SpamLevel::from_score(spam_score),
            credibility: self.rater.credibility(&input.url),
            details,
        })
    }
}

impl Default for SpamDetector {
    fn default() -> Self {
        Self::new(DetectorRules::default())
    }
}
