pub mod detector;
pub mod error;
pub mod rules;
pub mod scraper;
pub mod utils;

use serde::{Deserialize, Serialize};

/// A headline pulled from one of the fixed news sources, not yet analyzed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub title: String,
    pub source: String,
    pub url: String,
    pub category: String,
}

impl Candidate {
    pub fn new(title: String, source: &str, url: String, category: &str) -> Self {
        Self {
            title,
            source: source.to_string(),
            url,
            category: category.to_string(),
        }
    }
}
