use news_spam_cli::detector::SpamDetector;
use news_spam_cli::scraper::CandidateSource;
use std::sync::Arc;

use crate::store::ArticleStore;

/// Shared by every handler. The detector is read-only, the store does its own locking.
#[derive(Clone)]
pub struct AppState {
    pub detector: Arc<SpamDetector>,
    pub store: Arc<dyn ArticleStore>,
    pub source: Arc<dyn CandidateSource>,
}

impl AppState {
    pub fn new(
        detector: SpamDetector,
        store: Arc<dyn ArticleStore>,
        source: Arc<dyn CandidateSource>,
    ) -> Self {
        AppState {
            detector: Arc::new(detector),
            store,
            source,
        }
    }
}
