use axum::{
    extract::{rejection::JsonRejection, Query},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use news_spam_cli::detector::{AnalysisInput, AnalysisResult, SpamLevel};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::models::article::{ArticleRecord, NewArticle};
use crate::state::AppState;
use crate::store::ArticleStore;

const PER_PAGE: usize = 10;
const SEARCH_LIMIT: usize = 20;

type ApiError = (StatusCode, Json<Value>);

fn database_error(e: impl std::fmt::Display) -> ApiError {
    error!(error = %e, "Store read failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Database error" })),
    )
}

/// Appends the record and bumps its level counter in one store transaction.
/// Failures are logged, never raised.
pub async fn persist(store: &dyn ArticleStore, article: &NewArticle) -> bool {
    match store.append_and_count(article).await {
        Ok((record, counts)) => {
            debug!(id = record.id, level = %record.spam_level, total = counts.total(), "Article saved");
            true
        }
        Err(e) => {
            error!(error = %e, title = %article.title, "Save error");
            false
        }
    }
}

fn new_article(
    input: AnalysisInput,
    source: String,
    category: String,
    result: &AnalysisResult,
) -> NewArticle {
    NewArticle {
        title: input.title,
        source,
        url: input.url,
        category,
        spam_score: result.spam_score,
        spam_level: result.spam_level,
        credibility: result.credibility,
        timestamp: Utc::now(),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzePayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

pub async fn analyze(
    Extension(state): Extension<AppState>,
    payload: Result<Json<AnalyzePayload>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": rejection.body_text() })),
        )
    })?;

    let input = AnalysisInput {
        title: payload.title.unwrap_or_default(),
        content: payload.content.unwrap_or_default(),
        url: payload.url.unwrap_or_default(),
    };

    let result = state.detector.analyze(&input).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        )
    })?;

    let article = new_article(
        input,
        payload.source.unwrap_or_else(|| "Manual Entry".to_string()),
        payload.category.unwrap_or_else(|| "General".to_string()),
        &result,
    );
    persist(state.store.as_ref(), &article).await;

    Ok((StatusCode::OK, Json(result)))
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrapedSummary {
    pub title: String,
    pub source: String,
    pub spam_score: u8,
    pub spam_level: SpamLevel,
    pub credibility: u8,
}

pub async fn scrape(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let candidates = state.source.fetch_candidates().await;
    let mut results = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        // Headlines carry no body text, so the title doubles as content.
        let input = AnalysisInput {
            title: candidate.title.clone(),
            content: candidate.title.clone(),
            url: candidate.url,
        };
        let result = match state.detector.analyze(&input) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, source = %candidate.source, "Skipping scraped headline");
                continue;
            }
        };

        let article = new_article(input, candidate.source.clone(), candidate.category, &result);
        persist(state.store.as_ref(), &article).await;

        results.push(ScrapedSummary {
            title: candidate.title,
            source: candidate.source,
            spam_score: result.spam_score,
            spam_level: result.spam_level,
            credibility: result.credibility,
        });
    }

    info!(count = results.len(), "Scrape batch analyzed");
    (
        StatusCode::OK,
        Json(json!({ "count": results.len(), "articles": results })),
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Missing, unparsable or non-positive pages all mean page 1.
fn page_number(raw: Option<&str>) -> usize {
    raw.and_then(|p| p.trim().parse::<usize>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

pub async fn list_articles(
    Extension(state): Extension<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let articles = state.store.read_all_records().await.map_err(database_error)?;
    let page = page_number(query.page.as_deref());
    let total = articles.len();

    let page_items: Vec<ArticleRecord> = articles
        .into_iter()
        .skip((page - 1).saturating_mul(PER_PAGE))
        .take(PER_PAGE)
        .collect();

    Ok((
        StatusCode::OK,
        Json(json!({
            "articles": page_items,
            "total": total,
            "page": page,
            "pages": total.div_ceil(PER_PAGE),
        })),
    ))
}

pub async fn stats(Extension(state): Extension<AppState>) -> Result<impl IntoResponse, ApiError> {
    let counts = state.store.read_stats().await.map_err(database_error)?;
    let total = state.store.read_all_records().await.map_err(database_error)?.len() as u64;

    Ok((
        StatusCode::OK,
        Json(json!({
            "stats": counts,
            "total_analyzed": total,
            "spam_percentage": counts.spam_percentage(total),
        })),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn search(
    Extension(state): Extension<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let needle = query.q.to_lowercase();
    let matches: Vec<ArticleRecord> = state
        .store
        .read_all_records()
        .await
        .map_err(database_error)?
        .into_iter()
        .filter(|a| a.matches(&needle))
        .collect();
    let count = matches.len();

    Ok((
        StatusCode::OK,
        Json(json!({
            "results": &matches[..count.min(SEARCH_LIMIT)],
            "count": count,
        })),
    ))
}

pub async fn export(Extension(state): Extension<AppState>) -> Result<impl IntoResponse, ApiError> {
    let articles = state.store.read_all_records().await.map_err(database_error)?;
    Ok((StatusCode::OK, Json(json!({ "articles": articles }))))
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
