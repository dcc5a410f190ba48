use axum::routing::{get, post};
use axum::Router;
use crate::handlers::article_handlers::{analyze, export, health, list_articles, scrape, search, stats};

pub fn api_routes() -> Router {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/scrape", post(scrape))
        .route("/articles", get(list_articles))
        .route("/stats", get(stats))
        .route("/search", get(search))
        .route("/export", get(export))
        .route("/health", get(health))
}
