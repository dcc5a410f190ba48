mod config;
mod db;
mod handlers;
mod models;
mod routes;
mod state;
mod store;

use std::error::Error;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    Extension, Router,
};
use news_spam_cli::{detector::SpamDetector, rules::DetectorRules, scraper::NewsScraper};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{Config, ConfigError};
use routes::api::api_routes;
use state::AppState;
use store::SqliteStore;

const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

fn cors_layer(config: &Config) -> Result<CorsLayer, ConfigError> {
    let cors = CorsLayer::new()
        .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    match &config.client_url {
        Some(url) => {
            let origin = url.parse::<HeaderValue>().map_err(|_| ConfigError::Invalid {
                key: "CLIENT_URL",
                value: url.clone(),
            })?;
            Ok(cors.allow_origin(origin).allow_credentials(true))
        }
        None => Ok(cors.allow_origin(Any)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();

    let config = Config::from_env()?;
    let rules = DetectorRules::load(config.rules_path.as_deref())?;
    info!(
        categories = rules.keywords.len(),
        trusted_domains = rules.trusted_domains.len(),
        "Spam rules loaded"
    );

    let store = SqliteStore::connect(&config.database_url).await?;
    let scraper = NewsScraper::new(config.scrape_timeout)?;
    let state = AppState::new(SpamDetector::new(rules), Arc::new(store), Arc::new(scraper));

    let app = Router::new()
        .nest("/api", api_routes())
        .layer(Extension(state))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config)?);

    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %config.bind_addr(), "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
