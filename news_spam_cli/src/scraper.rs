use crate::error::ScrapeError;
use crate::Candidate;
use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const PER_SITE_LIMIT: usize = 10;
const MIN_HEADLINE_CHARS: usize = 10;
pub const MAX_RETRY_ELAPSED: Duration = Duration::from_secs(30);

/// Anything that can hand over a batch of headlines to analyze.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Best effort. A failing site contributes nothing instead of failing the batch.
    async fn fetch_candidates(&self) -> Vec<Candidate>;
}

/// Where a candidate's URL comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSource {
    /// Headline text only; every candidate points at the listing page.
    PageUrl,
    /// The matched element is itself the link.
    Href,
    /// The first `a` inside the matched element holds both title and link.
    FirstAnchor,
}

#[derive(Debug, Clone, Copy)]
pub struct SourceSite {
    pub name: &'static str,
    pub url: &'static str,
    pub category: &'static str,
    pub selector: &'static str,
    pub link: LinkSource,
    pub min_title_chars: Option<usize>,
}

pub const NEWS_SITES: &[SourceSite] = &[
    SourceSite {
        name: "BBC News",
        url: "https://www.bbc.com/news",
        category: "News",
        selector: "h2",
        link: LinkSource::PageUrl,
        min_title_chars: Some(MIN_HEADLINE_CHARS),
    },
    SourceSite {
        name: "The Guardian",
        url: "https://www.theguardian.com/international",
        category: "News",
        selector: "a[data-link-name=\"article\"]",
        link: LinkSource::Href,
        min_title_chars: Some(MIN_HEADLINE_CHARS),
    },
    SourceSite {
        name: "Hacker News",
        url: "https://news.ycombinator.com",
        category: "Tech",
        selector: "span.titleline",
        link: LinkSource::FirstAnchor,
        min_title_chars: None,
    },
];

fn element_text(el: &ElementRef) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn resolve(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Pulls up to ten candidates out of a listing page.
pub fn parse_candidates(site: &SourceSite, html: &str) -> Result<Vec<Candidate>, ScrapeError> {
    let selector = Selector::parse(site.selector).map_err(|e| ScrapeError::Selector(e.to_string()))?;
    let anchor = Selector::parse("a").map_err(|e| ScrapeError::Selector(e.to_string()))?;
    let base = Url::parse(site.url)?;
    let doc = Html::parse_document(html);

    let mut candidates = Vec::new();
    for el in doc.select(&selector).take(PER_SITE_LIMIT) {
        let (title, url) = match site.link {
            LinkSource::PageUrl => (element_text(&el), site.url.to_string()),
            LinkSource::Href => (
                element_text(&el),
                resolve(&base, el.value().attr("href").unwrap_or_default()),
            ),
            LinkSource::FirstAnchor => match el.select(&anchor).next() {
                Some(a) => (
                    element_text(&a),
                    resolve(&base, a.value().attr("href").unwrap_or_default()),
                ),
                None => continue,
            },
        };

        if let Some(min) = site.min_title_chars {
            if title.chars().count() <= min {
                continue;
            }
        }

        candidates.push(Candidate::new(title, site.name, url, site.category));
    }

    Ok(candidates)
}

pub struct NewsScraper {
    client: Client,
    sites: Vec<SourceSite>,
    max_retry_elapsed: Duration,
}

impl NewsScraper {
    pub fn new(timeout: Duration) -> Result<Self, ScrapeError> {
        Self::with_sites(timeout, MAX_RETRY_ELAPSED, NEWS_SITES.to_vec())
    }

    /// `max_retry_elapsed` bounds how long transport errors on one site are retried.
    pub fn with_sites(
        timeout: Duration,
        max_retry_elapsed: Duration,
        sites: Vec<SourceSite>,
    ) -> Result<Self, ScrapeError> {
        Ok(Self {
            client: Client::builder()
                .user_agent(USER_AGENT)
                .timeout(timeout)
                .build()?,
            sites,
            max_retry_elapsed,
        })
    }

    #[instrument(level = "info", skip_all, fields(site = site.name))]
    async fn scrape_site(&self, site: SourceSite) -> Vec<Candidate> {
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.max_retry_elapsed),
            ..ExponentialBackoff::default()
        };

        let fetched = retry(backoff, move || async move {
            self.fetch_page(site.url).await.map_err(|e| match e {
                ScrapeError::Http(_) => {
                    debug!(error = %e, "Transient fetch error, retrying");
                    backoff::Error::transient(e)
                }
                other => backoff::Error::permanent(other),
            })
        })
        .await;

        let body = match fetched {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, url = site.url, "Scraping failed");
                return Vec::new();
            }
        };

        match parse_candidates(&site, &body) {
            Ok(candidates) => {
                info!(count = candidates.len(), "Parsed candidates");
                candidates
            }
            Err(e) => {
                warn!(error = %e, "Could not parse listing page");
                Vec::new()
            }
        }
    }

    async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
        let res = self.client.get(url).send().await?;
        if !res.status().is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: res.status().as_u16(),
            });
        }
        Ok(res.text().await?)
    }
}

#[async_trait]
impl CandidateSource for NewsScraper {
    async fn fetch_candidates(&self) -> Vec<Candidate> {
        let batches: Vec<Vec<Candidate>> = stream::iter(self.sites.iter().copied())
            .map(|site| self.scrape_site(site))
            .buffered(self.sites.len().max(1))
            .collect()
            .await;

        let candidates: Vec<Candidate> = batches.into_iter().flatten().collect();
        info!(count = candidates.len(), "Fetched candidates from all sources");
        candidates
    }
}
