use chrono::Utc;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use news_spam_cli::{
    detector::{AnalysisInput, SpamDetector},
    rules::DetectorRules,
    scraper::{CandidateSource, NewsScraper},
    utils,
};
use serde::Serialize;
use std::{error::Error, path::PathBuf, time::Duration};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Score news headlines for spam and clickbait", long_about = None)]
struct Args {
    /// JSON rule file replacing the built-in keyword and trusted-domain lists
    #[arg(short, long, global = true, env = "SPAM_RULES_PATH")]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score a single article
    Analyze {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        content: String,

        #[arg(short, long, default_value = "")]
        url: String,
    },
    /// Scrape the fixed news sources and score every headline
    Scrape {
        /// Where to write the scored headlines
        #[arg(short, long, default_value = "result.json")]
        output: PathBuf,

        /// Optional plain-text summary
        #[arg(long)]
        report: Option<PathBuf>,

        /// Per-request timeout in seconds
        #[arg(long, default_value_t = 10)]
        timeout: u64,
    },
}

#[derive(Serialize)]
struct ScoredHeadline {
    title: String,
    source: String,
    url: String,
    category: String,
    spam_score: u8,
    spam_level: String,
    credibility: u8,
}

fn render_report(rows: &[ScoredHeadline]) -> String {
    let mut out = format!("Spam report generated {}\n\n", Utc::now().to_rfc3339());
    for row in rows {
        out.push_str(&format!(
            "[{:>3}] {:<11} cred {:>2}  {} ({})\n",
            row.spam_score, row.spam_level, row.credibility, row.title, row.source
        ));
    }
    out.push_str(&format!("\n{} headlines analyzed\n", rows.len()));
    out
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let rules = DetectorRules::load(args.rules.as_deref())?;
    let detector = SpamDetector::new(rules);

    match args.command {
        Command::Analyze { title, content, url } => {
            let result = detector.analyze(&AnalysisInput { title, content, url })?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Scrape { output, report, timeout } => {
            let scraper = NewsScraper::new(Duration::from_secs(timeout))?;
            let candidates = scraper.fetch_candidates().await;

            let mut rows = Vec::new();
            for candidate in candidates {
                let input = AnalysisInput {
                    title: candidate.title.clone(),
                    content: candidate.title.clone(),
                    url: candidate.url.clone(),
                };
                match detector.analyze(&input) {
                    Ok(result) => rows.push(ScoredHeadline {
                        title: candidate.title,
                        source: candidate.source,
                        url: candidate.url,
                        category: candidate.category,
                        spam_score: result.spam_score,
                        spam_level: result.spam_level.to_string(),
                        credibility: result.credibility,
                    }),
                    Err(e) => warn!(error = %e, source = %candidate.source, "Skipping headline"),
                }
            }

            if rows.is_empty() {
                warn!("No headlines could be collected from any source");
            }

            utils::save_json(&serde_json::json!({ "count": rows.len(), "articles": rows }), &output)?;
            if let Some(path) = report {
                utils::save_text(&render_report(&rows), &path)?;
            }
            info!(count = rows.len(), "Scrape finished");
        }
    }

    Ok(())
}
