use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use market_data_ingestor::providers::polygon_rest::PolygonProvider;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use level_sync::config::AppConfig;
use level_sync::news::NewsfilterClient;
use level_sync::notify::TelegramNotifier;
use level_sync::pipeline::{Pipeline, RunContext, RunReport};
use level_sync::reconcile;
use level_sync::schedule::{self, RunWindow};
use level_sync::store::SqliteStore;
use level_sync::summarize::{OpenAiSummarizer, Summarizer};
use level_sync::toplist;

#[derive(Parser)]
#[command(version, about = "Derives trading levels for top-list symbols and syncs them to a local store")]
struct Cli {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline once.
    Run {
        /// Symbols to process, comma separated. Scans the gainers snapshot
        /// when omitted.
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<String>,
        /// Plan everything, write nothing.
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the current gainers snapshot and which symbols pass admission.
    Scan,
    /// Run repeatedly while the extended session is open.
    Watch {
        /// Seconds between attempts.
        #[arg(long, default_value_t = 60)]
        interval_secs: u64,
    },
    /// Delete stored records missing required fields.
    Scrub,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Run { symbols, dry_run } => {
            if let Err(e) = run_once(&config, symbols, dry_run).await {
                notify_error(&format!("Run failed: {e}")).await;
                return Err(e);
            }
        }
        Command::Scan => scan(&config).await?,
        Command::Watch { interval_secs } => watch(&config, interval_secs).await,
        Command::Scrub => scrub(&config)?,
    }
    Ok(())
}

async fn run_once(config: &AppConfig, symbols: Vec<String>, dry_run: bool) -> Result<RunReport> {
    let provider = PolygonProvider::new()?;
    let store = SqliteStore::open(&config.database_path())?;

    let symbols = if symbols.is_empty() {
        scan_symbols(config, &provider).await?
    } else {
        symbols
    };
    if symbols.is_empty() {
        info!("no symbols passed admission; nothing to do");
        return Ok(RunReport::default());
    }

    let summarizer = match OpenAiSummarizer::new() {
        Ok(s) => Some(s),
        Err(e) => {
            warn!(error = %e, "summarizer unavailable; skipping suggestions");
            None
        }
    };
    let newsfilter = match config.news.newsfilter_base_url.as_deref() {
        Some(base_url) => Some(NewsfilterClient::new(base_url)?),
        None => None,
    };

    let ctx = RunContext::new(config.clone(), symbols, Utc::now())?;
    let pipeline = Pipeline {
        provider: &provider,
        store: &store,
        summarizer: summarizer.as_ref().map(|s| s as &dyn Summarizer),
        newsfilter: newsfilter.as_ref(),
        dry_run,
    };

    let report = pipeline.run(&ctx).await?;
    if !report.symbols_of_concern.is_empty() {
        notify_error(&format!(
            "Records did not land for: {}",
            report.symbols_of_concern.join(", ")
        ))
        .await;
    }
    Ok(report)
}

async fn scan_symbols(config: &AppConfig, provider: &PolygonProvider) -> Result<Vec<String>> {
    let snapshots = provider.top_gainers().await?;
    let admitted = toplist::filter_symbols(&snapshots, &config.toplist_filter());
    Ok(toplist::clean_symbols(&admitted))
}

async fn scan(config: &AppConfig) -> Result<()> {
    let provider = PolygonProvider::new()?;
    let snapshots = provider.top_gainers().await?;

    let rows = toplist::shape_rows(&snapshots);
    println!("{}", serde_json::to_string_pretty(&rows)?);

    let admitted = toplist::filter_symbols(&snapshots, &config.toplist_filter());
    println!("admitted: {:?}", toplist::clean_symbols(&admitted));
    Ok(())
}

async fn watch(config: &AppConfig, interval_secs: u64) {
    info!(interval_secs, "watch loop started");
    let window = RunWindow::default();
    loop {
        match config.tz() {
            Ok(tz) if schedule::should_run_now(&tz, &window) => {
                match run_once(config, Vec::new(), false).await {
                    Ok(report) => info!(
                        inserted = report.inserted,
                        updated = report.updated,
                        "scheduled run completed"
                    ),
                    Err(e) => {
                        error!(error = %e, "scheduled run failed");
                        notify_error(&format!("Scheduled run failed: {e}")).await;
                    }
                }
            }
            Ok(_) => info!("outside the run window; skipping"),
            Err(e) => {
                error!(error = %e, "configuration became invalid; stopping watch loop");
                return;
            }
        }
        tokio::time::sleep(Duration::from_secs(interval_secs)).await;
    }
}

fn scrub(config: &AppConfig) -> Result<()> {
    let store = SqliteStore::open(&config.database_path())?;
    let report = reconcile::scrub(&store, &config.run.collection)?;
    if report.found.is_empty() {
        println!("no corrupt records found");
    } else {
        println!(
            "deleted {} corrupt record(s) for: {}",
            report.deleted,
            report.found.join(", ")
        );
    }
    Ok(())
}

/// Best effort: a missing notifier configuration only logs.
async fn notify_error(message: &str) {
    match TelegramNotifier::new() {
        Ok(notifier) => {
            notifier.send_error(message).await;
        }
        Err(e) => warn!(error = %e, "notifier unavailable"),
    }
}
