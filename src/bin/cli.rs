//! deal-alert CLI
//!
//! Entry point for the scheduled job: runs once and exits.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use deal_alert::{
    error::{AppError, Result},
    models::{Config, ListingSelectors},
    pipeline::{self, RunOptions},
    services::{Crawler, Notifier, PageExtractor, ResendMailer},
    storage::{CsvStorage, PostStore},
    utils::http::HttpFetcher,
};

/// deal-alert - emails new posts from a paginated deals listing
#[derive(Parser, Debug)]
#[command(name = "deal-alert", version, about = "Deals listing new-post alerter")]
struct Cli {
    /// Load environment variables from this file (default: ./.env if present)
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Crawl the listing, store the snapshot and email new posts (default)
    Run {
        /// Report new posts without saving state or sending email
        #[arg(long)]
        dry_run: bool,
    },

    /// Check that every required setting is present
    Validate,

    /// Show the stored snapshot
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn load_env_file(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => dotenvy::from_path(path).map_err(|e| {
            AppError::config(format!("Cannot load env file {}: {}", path.display(), e))
        }),
        None => {
            // A missing default .env is normal when the scheduler sets the environment.
            dotenvy::dotenv().ok();
            Ok(())
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    load_env_file(cli.env_file.as_deref())?;
    let config = Config::from_env()?;

    match cli.command.unwrap_or(Command::Run { dry_run: false }) {
        Command::Run { dry_run } => {
            let extractor = PageExtractor::new(&ListingSelectors::default())?;
            let fetcher = HttpFetcher::from_config(&config.crawler)?;
            let crawler = Crawler::from_config(fetcher, extractor, &config);
            let store = CsvStorage::new(&config.state_file);
            let mailer = ResendMailer::new(&config.mail, config.crawler.timeout_secs)?;
            let notifier = Notifier::from_config(mailer, &config);

            let summary =
                pipeline::run_alert(&config, &crawler, &store, &notifier, RunOptions { dry_run })
                    .await;

            log::info!(
                "Done: {} posts over {} pages, {} new",
                summary.crawled,
                summary.pages_fetched,
                summary.new_posts.len()
            );
        }

        Command::Validate => {
            log::info!("✓ Config OK");
            log::info!("  Listing: {}", config.listing_url);
            log::info!("  Base URL: {}", config.base_url);
            log::info!("  State file: {}", config.state_file.display());
            log::info!("  Campaign: {}", config.campaign);
            log::info!(
                "  Delay: {}ms, timeout: {}s, page limit: {}",
                config.crawler.request_delay_ms,
                config.crawler.timeout_secs,
                config.crawler.max_pages
            );
        }

        Command::Info => {
            let store = CsvStorage::new(&config.state_file);
            log::info!("State file: {}", store.path().display());
            if !store.path().exists() {
                log::info!("No snapshot found yet.");
            } else {
                match store.load_posts().await {
                    Ok(posts) => {
                        log::info!("Stored posts: {}", posts.len());
                        for post in &posts {
                            log::debug!("  {}", post.format("{title} ({date}) {link}"));
                        }
                    }
                    Err(e) => log::warn!("Snapshot unreadable: {}", e),
                }
            }
        }
    }

    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ AppError::MissingConfig(_)) => {
            // Written straight to stderr so the key list survives RUST_LOG=off.
            eprintln!("--- CRITICAL ERROR ---");
            eprintln!("{}", e);
            eprintln!("Aborted.");
            ExitCode::from(1)
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::from(1)
        }
    }
}
