// src/pipeline/run.rs

//! One alert run: crawl, diff against the stored snapshot, persist, notify.

use std::collections::HashSet;

use chrono::Local;

use crate::models::{Config, Post};
use crate::pipeline::calculate_diff;
use crate::services::{CrawlStop, Crawler, Mailer, Notifier, NotifyOutcome, PageFetcher};
use crate::storage::PostStore;

/// Switches for a single run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Report new posts without saving state or sending email
    pub dry_run: bool,
}

/// What a run did.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub pages_fetched: usize,
    pub crawled: usize,
    pub stop: CrawlStop,
    pub new_posts: Vec<Post>,
    pub saved: bool,
    pub notification: Option<NotifyOutcome>,
}

/// Run the alert job once.
///
/// Nothing in here is fatal: fetch failures shorten the crawl, an unreadable
/// snapshot means every post is new, and save or send failures are logged.
pub async fn run_alert<F, S, M>(
    config: &Config,
    crawler: &Crawler<F>,
    store: &S,
    notifier: &Notifier<M>,
    options: RunOptions,
) -> RunSummary
where
    F: PageFetcher,
    S: PostStore,
    M: Mailer,
{
    log::info!(
        "--- Running Scraper: {} at {} ---",
        config.campaign,
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    let outcome = crawler.crawl(&config.listing_url).await;
    let mut summary = RunSummary {
        pages_fetched: outcome.pages_fetched,
        crawled: outcome.posts.len(),
        stop: outcome.stop.clone(),
        ..RunSummary::default()
    };
    log::info!(
        "Crawled {} posts from {} pages ({} duplicates dropped)",
        outcome.posts.len(),
        outcome.pages_fetched,
        outcome.duplicates_dropped
    );

    // An empty crawl is far more likely a broken fetch than an empty
    // listing, so the stored snapshot is left alone.
    if outcome.posts.is_empty() {
        log::info!("No posts found or scraping failed. Exiting.");
        return summary;
    }

    let seen_links = store.load_seen_links().await.unwrap_or_else(|e| {
        log::warn!("Failed to read stored posts: {}. Treating all posts as new.", e);
        HashSet::new()
    });
    let new_posts = calculate_diff(&outcome.posts, &seen_links);

    if options.dry_run {
        log::info!("Dry run: {} new posts, state and email skipped", new_posts.len());
        for post in &new_posts {
            log::info!("  {}", post.format("{title} ({date}) {link}"));
        }
        summary.new_posts = new_posts;
        return summary;
    }

    match store.save_current(&outcome.posts).await {
        Ok(()) => summary.saved = true,
        Err(e) => log::warn!("Failed to save current posts: {}", e),
    }

    if new_posts.is_empty() {
        log::info!("No new posts since last check.");
    } else {
        log::info!("Found {} new posts! Sending email alert...", new_posts.len());
        summary.notification = Some(notifier.notify(&new_posts).await);
    }

    summary.new_posts = new_posts;
    summary
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::error::{AppError, Result};
    use crate::models::ListingSelectors;
    use crate::services::{Email, PageExtractor};
    use crate::storage::CsvStorage;

    struct MapFetcher(HashMap<String, String>);

    #[async_trait]
    impl PageFetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| AppError::fetch(url, "connection reset"))
        }
    }

    #[derive(Default)]
    struct OutboxMailer {
        sent: Mutex<Vec<Email>>,
    }

    #[async_trait]
    impl Mailer for OutboxMailer {
        fn is_configured(&self) -> bool {
            true
        }

        async fn send(&self, email: &Email) -> Result<String> {
            let mut sent = self.sent.lock().unwrap();
            sent.push(email.clone());
            Ok(format!("msg_{}", sent.len()))
        }
    }

    fn config(state_file: &Path) -> Config {
        let state = state_file.display().to_string();
        Config::from_lookup(move |key: &str| {
            let value = match key {
                "URL" => "https://x/search",
                "LAST_POSTS_FILE" => state.as_str(),
                "SENDER_EMAIL" => "alerts@example.com",
                "RECIPIENT_EMAIL" => "me@example.com",
                "TITLE" => "Test Deals",
                "RESEND_API_KEY" => "re_test",
                "PAGE_DELAY_MS" => "0",
                _ => return None,
            };
            Some(value.to_string())
        })
        .unwrap()
    }

    fn listing(paths: &[&str], next: Option<&str>) -> String {
        let entries: String = paths
            .iter()
            .map(|p| format!(r#"<dt class="title"><a href="/{p}">Post {p}</a></dt>"#))
            .collect();
        let pager = next
            .map(|n| format!(r#"<li><a title="Go to next page" href="{n}">next</a></li>"#))
            .unwrap_or_default();
        format!(r#"<dl class="search-results">{entries}</dl><ul>{pager}</ul>"#)
    }

    fn crawler(config: &Config, pages: &[(&str, String)]) -> Crawler<MapFetcher> {
        let pages = pages
            .iter()
            .map(|(url, markup)| (url.to_string(), markup.clone()))
            .collect();
        let extractor = PageExtractor::new(&ListingSelectors::default()).unwrap();
        Crawler::from_config(MapFetcher(pages), extractor, config)
    }

    fn post(path: &str) -> Post {
        Post::new(format!("Post {path}"), format!("https://x/{path}"), "")
    }

    #[tokio::test]
    async fn test_new_posts_are_notified_and_snapshot_saved() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp.path().join("last_posts.csv"));
        let store = CsvStorage::new(&config.state_file);
        store.save_current(&[post("a")]).await.unwrap();

        let crawler = crawler(&config, &[("https://x/search", listing(&["a", "b", "c"], None))]);
        let notifier = Notifier::from_config(OutboxMailer::default(), &config);

        let summary = run_alert(&config, &crawler, &store, &notifier, RunOptions::default()).await;

        assert_eq!(summary.new_posts, vec![post("b"), post("c")]);
        assert_eq!(summary.notification, Some(NotifyOutcome::Sent("msg_1".into())));
        assert!(summary.saved);
        assert_eq!(
            store.load_posts().await.unwrap(),
            vec![post("a"), post("b"), post("c")]
        );

        let sent = notifier.mailer().sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "🚨 Test Deals Alert: 2 New Posts Found");
        assert!(!sent[0].html.contains("https://x/a"));
    }

    #[tokio::test]
    async fn test_second_run_on_unchanged_listing_finds_nothing() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp.path().join("last_posts.csv"));
        let store = CsvStorage::new(&config.state_file);
        let crawler = crawler(
            &config,
            &[
                ("https://x/search", listing(&["a", "b"], Some("/search?page=1"))),
                ("https://x/search?page=1", listing(&["c"], None)),
            ],
        );
        let notifier = Notifier::from_config(OutboxMailer::default(), &config);

        let first = run_alert(&config, &crawler, &store, &notifier, RunOptions::default()).await;
        let second = run_alert(&config, &crawler, &store, &notifier, RunOptions::default()).await;

        assert_eq!(first.new_posts.len(), 3);
        assert!(second.new_posts.is_empty());
        assert!(second.notification.is_none());
        assert!(second.saved);
        assert_eq!(notifier.mailer().sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_partial_crawl_is_still_diffed_and_saved() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp.path().join("last_posts.csv"));
        let store = CsvStorage::new(&config.state_file);
        store.save_current(&[post("old")]).await.unwrap();

        // Page 2 is missing from the fetcher, so it fails; page 3 is never reached.
        let crawler = crawler(
            &config,
            &[
                ("https://x/search", listing(&["a", "b"], Some("/search?page=1"))),
                ("https://x/search?page=2", listing(&["z"], None)),
            ],
        );
        let notifier = Notifier::from_config(OutboxMailer::default(), &config);

        let summary = run_alert(&config, &crawler, &store, &notifier, RunOptions::default()).await;

        assert!(matches!(summary.stop, CrawlStop::FetchFailed { .. }));
        assert_eq!(summary.new_posts, vec![post("a"), post("b")]);
        assert_eq!(store.load_posts().await.unwrap(), vec![post("a"), post("b")]);
    }

    #[tokio::test]
    async fn test_empty_crawl_leaves_state_alone() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp.path().join("last_posts.csv"));
        let store = CsvStorage::new(&config.state_file);
        store.save_current(&[post("a")]).await.unwrap();

        let crawler = crawler(&config, &[]);
        let notifier = Notifier::from_config(OutboxMailer::default(), &config);

        let summary = run_alert(&config, &crawler, &store, &notifier, RunOptions::default()).await;

        assert_eq!(summary.crawled, 0);
        assert!(!summary.saved);
        assert_eq!(store.load_posts().await.unwrap(), vec![post("a")]);
        assert!(notifier.mailer().sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_neither_saves_nor_sends() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp.path().join("last_posts.csv"));
        let store = CsvStorage::new(&config.state_file);
        let crawler = crawler(&config, &[("https://x/search", listing(&["a"], None))]);
        let notifier = Notifier::from_config(OutboxMailer::default(), &config);

        let summary = run_alert(&config, &crawler, &store, &notifier, RunOptions { dry_run: true }).await;

        assert_eq!(summary.new_posts, vec![post("a")]);
        assert!(!summary.saved);
        assert!(!config.state_file.exists());
        assert!(notifier.mailer().sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unusable_state_file_degrades_gracefully() {
        let tmp = TempDir::new().unwrap();
        // The state path is a directory: it can be neither read nor replaced.
        let state_dir = tmp.path().join("state.csv");
        std::fs::create_dir(&state_dir).unwrap();
        let config = config(&state_dir);
        let store = CsvStorage::new(&config.state_file);
        let crawler = crawler(&config, &[("https://x/search", listing(&["a", "b"], None))]);
        let notifier = Notifier::from_config(OutboxMailer::default(), &config);

        let summary = run_alert(&config, &crawler, &store, &notifier, RunOptions::default()).await;

        assert_eq!(summary.new_posts.len(), 2);
        assert!(!summary.saved);
        assert_eq!(summary.notification, Some(NotifyOutcome::Sent("msg_1".into())));
        assert!(!tmp.path().join("state.tmp").exists());
    }
}
