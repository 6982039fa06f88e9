// src/services/crawler.rs

//! Listing crawler service.
//!
//! Follows the listing's "next page" link from a seed URL, accumulating a
//! single deduplicated collection of posts.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Config, Post};
use crate::services::PageExtractor;

/// Source of listing page markup.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the markup at `url`. Any error ends the crawl.
    async fn fetch(&self, url: &str) -> Result<String>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for &T {
    async fn fetch(&self, url: &str) -> Result<String> {
        (**self).fetch(url).await
    }
}

/// Why a crawl stopped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CrawlStop {
    /// The last page had no next-page link
    #[default]
    Exhausted,
    /// A page could not be fetched; earlier pages are kept
    FetchFailed { url: String, error: String },
    /// The page limit was reached before pagination ended
    PageLimit,
    /// The next-page link pointed at a page already visited
    Cycle { url: String },
}

/// Summary of a crawl run.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    pub posts: Vec<Post>,
    pub pages_fetched: usize,
    pub duplicates_dropped: usize,
    pub stop: CrawlStop,
}

/// Service for walking every page of a listing.
pub struct Crawler<F> {
    fetcher: F,
    extractor: PageExtractor,
    base_url: String,
    delay: Duration,
    max_pages: usize,
}

impl<F: PageFetcher> Crawler<F> {
    pub fn new(
        fetcher: F,
        extractor: PageExtractor,
        base_url: impl Into<String>,
        delay: Duration,
        max_pages: usize,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            base_url: base_url.into(),
            delay,
            max_pages: max_pages.max(1),
        }
    }

    /// Create a crawler using the delay, page limit and base URL from config.
    pub fn from_config(fetcher: F, extractor: PageExtractor, config: &Config) -> Self {
        Self::new(
            fetcher,
            extractor,
            &config.base_url,
            Duration::from_millis(config.crawler.request_delay_ms),
            config.crawler.max_pages,
        )
    }

    /// Crawl from `seed_url` until pagination ends or a fetch fails.
    ///
    /// Posts keep page order then in-page order; a link seen earlier in the
    /// same crawl is dropped.
    pub async fn crawl(&self, seed_url: &str) -> CrawlOutcome {
        let mut outcome = CrawlOutcome::default();
        let mut seen_links = HashSet::new();
        let mut visited = HashSet::new();
        let mut next_url = Some(seed_url.to_string());

        while let Some(url) = next_url.take() {
            if outcome.pages_fetched >= self.max_pages {
                log::warn!(
                    "Page limit ({}) reached, not following {}",
                    self.max_pages,
                    url
                );
                outcome.stop = CrawlStop::PageLimit;
                break;
            }
            if !visited.insert(url.clone()) {
                log::warn!("Next page link loops back to {}, stopping", url);
                outcome.stop = CrawlStop::Cycle { url };
                break;
            }

            if outcome.pages_fetched > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            log::info!("Scraping page: {}", url);
            let markup = match self.fetcher.fetch(&url).await {
                Ok(markup) => markup,
                Err(error) => {
                    log::warn!("Error fetching URL {}: {}", url, error);
                    outcome.stop = CrawlStop::FetchFailed {
                        url,
                        error: error.to_string(),
                    };
                    break;
                }
            };
            outcome.pages_fetched += 1;

            let page = self.extractor.extract(&markup, &self.base_url);
            log::debug!("{} entries on {}", page.posts.len(), url);

            for post in page.posts {
                if seen_links.insert(post.link.clone()) {
                    outcome.posts.push(post);
                } else {
                    outcome.duplicates_dropped += 1;
                }
            }

            next_url = page.next_page_url;
        }

        outcome
    }
}
