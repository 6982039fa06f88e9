//! Service layer for the alert job.
//!
//! This module contains the business logic for:
//! - Listing page extraction (`PageExtractor`)
//! - Pagination-following crawling (`Crawler`)
//! - Alert rendering and dispatch (`Notifier`, `Mailer`)

mod crawler;
mod extract;
mod mailer;
mod notifier;

pub use crawler::{CrawlOutcome, CrawlStop, Crawler, PageFetcher};
pub use extract::{ExtractedPage, PageExtractor};
pub use mailer::{Email, Mailer, ResendMailer};
pub use notifier::{Notifier, NotifyOutcome};
