// src/models/mod.rs

//! Domain models for the alert job.

mod config;
mod post;
mod selectors;

// Re-export all public types
pub use config::{Config, CrawlerConfig, MailConfig};
pub use post::Post;
pub use selectors::ListingSelectors;
