//! Storage abstractions for the previous run's posts.
//!
//! Each run overwrites the stored snapshot with everything it crawled, so the
//! store always reflects the listing as last seen:
//!
//! ```text
//! title,link,date
//! Half price socks,https://deals.example.com/node/1,alice on 19/10/2026 - 09:15
//! ```

pub mod local;

use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Post;

// Re-export for convenience
pub use local::CsvStorage;

/// Trait for post snapshot backends.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Load every stored post. A missing snapshot is an empty list.
    async fn load_posts(&self) -> Result<Vec<Post>>;

    /// Load the links of the stored posts.
    async fn load_seen_links(&self) -> Result<HashSet<String>> {
        let posts = self.load_posts().await?;
        Ok(posts.into_iter().map(|p| p.link).collect())
    }

    /// Replace the stored snapshot with `posts`.
    async fn save_current(&self, posts: &[Post]) -> Result<()>;
}
