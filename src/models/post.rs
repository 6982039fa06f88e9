//! Post data structure.

use serde::{Deserialize, Serialize};

/// A single entry scraped from the listing.
///
/// `link` is the identity key: two posts with the same link are the same
/// post no matter what their title or date say. Crawl dedup and the diff
/// compare links only; the derived equality compares every field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    /// Post title as displayed on the listing
    pub title: String,

    /// Absolute URL to the post
    pub link: String,

    /// Free-form date text (empty if the listing did not show one)
    #[serde(default)]
    pub date: String,
}

impl Post {
    pub fn new(title: impl Into<String>, link: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            date: date.into(),
        }
    }

    /// Format post for display using a template.
    ///
    /// Supported placeholders: `{title}`, `{date}`, `{link}`
    pub fn format(&self, template: &str) -> String {
        template
            .replace("{title}", &self.title)
            .replace("{date}", &self.date)
            .replace("{link}", &self.link)
    }
}
