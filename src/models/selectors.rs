// src/models/selectors.rs

//! CSS selectors for scraping a deals listing page.

use serde::{Deserialize, Serialize};

/// CSS selectors for scraping a deals listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSelectors {
    /// Selector for the post anchors inside the results block
    pub primary_selector: String,

    /// Looser selector tried when the primary one matches nothing
    pub fallback_selector: String,

    /// Element name of the row that wraps a post anchor
    pub row_element: String,

    /// Element name of the sibling row carrying the post metadata
    pub meta_row_element: String,

    /// Selector for the metadata (date) element within the sibling row
    pub meta_selector: String,

    /// Selector for the pager's "next page" anchor
    pub next_page_selector: String,

    /// HTML attribute name for extracting links (usually "href")
    #[serde(default = "default_attr_name")]
    pub attr_name: String,
}

fn default_attr_name() -> String {
    "href".to_string()
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            primary_selector: "dl.search-results dt.title a".to_string(),
            fallback_selector: "dt.title a".to_string(),
            row_element: "dt".to_string(),
            meta_row_element: "dd".to_string(),
            meta_selector: "span.meta".to_string(),
            next_page_selector: r#"li a[title="Go to next page"]"#.to_string(),
            attr_name: default_attr_name(),
        }
    }
}
