// src/services/extract.rs

//! Listing page extraction.
//!
//! Turns one page of listing markup into ordered posts plus the absolute URL
//! of the next page, if the pager offers one.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{ListingSelectors, Post};
use crate::utils::resolve_link;

/// Posts and pagination found on a single listing page.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Posts in document order (may contain within-page duplicates)
    pub posts: Vec<Post>,

    /// Absolute URL of the next page, `None` on the last page
    pub next_page_url: Option<String>,

    /// Whether the fallback selector had to be used
    pub used_fallback: bool,
}

/// Extracts posts from listing markup using precompiled selectors.
#[derive(Debug)]
pub struct PageExtractor {
    primary: Selector,
    fallback: Selector,
    meta: Selector,
    next_page: Selector,
    row_element: String,
    meta_row_element: String,
    attr_name: String,
}

impl PageExtractor {
    /// Compile the given selectors.
    pub fn new(selectors: &ListingSelectors) -> Result<Self> {
        Ok(Self {
            primary: Self::parse_selector(&selectors.primary_selector)?,
            fallback: Self::parse_selector(&selectors.fallback_selector)?,
            meta: Self::parse_selector(&selectors.meta_selector)?,
            next_page: Self::parse_selector(&selectors.next_page_selector)?,
            row_element: selectors.row_element.to_ascii_lowercase(),
            meta_row_element: selectors.meta_row_element.to_ascii_lowercase(),
            attr_name: selectors.attr_name.clone(),
        })
    }

    /// Extract posts and the next page link from one page of markup.
    ///
    /// Root-relative links are resolved against `base_url`.
    pub fn extract(&self, markup: &str, base_url: &str) -> ExtractedPage {
        let document = Html::parse_document(markup);

        let mut anchors: Vec<ElementRef> = document.select(&self.primary).collect();
        let used_fallback = anchors.is_empty();
        if used_fallback {
            anchors = document.select(&self.fallback).collect();
            if !anchors.is_empty() {
                log::debug!(
                    "Primary selector matched nothing, fallback found {} entries",
                    anchors.len()
                );
            }
        }

        let posts = anchors
            .into_iter()
            .filter_map(|anchor| self.parse_entry(anchor, base_url))
            .collect();

        ExtractedPage {
            posts,
            next_page_url: self.find_next_page(&document, base_url),
            used_fallback,
        }
    }

    fn parse_entry(&self, anchor: ElementRef, base_url: &str) -> Option<Post> {
        let href = anchor.value().attr(&self.attr_name).unwrap_or("").trim();
        let title = joined_text(anchor, " ");
        if href.is_empty() || title.is_empty() {
            return None;
        }

        Some(Post {
            title,
            link: resolve_link(base_url, href),
            date: self.find_date(anchor).unwrap_or_default(),
        })
    }

    /// Walk anchor -> enclosing row -> following metadata row -> meta element.
    fn find_date(&self, anchor: ElementRef) -> Option<String> {
        let row = anchor
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == self.row_element)?;

        // Stop at the next row so one entry never borrows another's metadata.
        // Stop at the next entry row: an entry without its own meta row gets
        // no date rather than the following entry's.
        let meta_row = row
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .take_while(|el| el.value().name() != self.row_element)
            .find(|el| el.value().name() == self.meta_row_element)?;

        let meta = meta_row.select(&self.meta).next()?;
        Some(joined_text(meta, ""))
    }

    fn find_next_page(&self, document: &Html, base_url: &str) -> Option<String> {
        let href = document
            .select(&self.next_page)
            .next()?
            .value()
            .attr(&self.attr_name)?
            .trim();

        if href.is_empty() {
            None
        } else {
            Some(resolve_link(base_url, href))
        }
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

/// Trimmed, non-empty text fragments of an element joined by `sep`.
fn joined_text(element: ElementRef, sep: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}
