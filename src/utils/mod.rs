//! Utility functions and helpers.

pub mod http;

/// Turn a listing href into an absolute link.
///
/// Root-relative hrefs (`/node/123`) are prefixed with the site's base URL;
/// anything else is assumed to be absolute already and returned unchanged.
pub fn resolve_link(base_url: &str, href: &str) -> String {
    if href.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), href)
    } else {
        href.to_string()
    }
}
