//! Application configuration structures.
//!
//! Settings come from environment-style key/value pairs and are captured
//! once into an immutable [`Config`] that is handed to each component.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use url::Url;

use crate::error::{AppError, Result};

/// Keys that must be present (and non-empty) for the job to start.
pub const REQUIRED_KEYS: [&str; 6] = [
    "URL",
    "LAST_POSTS_FILE",
    "SENDER_EMAIL",
    "RECIPIENT_EMAIL",
    "TITLE",
    "RESEND_API_KEY",
];

/// Root application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listing page the crawl starts from
    pub listing_url: String,

    /// Prefix for root-relative links found on the listing
    pub base_url: String,

    /// CSV file holding the previous run's posts
    pub state_file: PathBuf,

    /// Human-readable label used in log lines and email subjects
    pub campaign: String,

    /// HTTP and crawling behavior settings
    pub crawler: CrawlerConfig,

    /// Email transport settings
    pub mail: MailConfig,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unset and blank values are both treated as missing. Every missing
    /// required key is reported at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut values = HashMap::new();
        let mut missing = Vec::new();
        for key in REQUIRED_KEYS {
            match get(key) {
                Some(value) => {
                    values.insert(key, value);
                }
                None => missing.push(key.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(AppError::MissingConfig(missing));
        }
        let mut take = |key: &str| values.remove(key).unwrap_or_default();

        let listing_url = take("URL");
        let parsed = Url::parse(&listing_url)
            .map_err(|e| AppError::config(format!("URL '{listing_url}' is invalid: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::config(format!(
                "URL '{listing_url}' must use http or https"
            )));
        }

        let base_url = get("BASE_URL")
            .unwrap_or_else(|| parsed.origin().ascii_serialization())
            .trim_end_matches('/')
            .to_string();

        let crawler = CrawlerConfig {
            user_agent: get("USER_AGENT").unwrap_or_else(defaults::user_agent),
            timeout_secs: parse_or(&get, "REQUEST_TIMEOUT_SECS", defaults::timeout())?,
            request_delay_ms: parse_or(&get, "PAGE_DELAY_MS", defaults::request_delay())?,
            max_pages: parse_or(&get, "MAX_PAGES", defaults::max_pages())?,
        };

        let mail = MailConfig {
            sender: take("SENDER_EMAIL"),
            recipient: take("RECIPIENT_EMAIL"),
            api_key: take("RESEND_API_KEY"),
            api_url: get("RESEND_API_URL").unwrap_or_else(defaults::resend_api_url),
        };

        let config = Self {
            listing_url,
            base_url,
            state_file: PathBuf::from(take("LAST_POSTS_FILE")),
            campaign: take("TITLE"),
            crawler,
            mail,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::config("USER_AGENT is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::config("REQUEST_TIMEOUT_SECS must be > 0"));
        }
        if self.crawler.max_pages == 0 {
            return Err(AppError::config("MAX_PAGES must be > 0"));
        }
        Ok(())
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::config(format!("{key}='{raw}' is invalid: {e}"))),
        None => Ok(default),
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    pub user_agent: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Delay between page fetches in milliseconds
    pub request_delay_ms: u64,

    /// Upper bound on pages fetched in one crawl
    pub max_pages: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_pages: defaults::max_pages(),
        }
    }
}

/// Email transport settings.
#[derive(Clone)]
pub struct MailConfig {
    pub sender: String,
    pub recipient: String,
    pub api_key: String,
    pub api_url: String,
}

impl fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailConfig")
            .field("sender", &self.sender)
            .field("recipient", &self.recipient)
            .field("api_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish()
    }
}

mod defaults {
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
            .to_string()
    }

    pub fn timeout() -> u64 {
        15
    }

    pub fn request_delay() -> u64 {
        1000
    }

    pub fn max_pages() -> usize {
        50
    }

    pub fn resend_api_url() -> String {
        "https://api.resend.com/emails".to_string()
    }
}
