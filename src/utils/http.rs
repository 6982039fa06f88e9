// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;
use crate::services::PageFetcher;

/// Create a configured asynchronous HTTP client.
pub fn create_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a page and return its body, treating non-2xx statuses as errors.
pub async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::fetch(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::fetch(url, format!("HTTP status {status}")));
    }

    response.text().await.map_err(|e| AppError::fetch(url, e))
}

/// Page fetcher backed by a real HTTP client. One attempt per page.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build a fetcher with its own client from crawler settings.
    pub fn from_config(config: &CrawlerConfig) -> Result<Self> {
        Ok(Self::new(create_client(config)?))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        fetch_page(&self.client, url).await
    }
}
