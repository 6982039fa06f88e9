//! Outbound email transport.
//!
//! The notifier only needs "send this email, give me a message id". The
//! production transport is the Resend HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::MailConfig;

/// A rendered email ready to dispatch.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Email {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// Email transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Whether the transport has what it needs to send (e.g. a credential).
    fn is_configured(&self) -> bool;

    /// Send one email and return the provider's message id.
    async fn send(&self, email: &Email) -> Result<String>;
}

#[async_trait]
impl<T: Mailer + ?Sized> Mailer for &T {
    fn is_configured(&self) -> bool {
        (**self).is_configured()
    }

    async fn send(&self, email: &Email) -> Result<String> {
        (**self).send(email).await
    }
}

#[derive(Deserialize)]
struct SendResponse {
    id: String,
}

/// Mailer backed by the Resend `POST /emails` endpoint.
pub struct ResendMailer {
    client: Client,
    api_url: String,
    api_key: String,
}

impl ResendMailer {
    /// Create a mailer with its own HTTP client.
    pub fn new(config: &MailConfig, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &MailConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn send(&self, email: &Email) -> Result<String> {
        let res = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::notify(format!("Resend API error {status}: {body}")));
        }

        let response: SendResponse = res.json().await?;
        Ok(response.id)
    }
}
