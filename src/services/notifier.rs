// src/services/notifier.rs

//! New-post notification service.

use std::fmt::Write as _;

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::models::{Config, Post};
use crate::services::{Email, Mailer};

/// What happened when a notification was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Sent; carries the provider's message id
    Sent(String),
    /// Nothing was sent, deliberately
    Skipped(String),
    /// The transport failed; the error was logged and swallowed
    Failed(String),
}

/// Renders new posts into one email and dispatches it.
pub struct Notifier<M> {
    mailer: M,
    campaign: String,
    sender: String,
    recipient: String,
}

impl<M: Mailer> Notifier<M> {
    pub fn new(
        mailer: M,
        campaign: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            mailer,
            campaign: campaign.into(),
            sender: sender.into(),
            recipient: recipient.into(),
        }
    }

    pub fn from_config(mailer: M, config: &Config) -> Self {
        Self::new(
            mailer,
            &config.campaign,
            &config.mail.sender,
            &config.mail.recipient,
        )
    }

    pub fn mailer(&self) -> &M {
        &self.mailer
    }

    /// Build the alert email for `posts`, keeping their order.
    pub fn render(&self, posts: &[Post]) -> Email {
        let campaign = encode_text(&self.campaign);
        let mut html = format!("<h1>New Deals Found: {campaign}</h1>");
        for post in posts {
            let _ = write!(
                html,
                "\n<p>\n    title: {}<br>\n    date: {}<br>\n    link: <a href=\"{}\">{}</a>\n</p>\n<hr>",
                encode_text(&post.title),
                encode_text(&post.date),
                encode_double_quoted_attribute(&post.link),
                encode_text(&post.link),
            );
        }

        Email {
            from: self.sender.clone(),
            to: vec![self.recipient.clone()],
            subject: format!(
                "🚨 {} Alert: {} New Posts Found",
                self.campaign,
                posts.len()
            ),
            html,
        }
    }

    /// Send one alert covering every post in `posts`.
    ///
    /// Never fails: a missing credential or an empty list is a skip, and a
    /// transport error is logged and reported as [`NotifyOutcome::Failed`].
    pub async fn notify(&self, posts: &[Post]) -> NotifyOutcome {
        if posts.is_empty() {
            return NotifyOutcome::Skipped("no new posts".to_string());
        }
        if !self.mailer.is_configured() {
            log::error!("Email transport is not configured. Cannot send email.");
            return NotifyOutcome::Skipped("transport not configured".to_string());
        }

        let email = self.render(posts);
        match self.mailer.send(&email).await {
            Ok(id) => {
                log::info!("Email sent. ID: {}", id);
                NotifyOutcome::Sent(id)
            }
            Err(e) => {
                log::error!("Error sending alert email: {}", e);
                NotifyOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::{AppError, Result};

    struct RecordingMailer {
        configured: bool,
        fail: bool,
        sent: Mutex<Vec<Email>>,
    }

    impl RecordingMailer {
        fn new(configured: bool, fail: bool) -> Self {
            Self {
                configured,
                fail,
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn send(&self, email: &Email) -> Result<String> {
            self.sent.lock().unwrap().push(email.clone());
            if self.fail {
                Err(AppError::notify("Resend API error 422: invalid from"))
            } else {
                Ok("msg_123".to_string())
            }
        }
    }

    fn posts() -> Vec<Post> {
        vec![
            Post::new("Socks & Shoes", "https://deals.example.com/node/2", "on 19/10"),
            Post::new("Hats", "https://deals.example.com/node/3", ""),
        ]
    }

    fn notifier(mailer: RecordingMailer) -> Notifier<RecordingMailer> {
        Notifier::new(mailer, "Apparel", "alerts@example.com", "me@example.com")
    }

    #[test]
    fn test_render_subject_and_order() {
        let email = notifier(RecordingMailer::new(true, false)).render(&posts());

        assert_eq!(email.subject, "🚨 Apparel Alert: 2 New Posts Found");
        assert_eq!(email.from, "alerts@example.com");
        assert_eq!(email.to, vec!["me@example.com"]);
        assert!(email.html.starts_with("<h1>New Deals Found: Apparel</h1>"));

        let first = email.html.find("node/2").unwrap();
        let second = email.html.find("node/3").unwrap();
        assert!(first < second);
        assert_eq!(email.html.matches("<hr>").count(), 2);
    }

    #[test]
    fn test_render_escapes_titles() {
        let email = notifier(RecordingMailer::new(true, false)).render(&posts());
        assert!(email.html.contains("title: Socks &amp; Shoes<br>"));
        assert!(email.html.contains("date: on 19/10<br>"));
    }

    #[tokio::test]
    async fn test_notify_sends_once() {
        let notifier = notifier(RecordingMailer::new(true, false));
        let outcome = notifier.notify(&posts()).await;

        assert_eq!(outcome, NotifyOutcome::Sent("msg_123".to_string()));
        assert_eq!(notifier.mailer.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_notify_skips_when_unconfigured() {
        let notifier = notifier(RecordingMailer::new(false, false));
        let outcome = notifier.notify(&posts()).await;

        assert!(matches!(outcome, NotifyOutcome::Skipped(_)));
        assert!(notifier.mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notify_skips_empty_list() {
        let notifier = notifier(RecordingMailer::new(true, false));
        assert!(matches!(notifier.notify(&[]).await, NotifyOutcome::Skipped(_)));
        assert!(notifier.mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_swallowed() {
        let notifier = notifier(RecordingMailer::new(true, true));
        let outcome = notifier.notify(&posts()).await;
        assert!(matches!(outcome, NotifyOutcome::Failed(msg) if msg.contains("422")));
    }
}
