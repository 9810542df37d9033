//! Order notifications over a push webhook

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::NotificationConfig;
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationOutcome {
    Sent,
    /// No endpoint configured
    Skipped,
}

/// Delivers a rendered order summary to the operator
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    async fn notify(&self, title: &str, body: &str) -> AppResult<NotificationOutcome>;
}

/// Posts `title` and `desp` as an `application/x-www-form-urlencoded` body
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    endpoint: Option<String>,
}

impl WebhookNotifier {
    pub fn new(client: Client, endpoint: Option<String>) -> Self {
        let endpoint = endpoint.filter(|e| !e.trim().is_empty());
        Self { client, endpoint }
    }

    pub fn from_config(client: Client, config: &NotificationConfig) -> Self {
        Self::new(client, config.webhook_url.clone())
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }
}

#[async_trait]
impl OrderNotifier for WebhookNotifier {
    async fn notify(&self, title: &str, body: &str) -> AppResult<NotificationOutcome> {
        let Some(endpoint) = &self.endpoint else {
            debug!("No notification endpoint configured, skipping");
            return Ok(NotificationOutcome::Skipped);
        };

        let response = self
            .client
            .post(endpoint)
            .form(&[("title", title), ("desp", body)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::internal(format!(
                "notification endpoint returned {status}"
            )));
        }
        info!("Order notification sent");
        Ok(NotificationOutcome::Sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_endpoint_is_skipped() {
        let notifier = WebhookNotifier::new(Client::new(), None);
        assert!(!notifier.is_configured());
        assert_eq!(
            notifier.notify("title", "body").await.unwrap(),
            NotificationOutcome::Skipped
        );

        let blank = WebhookNotifier::new(Client::new(), Some("  ".into()));
        assert!(!blank.is_configured());
    }
}
