//! Discord-webhook `ChatTarget` implementation.
//!
//! A thin `reqwest::Client` POST. The network call is isolated from
//! status-code classification so the two failure families (transport vs.
//! server response) are handled independently.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use super::chat_target::{ChatMessage, ChatTarget, DispatchError};

const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Serialize)]
struct DiscordEmbed {
    title: String,
    url: String,
    description: Option<String>,
    image: Option<DiscordEmbedImage>,
    footer: Option<DiscordEmbedFooter>,
}

#[derive(Debug, Serialize)]
struct DiscordEmbedImage {
    url: String,
}

#[derive(Debug, Serialize)]
struct DiscordEmbedFooter {
    text: String,
}

#[derive(Debug, Serialize)]
struct DiscordWebhookPayload {
    embeds: Vec<DiscordEmbed>,
}

impl From<&ChatMessage> for DiscordWebhookPayload {
    fn from(message: &ChatMessage) -> Self {
        let footer_text = match (&message.platform, &message.category) {
            (platform, Some(category)) => format!("{platform} · {category}"),
            (platform, None) => platform.clone(),
        };

        Self {
            embeds: vec![DiscordEmbed {
                title: message.title.clone(),
                url: message.url.clone(),
                description: message.content.clone(),
                image: message.image_url.clone().map(|url| DiscordEmbedImage { url }),
                footer: Some(DiscordEmbedFooter { text: footer_text }),
            }],
        }
    }
}

/// Dispatches [`ChatMessage`]s to a Discord-compatible incoming webhook.
#[derive(Debug, Clone)]
pub struct DiscordWebhookTarget {
    client: reqwest::Client,
    webhook_url: String,
}

impl DiscordWebhookTarget {
    #[must_use]
    pub fn new(webhook_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self { client, webhook_url }
    }
}

#[async_trait]
impl ChatTarget for DiscordWebhookTarget {
    #[instrument(skip(self, message), fields(url = %message.url))]
    async fn send(&self, message: &ChatMessage) -> Result<(), DispatchError> {
        let payload = DiscordWebhookPayload::from(message);

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    DispatchError::Transient("request timed out".to_string())
                } else {
                    DispatchError::Transient(err.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(status = status.as_u16(), "webhook dispatch succeeded");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() && status.as_u16() != 429 {
            warn!(status = status.as_u16(), body = %body, "webhook rejected message");
            Err(DispatchError::Permanent(format!("status {status}: {body}")))
        } else {
            warn!(status = status.as_u16(), body = %body, "webhook dispatch failed transiently");
            Err(DispatchError::Transient(format!("status {status}: {body}")))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message() -> ChatMessage {
        ChatMessage {
            title: "title".to_string(),
            url: "https://ytn.example/1".to_string(),
            content: Some("content".to_string()),
            image_url: None,
            category: Some("politics".to_string()),
            platform: "YTN".to_string(),
        }
    }

    #[tokio::test]
    async fn success_response_returns_ok() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let target = DiscordWebhookTarget::new(format!("{}/webhook", server.uri()));
        target.send(&message()).await.unwrap();
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let target = DiscordWebhookTarget::new(format!("{}/webhook", server.uri()));
        let err = target.send(&message()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Transient(_)));
    }

    #[tokio::test]
    async fn bad_request_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let target = DiscordWebhookTarget::new(format!("{}/webhook", server.uri()));
        let err = target.send(&message()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Permanent(_)));
    }

    #[tokio::test]
    async fn rate_limited_is_transient_not_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/webhook"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let target = DiscordWebhookTarget::new(format!("{}/webhook", server.uri()));
        let err = target.send(&message()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Transient(_)));
    }
}
