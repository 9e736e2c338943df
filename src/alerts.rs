//! alerts.rs - Optional notification hook for detected opportunities
//!
//! Sinks receive a plain text summary. Delivery is fire-and-forget from the
//! scanner's point of view; errors here never reach a scan result.

use async_trait::async_trait;
use log::info;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn notify(&self, message: &str) -> anyhow::Result<()>;
}

/// Writes alerts to the log
#[derive(Debug, Clone, Default)]
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn notify(&self, message: &str) -> anyhow::Result<()> {
        info!("🚨 {}", message);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

/// POSTs `{"text": message}` to a chat-style incoming webhook
#[derive(Debug, Clone)]
pub struct WebhookAlertSink {
    client: Client,
    url: String,
}

impl WebhookAlertSink {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(WebhookAlertSink {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl AlertSink for WebhookAlertSink {
    async fn notify(&self, message: &str) -> anyhow::Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&WebhookPayload { text: message })
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("webhook returned status {}", response.status());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_sink_never_fails() {
        assert!(LogAlertSink.notify("BTC/USDT: test").await.is_ok());
    }

    #[test]
    fn test_webhook_payload_shape() {
        let json = serde_json::to_string(&WebhookPayload { text: "hello" }).unwrap();
        assert_eq!(json, r#"{"text":"hello"}"#);
    }

    #[tokio::test]
    async fn test_webhook_unreachable_is_error() {
        let sink = WebhookAlertSink::new("http://127.0.0.1:9/hook", Duration::from_millis(500)).unwrap();
        assert!(sink.notify("ping").await.is_err());
    }
}
