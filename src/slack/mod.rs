use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const SLACK_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Destination for status lines.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn post(&self, text: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Clone)]
pub struct SlackNotifier {
    client: Client,
    token: String,
    channel: String,
    url: String,
}

impl SlackNotifier {
    pub fn new(token: String, channel: String) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .context("Failed to create HTTP client")?,
            token,
            channel,
            url: SLACK_POST_MESSAGE_URL.to_string(),
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub async fn send_message(&self, message: &str) -> Result<()> {
        let response: SlackResponse = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&json!({
                "channel": self.channel,
                "text": message,
            }))
            .send()
            .await
            .context("Slack request failed")?
            .json()
            .await
            .context("Unexpected Slack response")?;

        if !response.ok {
            bail!(
                "Slack rejected message: {}",
                response.error.as_deref().unwrap_or("unknown error")
            );
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn post(&self, text: &str) -> Result<()> {
        self.send_message(text).await
    }
}

pub fn startup_message(pair: &str, price: &str, up_percent: &str, down_percent: &str) -> String {
    format!(
        "Bot started | {}: {} | Up Momentum: {}% | Down Momentum: {}% | Looking for entry....",
        pair, price, up_percent, down_percent
    )
}

pub fn shutdown_message(pair: &str, state: &str) -> String {
    format!("Bot stopped | {} | State: {}", pair, state)
}
