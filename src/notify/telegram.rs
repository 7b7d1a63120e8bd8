use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::notify::traits::Notifier;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Telegram Bot API channel. Messages are sent with HTML parse mode, so the
/// composer is responsible for escaping.
pub struct TelegramNotifier {
    client: Client,
    token: String,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            token: token.into(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{TELEGRAM_API_BASE}/bot{}/{method}", self.token)
    }

    /// Verify the bot token against the API before entering the polling loop.
    pub async fn check(&self) -> Result<()> {
        let response = self
            .client
            .get(self.method_url("getMe"))
            .send()
            .await
            .context("Failed to reach the Telegram API")?;

        if !response.status().is_success() {
            anyhow::bail!("Telegram getMe failed with status {}", response.status());
        }

        info!("Telegram bot token verified");
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, recipient: &str, message: &str) -> Result<()> {
        debug!("Sending notification to chat {}", recipient);

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&json!({
                "chat_id": recipient,
                "text": message,
                "parse_mode": "HTML",
                "disable_web_page_preview": true,
            }))
            .send()
            .await
            .context("Failed to send Telegram message")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Telegram sendMessage failed with status {status}: {body}");
        }

        Ok(())
    }

    fn channel_name(&self) -> &'static str {
        "Telegram"
    }
}
