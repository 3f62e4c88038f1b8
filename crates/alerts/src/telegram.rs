//! Telegram Bot API notifier.

use crate::notifier::{Notifier, NotifyError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

/// Sends messages through `sendMessage` on the Telegram Bot API.
pub struct TelegramNotifier {
    http_client: reqwest::Client,
    base_url: String,
    bot_token: String,
    chat_id: String,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("base_url", &self.base_url)
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl TelegramNotifier {
    const BASE_URL: &'static str = "https://api.telegram.org";

    /// Create a notifier; every request is bounded by `timeout`.
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>, timeout: Duration) -> Self {
        Self::with_base_url(Self::BASE_URL, bot_token, chat_id, timeout)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client,
            base_url: base_url.into(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into().trim().to_string(),
        }
    }

    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.base_url, self.bot_token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let params = [
            ("chat_id", self.chat_id.as_str()),
            ("text", message),
            ("disable_web_page_preview", "true"),
        ];

        let response = self
            .http_client
            .post(self.endpoint())
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "Telegram API returned non-success status");
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
