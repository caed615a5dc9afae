//! Telegram Bot API channel.

use crate::dispatch::NotificationChannel;
use crate::error::{NotifyError, Result};
use async_trait::async_trait;
use nipscan_core::TelegramConfig;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends messages to one chat through a bot token.
pub struct TelegramChannel {
    client: Client,
    url: String,
    chat_id: String,
}

impl TelegramChannel {
    /// Build a channel from configuration.
    ///
    /// Returns [`NotifyError::Disabled`] unless both token and chat id are set.
    pub fn from_config(config: &TelegramConfig) -> Result<Self> {
        let (Some(token), Some(chat_id)) = (&config.token, &config.chat_id) else {
            return Err(NotifyError::Disabled);
        };
        if !config.is_configured() {
            return Err(NotifyError::Disabled);
        }

        let client = Client::builder().timeout(SEND_TIMEOUT).build()?;
        let url = format!(
            "{}/bot{}/sendMessage",
            config.api_base.trim_end_matches('/'),
            urlencoding::encode(token)
        );

        Ok(Self {
            client,
            url,
            chat_id: chat_id.clone(),
        })
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
}

#[async_trait]
impl NotificationChannel for TelegramChannel {
    async fn send(&self, text: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text,
                parse_mode: "HTML",
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}
