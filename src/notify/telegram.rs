//! Telegram Bot API transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::notify::Notifier;

/// Long-poll window for `getUpdates`, in seconds.
const UPDATES_POLL_SECS: u64 = 30;

/// Notifier backed by the Telegram Bot API.
pub struct TelegramNotifier {
    client: Client,
    token: String,
}

/// Envelope shared by Bot API responses.
#[derive(Debug, Deserialize)]
struct ApiStatus {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdatesResponse {
    ok: bool,
    #[serde(default)]
    result: Vec<Update>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
struct IncomingMessage {
    chat: Chat,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

impl TelegramNotifier {
    pub fn new(client: Client, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.token, method)
    }

    /// Long-poll `getUpdates` and print the chat ID of every incoming
    /// message. Operator helper for collecting `telegram.chat_ids` values;
    /// runs until the process is killed.
    pub async fn print_chat_ids(&self) -> Result<()> {
        // Clear any webhook and stale updates so polling starts fresh.
        self.client
            .post(self.api_url("deleteWebhook"))
            .json(&json!({ "drop_pending_updates": true }))
            .send()
            .await?
            .error_for_status()?;

        println!("Waiting for messages...");
        let mut offset: i64 = 0;

        loop {
            let response: UpdatesResponse = self
                .client
                .get(self.api_url("getUpdates"))
                .query(&[
                    ("offset", offset.to_string()),
                    ("timeout", UPDATES_POLL_SECS.to_string()),
                ])
                // The request must outlive the server-side long-poll window.
                .timeout(Duration::from_secs(UPDATES_POLL_SECS + 10))
                .send()
                .await?
                .json()
                .await?;

            if !response.ok {
                return Err(AppError::snapshot("getUpdates returned ok=false"));
            }

            for update in response.result {
                if let Some(message) = update.message {
                    println!("Chat ID: {}", message.chat.id);
                    println!("Text: {}", message.text.unwrap_or_default());
                }
                offset = update.update_id + 1;
            }
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, chat_id: &str, text: &str) -> Result<()> {
        let chat_id = chat_id.trim();

        let response = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
            .map_err(|e| AppError::delivery(chat_id, e))?;

        let status: ApiStatus = response
            .json()
            .await
            .map_err(|e| AppError::delivery(chat_id, e))?;

        if !status.ok {
            return Err(AppError::delivery(
                chat_id,
                status
                    .description
                    .unwrap_or_else(|| "sendMessage returned ok=false".to_string()),
            ));
        }

        Ok(())
    }
}
