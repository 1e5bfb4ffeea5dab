use crate::domain::chat::{ChatId, ChatKind, ChatRef};
use crate::domain::ports::{Choice, NotificationSink};
use crate::error::{Result, TrackerError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Seconds a `getUpdates` call may hold the connection open.
pub const LONG_POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    #[serde(rename = "type")]
    pub chat_type: String,
}

impl Chat {
    pub fn chat_ref(&self) -> ChatRef {
        ChatRef {
            id: self.id,
            kind: ChatKind::from_chat_type(&self.chat_type),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Serialize)]
struct InlineKeyboardButton<'a> {
    text: &'a str,
    callback_data: &'a str,
}

#[derive(Debug, Serialize)]
struct InlineKeyboardMarkup<'a> {
    inline_keyboard: Vec<Vec<InlineKeyboardButton<'a>>>,
}

/// Minimal Telegram Bot API client.
#[derive(Clone)]
pub struct TelegramClient {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(api_url: &str, bot_token: &str, request_timeout: Duration) -> Result<Self> {
        // Long polling holds the request open, so the timeout must outlast it.
        let timeout = request_timeout + Duration::from_secs(LONG_POLL_TIMEOUT_SECS);
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_url.trim_end_matches('/'), bot_token),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: serde_json::Value) -> Result<T> {
        let url = format!("{}/{}", self.base_url, method);
        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        let envelope: ApiResponse<T> = response.json().await?;
        if !envelope.ok {
            return Err(TrackerError::DeliveryError(format!(
                "{} failed with HTTP {}: {}",
                method,
                status,
                envelope.description.unwrap_or_default()
            )));
        }
        envelope
            .result
            .ok_or_else(|| TrackerError::DeliveryError(format!("{} returned no result", method)))
    }

    /// Fetches updates after `offset`, waiting up to the long-poll timeout.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": LONG_POLL_TIMEOUT_SECS,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }

    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<()> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                json!({ "callback_query_id": callback_query_id }),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for TelegramClient {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call("sendMessage", json!({ "chat_id": chat_id, "text": text }))
            .await?;
        Ok(())
    }

    async fn send_image(&self, chat_id: ChatId, image: &str, caption: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call(
                "sendPhoto",
                json!({ "chat_id": chat_id, "photo": image, "caption": caption }),
            )
            .await?;
        Ok(())
    }

    async fn send_choices(&self, chat_id: ChatId, text: &str, choices: &[Choice]) -> Result<()> {
        let markup = InlineKeyboardMarkup {
            inline_keyboard: choices
                .iter()
                .map(|choice| {
                    vec![InlineKeyboardButton {
                        text: &choice.label,
                        callback_data: &choice.action,
                    }]
                })
                .collect(),
        };
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                json!({ "chat_id": chat_id, "text": text, "reply_markup": markup }),
            )
            .await?;
        Ok(())
    }
}
