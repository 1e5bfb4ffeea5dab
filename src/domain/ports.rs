use super::chat::{ChatId, ChatRef};
use super::tracking::{ChatTrackingSet, TokenSnapshot};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Looks up the current payment status of a token.
#[async_trait]
pub trait StatusProvider: Send + Sync {
    /// Fails only when the primary record lookup cannot be completed.
    async fn fetch_status(&self, address: &str) -> Result<TokenSnapshot>;
    /// First available header image, `None` on any failure.
    async fn fetch_image(&self, address: &str) -> Option<String>;
}

/// Durable per-chat tracking sets, partitioned by chat kind.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Returns an empty set for chats that were never stored.
    async fn load(&self, chat: ChatRef) -> Result<ChatTrackingSet>;
    async fn save(&self, chat: ChatRef, set: &ChatTrackingSet) -> Result<()>;
    async fn remove(&self, chat: ChatRef) -> Result<()>;
    async fn all(&self) -> Result<Vec<(ChatRef, ChatTrackingSet)>>;
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// An inline choice attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub action: String,
}

/// Outbound side of the chat transport.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()>;
    async fn send_image(&self, chat_id: ChatId, image: &str, caption: &str) -> Result<()>;
    async fn send_choices(&self, chat_id: ChatId, text: &str, choices: &[Choice]) -> Result<()>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub type ChatStoreBox = Box<dyn ChatStore>;
pub type StatusProviderBox = Box<dyn StatusProvider>;
