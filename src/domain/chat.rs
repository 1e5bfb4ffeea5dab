use serde::{Deserialize, Serialize};
use std::fmt;

/// Transport-assigned chat identifier.
pub type ChatId = i64;

/// Which storage partition a chat belongs to.
///
/// Resolved once by the transport when an update arrives and carried alongside
/// the identifier from then on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Direct,
    Group,
}

impl ChatKind {
    /// Maps a Telegram `chat.type` value onto a partition.
    pub fn from_chat_type(chat_type: &str) -> Self {
        match chat_type {
            "private" => ChatKind::Direct,
            _ => ChatKind::Group,
        }
    }
}

/// A chat identifier paired with its partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatRef {
    pub id: ChatId,
    pub kind: ChatKind,
}

impl ChatRef {
    pub fn direct(id: ChatId) -> Self {
        Self {
            id,
            kind: ChatKind::Direct,
        }
    }

    pub fn group(id: ChatId) -> Self {
        Self {
            id,
            kind: ChatKind::Group,
        }
    }
}

impl fmt::Display for ChatRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ChatKind::Direct => write!(f, "direct:{}", self.id),
            ChatKind::Group => write!(f, "group:{}", self.id),
        }
    }
}
