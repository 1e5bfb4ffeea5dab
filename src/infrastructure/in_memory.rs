use crate::domain::chat::{ChatId, ChatKind, ChatRef};
use crate::domain::ports::ChatStore;
use crate::domain::tracking::ChatTrackingSet;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory chat store.
///
/// Group and direct chats live in separate maps, mirroring the persistent
/// partitions. Contents are lost on restart.
#[derive(Default, Clone)]
pub struct InMemoryChatStore {
    partitions: Arc<RwLock<HashMap<ChatKind, HashMap<ChatId, ChatTrackingSet>>>>,
}

impl InMemoryChatStore {
    /// Creates a new, empty in-memory chat store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatStore for InMemoryChatStore {
    async fn load(&self, chat: ChatRef) -> Result<ChatTrackingSet> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .get(&chat.kind)
            .and_then(|p| p.get(&chat.id))
            .cloned()
            .unwrap_or_default())
    }

    async fn save(&self, chat: ChatRef, set: &ChatTrackingSet) -> Result<()> {
        let mut partitions = self.partitions.write().await;
        partitions
            .entry(chat.kind)
            .or_default()
            .insert(chat.id, set.clone());
        Ok(())
    }

    async fn remove(&self, chat: ChatRef) -> Result<()> {
        let mut partitions = self.partitions.write().await;
        if let Some(partition) = partitions.get_mut(&chat.kind) {
            partition.remove(&chat.id);
        }
        Ok(())
    }

    async fn all(&self) -> Result<Vec<(ChatRef, ChatTrackingSet)>> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .iter()
            .flat_map(|(kind, partition)| {
                partition.iter().map(|(id, set)| {
                    (
                        ChatRef {
                            id: *id,
                            kind: *kind,
                        },
                        set.clone(),
                    )
                })
            })
            .collect())
    }
}
