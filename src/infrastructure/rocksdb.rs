use crate::domain::chat::{ChatId, ChatKind, ChatRef};
use crate::domain::ports::ChatStore;
use crate::domain::tracking::ChatTrackingSet;
use crate::error::{Result, TrackerError};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family for group chat records.
pub const CF_GROUP_CHATS: &str = "group_chats";
/// Column Family for direct chat records.
pub const CF_DIRECT_CHATS: &str = "direct_chats";

/// A persistent chat store implementation using RocksDB.
///
/// Each chat kind gets its own Column Family; records are JSON-encoded
/// tracking sets keyed by the big-endian chat id.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBChatStore {
    db: Arc<DB>,
}

impl RocksDBChatStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that both partition column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_groups = ColumnFamilyDescriptor::new(CF_GROUP_CHATS, Options::default());
        let cf_direct = ColumnFamilyDescriptor::new(CF_DIRECT_CHATS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_groups, cf_direct])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn cf_name(kind: ChatKind) -> &'static str {
        match kind {
            ChatKind::Group => CF_GROUP_CHATS,
            ChatKind::Direct => CF_DIRECT_CHATS,
        }
    }

    fn handle(&self, kind: ChatKind) -> Result<&rocksdb::ColumnFamily> {
        let name = Self::cf_name(kind);
        self.db.cf_handle(name).ok_or_else(|| {
            TrackerError::StorageError(Box::new(std::io::Error::other(format!(
                "{} column family not found",
                name
            ))))
        })
    }
}

#[async_trait]
impl ChatStore for RocksDBChatStore {
    async fn load(&self, chat: ChatRef) -> Result<ChatTrackingSet> {
        let cf = self.handle(chat.kind)?;
        match self.db.get_cf(cf, chat.id.to_be_bytes())? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(ChatTrackingSet::default()),
        }
    }

    async fn save(&self, chat: ChatRef, set: &ChatTrackingSet) -> Result<()> {
        let cf = self.handle(chat.kind)?;
        let value = serde_json::to_vec(set)?;
        self.db.put_cf(cf, chat.id.to_be_bytes(), value)?;
        Ok(())
    }

    async fn remove(&self, chat: ChatRef) -> Result<()> {
        let cf = self.handle(chat.kind)?;
        self.db.delete_cf(cf, chat.id.to_be_bytes())?;
        Ok(())
    }

    async fn all(&self) -> Result<Vec<(ChatRef, ChatTrackingSet)>> {
        let mut chats = Vec::new();
        for kind in [ChatKind::Group, ChatKind::Direct] {
            let cf = self.handle(kind)?;
            for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
                let (key, value) = item?;
                let id_bytes = <[u8; 8]>::try_from(&key[..]).map_err(|_| {
                    TrackerError::StorageError(Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("malformed chat key of {} bytes", key.len()),
                    )))
                })?;
                let set: ChatTrackingSet = serde_json::from_slice(&value)?;
                chats.push((
                    ChatRef {
                        id: ChatId::from_be_bytes(id_bytes),
                        kind,
                    },
                    set,
                ));
            }
        }
        Ok(chats)
    }

    async fn flush(&self) -> Result<()> {
        for kind in [ChatKind::Group, ChatKind::Direct] {
            self.db.flush_cf(self.handle(kind)?)?;
        }
        Ok(())
    }
}
