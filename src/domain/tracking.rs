use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Upper bound on concurrently tracked tokens per chat.
pub const MAX_TRACKING_SLOTS: usize = 2;

/// Symbol shown when the pairs lookup has nothing usable.
pub const UNKNOWN_SYMBOL: &str = "Unknown";

/// Status reported when the orders lookup returns no record.
pub const NOT_PAID_STATUS: &str = "not paid";

/// Point-in-time view of a token as reported by the status provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSnapshot {
    pub status: String,
    /// Unix milliseconds, zero when unknown.
    pub payment_timestamp: i64,
    pub symbol: String,
}

impl TokenSnapshot {
    pub fn new(status: impl Into<String>, payment_timestamp: i64, symbol: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            payment_timestamp,
            symbol: symbol.into(),
        }
    }
}

/// Returns true for statuses after which monitoring stops for good.
pub fn is_terminal(status: &str) -> bool {
    status.eq_ignore_ascii_case("approved") || status.eq_ignore_ascii_case("updated")
}

pub fn is_approved(status: &str) -> bool {
    status.eq_ignore_ascii_case("approved")
}

pub fn is_processing(status: &str) -> bool {
    status.eq_ignore_ascii_case("processing")
}

/// Status changes in this bucket are announced with the token image.
pub fn wants_image(status: &str) -> bool {
    is_processing(status) || is_approved(status)
}

/// One token under active monitoring in a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedItem {
    pub address: String,
    pub symbol: String,
    pub last_status: String,
    pub last_change: DateTime<Utc>,
}

impl TrackedItem {
    pub fn new(address: impl Into<String>, snapshot: &TokenSnapshot, now: DateTime<Utc>) -> Self {
        let symbol = if snapshot.symbol.is_empty() {
            UNKNOWN_SYMBOL.to_string()
        } else {
            snapshot.symbol.clone()
        };
        Self {
            address: address.into(),
            symbol,
            last_status: snapshot.status.clone(),
            last_change: now,
        }
    }
}

/// A 1-based slot offered as a replacement choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSummary {
    pub slot: usize,
    pub symbol: String,
}

/// The bounded, insertion-ordered set of tokens a chat is watching.
///
/// Slot numbers are positions in insertion order, so the map must keep it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatTrackingSet {
    #[serde(rename = "tracked_tokens", default)]
    items: IndexMap<String, TrackedItem>,
    #[serde(
        rename = "pending_token",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pending_replacement: Option<String>,
}

impl ChatTrackingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= MAX_TRACKING_SLOTS
    }

    pub fn contains(&self, address: &str) -> bool {
        self.items.contains_key(address)
    }

    pub fn get(&self, address: &str) -> Option<&TrackedItem> {
        self.items.get(address)
    }

    pub fn get_mut(&mut self, address: &str) -> Option<&mut TrackedItem> {
        self.items.get_mut(address)
    }

    /// Items in slot order.
    pub fn items(&self) -> impl Iterator<Item = &TrackedItem> {
        self.items.values()
    }

    pub fn addresses(&self) -> Vec<String> {
        self.items.keys().cloned().collect()
    }

    /// Appends a new item at the last slot. An existing key keeps its slot.
    pub fn insert(&mut self, item: TrackedItem) {
        self.items.insert(item.address.clone(), item);
    }

    /// Removes an item while keeping the order of the rest.
    pub fn remove(&mut self, address: &str) -> Option<TrackedItem> {
        self.items.shift_remove(address)
    }

    /// Removes the item at a 1-based slot.
    pub fn remove_slot(&mut self, slot: usize) -> Option<TrackedItem> {
        if slot == 0 {
            return None;
        }
        self.items.shift_remove_index(slot - 1).map(|(_, item)| item)
    }

    /// Summaries for the first `MAX_TRACKING_SLOTS` items.
    pub fn slot_summaries(&self) -> Vec<SlotSummary> {
        self.items
            .values()
            .take(MAX_TRACKING_SLOTS)
            .enumerate()
            .map(|(i, item)| SlotSummary {
                slot: i + 1,
                symbol: item.symbol.clone(),
            })
            .collect()
    }

    /// Drops everything past the first `max` slots.
    pub fn truncate(&mut self, max: usize) {
        self.items.truncate(max);
    }

    pub fn pending_replacement(&self) -> Option<&str> {
        self.pending_replacement.as_deref()
    }

    pub fn set_pending_replacement(&mut self, address: impl Into<String>) {
        self.pending_replacement = Some(address.into());
    }

    pub fn clear_pending_replacement(&mut self) -> Option<String> {
        self.pending_replacement.take()
    }

    /// Empties the set and forgets any pending replacement. Returns how many
    /// items were dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.items.len();
        self.items.clear();
        self.pending_replacement = None;
        count
    }
}
