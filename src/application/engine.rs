use crate::application::messages;
use crate::application::notify::Notification;
use crate::domain::ports::{Clock, StatusProviderBox};
use crate::domain::tracking::{
    ChatTrackingSet, MAX_TRACKING_SLOTS, SlotSummary, TokenSnapshot, TrackedItem, UNKNOWN_SYMBOL,
    is_approved, is_processing, is_terminal, wants_image,
};
use std::sync::Arc;
use std::time::Duration;

/// Timing knobs for polling and idle expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingPolicy {
    pub poll_interval: Duration,
    pub first_poll_delay: Duration,
    pub idle_timeout: Duration,
}

impl Default for TrackingPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            first_poll_delay: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(1800),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationOutcome {
    /// The token already reached a terminal status; nothing was stored.
    ImmediateTerminal { notification: Notification },
    AlreadyTracked,
    /// The set is full; the address is parked as the pending replacement.
    SlotsFull { slots: Vec<SlotSummary> },
    /// Stored. The caller must make sure the chat is being polled.
    Tracked {
        item: TrackedItem,
        notification: Notification,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReplacementOutcome {
    NoPending,
    InvalidSlot,
    /// The slot was already emptied when the lookup failed.
    FetchFailed { slot: usize, removed: TrackedItem },
    ReplacedButTerminal {
        slot: usize,
        removed: TrackedItem,
        notification: Notification,
    },
    Replaced {
        slot: usize,
        removed: TrackedItem,
        item: TrackedItem,
        notification: Notification,
    },
}

/// Result of one polling tick over a chat's set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshReport {
    pub notifications: Vec<Notification>,
    /// Set when the chat has nothing left to poll.
    pub retire: bool,
}

/// The per-chat tracking state machine.
///
/// Holds no chat state of its own: every operation works on the set handed
/// in and leaves persisting it to the caller.
pub struct TrackingEngine {
    provider: StatusProviderBox,
    clock: Arc<dyn Clock>,
    policy: TrackingPolicy,
}

impl TrackingEngine {
    pub fn new(provider: StatusProviderBox, clock: Arc<dyn Clock>, policy: TrackingPolicy) -> Self {
        Self {
            provider,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &TrackingPolicy {
        &self.policy
    }

    /// Current snapshot for an address, used by interactive commands before
    /// they call [`TrackingEngine::register`].
    pub async fn lookup(&self, address: &str) -> crate::error::Result<TokenSnapshot> {
        self.provider.fetch_status(address).await
    }

    /// Registers `address` with the status fetched for it just now.
    pub async fn register(
        &self,
        set: &mut ChatTrackingSet,
        address: &str,
        snapshot: TokenSnapshot,
    ) -> RegistrationOutcome {
        let now = self.clock.now();
        let symbol = display_symbol(&snapshot.symbol);

        if is_terminal(&snapshot.status) {
            let text = messages::status_report(
                &symbol,
                address,
                &snapshot.status,
                snapshot.payment_timestamp,
                now,
            );
            let image = if is_approved(&snapshot.status) {
                self.provider.fetch_image(address).await
            } else {
                None
            };
            return RegistrationOutcome::ImmediateTerminal {
                notification: Notification::with_image(text, image),
            };
        }

        if set.contains(address) {
            return RegistrationOutcome::AlreadyTracked;
        }

        if set.is_full() {
            set.set_pending_replacement(address);
            return RegistrationOutcome::SlotsFull {
                slots: set.slot_summaries(),
            };
        }

        let item = TrackedItem::new(address, &snapshot, now);
        set.insert(item.clone());
        tracing::info!(address, status = %item.last_status, "tracking started");

        let image = if is_processing(&snapshot.status) {
            self.provider.fetch_image(address).await
        } else {
            None
        };
        let text = messages::now_tracking(&item.symbol, address, &item.last_status);
        RegistrationOutcome::Tracked {
            item,
            notification: Notification::with_image(text, image),
        }
    }

    /// Swaps the pending replacement into the 1-based slot named by `selector`.
    ///
    /// The old item is removed before the replacement is looked up, so a
    /// failed lookup leaves the slot empty.
    pub async fn resolve_replacement(
        &self,
        set: &mut ChatTrackingSet,
        selector: &str,
    ) -> ReplacementOutcome {
        let Some(pending) = set.pending_replacement().map(str::to_string) else {
            return ReplacementOutcome::NoPending;
        };

        let slot = match selector.trim().parse::<usize>() {
            Ok(slot) if (1..=set.len()).contains(&slot) => slot,
            _ => return ReplacementOutcome::InvalidSlot,
        };
        let Some(removed) = set.remove_slot(slot) else {
            return ReplacementOutcome::InvalidSlot;
        };

        let snapshot = match self.provider.fetch_status(&pending).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(address = %pending, slot, error = %e, "replacement lookup failed");
                return ReplacementOutcome::FetchFailed { slot, removed };
            }
        };

        let now = self.clock.now();
        let symbol = display_symbol(&snapshot.symbol);
        let text = messages::replaced(
            slot,
            &symbol,
            &pending,
            &snapshot.status,
            snapshot.payment_timestamp,
            now,
        );
        set.clear_pending_replacement();

        if is_terminal(&snapshot.status) {
            return ReplacementOutcome::ReplacedButTerminal {
                slot,
                removed,
                notification: Notification::text(text),
            };
        }

        let item = TrackedItem::new(pending.as_str(), &snapshot, now);
        set.insert(item.clone());
        let image = if is_processing(&snapshot.status) {
            self.provider.fetch_image(&pending).await
        } else {
            None
        };
        ReplacementOutcome::Replaced {
            slot,
            removed,
            item,
            notification: Notification::with_image(text, image),
        }
    }

    /// Runs one polling tick: refreshes every item, applies transitions and
    /// idle expiry, and reports what the chat should be told.
    pub async fn refresh(&self, set: &mut ChatTrackingSet) -> RefreshReport {
        let mut notifications = Vec::new();

        for address in set.addresses() {
            let Some(item) = set.get(&address).cloned() else {
                continue;
            };

            let snapshot = match self.provider.fetch_status(&address).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::warn!(address = %address, error = %e, "status refresh failed, retrying next tick");
                    continue;
                }
            };

            let now = self.clock.now();
            let symbol = if item.symbol.is_empty() {
                display_symbol(&snapshot.symbol)
            } else {
                item.symbol.clone()
            };
            let current = snapshot.status.as_str();

            if current != item.last_status {
                tracing::info!(
                    address = %address,
                    from = %item.last_status,
                    to = %current,
                    "status changed"
                );
                let image = self.provider.fetch_image(&address).await;
                let text = messages::status_report(
                    &symbol,
                    &address,
                    current,
                    snapshot.payment_timestamp,
                    now,
                );
                let first_image = if wants_image(current) { image.clone() } else { None };
                notifications.push(Notification::with_image(text, first_image));

                if let Some(tracked) = set.get_mut(&address) {
                    tracked.symbol = symbol.clone();
                    tracked.last_status = current.to_string();
                    tracked.last_change = now;
                }

                if is_terminal(current) {
                    set.remove(&address);
                    let final_image = if is_approved(current) { image } else { None };
                    notifications.push(Notification::with_image(
                        messages::stopped_tracking(&symbol, &address),
                        final_image,
                    ));
                }
            } else if idle_expired(&item, now, self.policy.idle_timeout) {
                tracing::info!(address = %address, "no status change within idle timeout");
                set.remove(&address);
                notifications.push(Notification::text(messages::stopped_idle(
                    &symbol,
                    &address,
                    self.policy.idle_timeout,
                )));
            }
        }

        set.truncate(MAX_TRACKING_SLOTS);
        RefreshReport {
            notifications,
            retire: set.is_empty(),
        }
    }
}

fn display_symbol(symbol: &str) -> String {
    if symbol.is_empty() {
        UNKNOWN_SYMBOL.to_string()
    } else {
        symbol.to_string()
    }
}

fn idle_expired(item: &TrackedItem, now: chrono::DateTime<chrono::Utc>, timeout: Duration) -> bool {
    let elapsed = now.signed_duration_since(item.last_change);
    elapsed.num_milliseconds() > timeout.as_millis() as i64
}
