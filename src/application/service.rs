use crate::application::engine::{RegistrationOutcome, ReplacementOutcome, TrackingEngine};
use crate::application::messages;
use crate::application::notify::{Notification, deliver};
use crate::application::scheduler::{PollScheduler, TickControl};
use crate::domain::address::TokenAddress;
use crate::domain::chat::{ChatId, ChatRef};
use crate::domain::ports::{ChatStoreBox, Choice, NotificationSink};
use crate::domain::tracking::ChatTrackingSet;
use crate::error::{Result, TrackerError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

/// Per-chat async locks around the load-modify-save of a tracking set.
#[derive(Default)]
struct ChatLocks {
    locks: Mutex<HashMap<ChatId, Arc<tokio::sync::Mutex<()>>>>,
}

impl ChatLocks {
    async fn acquire(&self, chat_id: ChatId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
            Arc::clone(locks.entry(chat_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Forgets the chat's lock when nobody holds or waits on it.
    fn prune(&self, chat_id: ChatId) {
        let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
        if locks
            .get(&chat_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&chat_id);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

/// Entry point for chat commands and polling ticks.
///
/// Owns the chat store, the tracking engine and the poll scheduler. Every
/// operation on a chat runs under that chat's lock, so a command and a tick
/// never interleave on the same set.
pub struct TrackerService {
    store: ChatStoreBox,
    engine: TrackingEngine,
    sink: Arc<dyn NotificationSink>,
    scheduler: PollScheduler,
    locks: ChatLocks,
}

impl TrackerService {
    pub fn new(store: ChatStoreBox, engine: TrackingEngine, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            store,
            engine,
            sink,
            scheduler: PollScheduler::new(),
            locks: ChatLocks::default(),
        }
    }

    pub async fn start(&self, chat: ChatRef) -> Result<()> {
        self.sink.send_text(chat.id, messages::START_HINT).await
    }

    /// Handles `/track <address>`.
    pub async fn track(self: &Arc<Self>, chat: ChatRef, argument: Option<&str>) -> Result<()> {
        let Some(raw) = argument.map(str::trim).filter(|s| !s.is_empty()) else {
            return self.sink.send_text(chat.id, messages::MISSING_ADDRESS).await;
        };
        let address = match TokenAddress::parse(raw) {
            Ok(address) => address,
            Err(TrackerError::ValidationError(msg)) => {
                return self.sink.send_text(chat.id, &msg).await;
            }
            Err(e) => return Err(e),
        };

        // Looked up before locking so a slow provider never holds the chat.
        let snapshot = match self.engine.lookup(address.as_str()).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(%chat, address = %address, error = %e, "initial lookup failed");
                return self.sink.send_text(chat.id, messages::LOOKUP_FAILED).await;
            }
        };

        let _guard = self.locks.acquire(chat.id).await;
        let mut set = self.store.load(chat).await?;
        let outcome = self.engine.register(&mut set, address.as_str(), snapshot).await;

        match outcome {
            RegistrationOutcome::ImmediateTerminal { notification } => {
                deliver(self.sink.as_ref(), chat.id, &notification).await
            }
            RegistrationOutcome::AlreadyTracked => {
                self.sink
                    .send_text(chat.id, &messages::already_tracking(address.as_str()))
                    .await
            }
            RegistrationOutcome::SlotsFull { slots } => {
                self.store.save(chat, &set).await?;
                let choices: Vec<Choice> = slots
                    .iter()
                    .map(|s| Choice {
                        label: messages::replace_choice(s.slot, &s.symbol),
                        action: format!("replace_{}", s.slot),
                    })
                    .collect();
                self.sink
                    .send_choices(chat.id, messages::SLOTS_FULL, &choices)
                    .await
            }
            RegistrationOutcome::Tracked { notification, .. } => {
                self.store.save(chat, &set).await?;
                self.ensure_polling(chat);
                deliver(self.sink.as_ref(), chat.id, &notification).await
            }
        }
    }

    /// Handles a `replace_<slot>` choice.
    pub async fn replace(self: &Arc<Self>, chat: ChatRef, selector: &str) -> Result<()> {
        let _guard = self.locks.acquire(chat.id).await;
        let mut set = self.store.load(chat).await?;
        let outcome = self.engine.resolve_replacement(&mut set, selector).await;

        match outcome {
            ReplacementOutcome::NoPending => self.sink.send_text(chat.id, messages::NO_PENDING).await,
            ReplacementOutcome::InvalidSlot => {
                self.sink.send_text(chat.id, messages::INVALID_SLOT).await
            }
            ReplacementOutcome::FetchFailed { removed, .. } => {
                tracing::warn!(%chat, dropped = %removed.address, "slot emptied by failed replacement");
                self.store.save(chat, &set).await?;
                self.sink
                    .send_text(chat.id, messages::REPLACEMENT_LOOKUP_FAILED)
                    .await
            }
            ReplacementOutcome::ReplacedButTerminal { notification, .. } => {
                self.store.save(chat, &set).await?;
                deliver(self.sink.as_ref(), chat.id, &notification).await
            }
            ReplacementOutcome::Replaced { notification, .. } => {
                self.store.save(chat, &set).await?;
                self.ensure_polling(chat);
                deliver(self.sink.as_ref(), chat.id, &notification).await
            }
        }
    }

    /// Handles `/watching`.
    pub async fn watching(&self, chat: ChatRef) -> Result<()> {
        let set = self.store.load(chat).await?;
        if set.is_empty() {
            return self.sink.send_text(chat.id, messages::NO_ACTIVE_TRACKING).await;
        }
        let text = messages::watching(
            set.items()
                .map(|item| (item.symbol.as_str(), item.address.as_str())),
        );
        self.sink.send_text(chat.id, &text).await
    }

    /// Handles `/stop`: forgets every tracked token and the pending
    /// replacement, and stops polling.
    pub async fn stop(&self, chat: ChatRef) -> Result<()> {
        let (had_state, count) = {
            let _guard = self.locks.acquire(chat.id).await;
            let mut set = self.store.load(chat).await?;
            let had_state = !set.is_empty() || set.pending_replacement().is_some();
            let count = set.clear();
            self.store.remove(chat).await?;
            self.scheduler.cancel(chat.id);
            (had_state, count)
        };
        self.locks.prune(chat.id);

        if had_state {
            tracing::info!(%chat, count, "tracking stopped by user");
            self.sink.send_text(chat.id, &messages::stopped_all(count)).await
        } else {
            self.sink.send_text(chat.id, messages::NO_ACTIVE_TRACKING).await
        }
    }

    /// One polling tick for a chat.
    pub async fn poll(&self, chat: ChatRef) -> TickControl {
        let guard = self.locks.acquire(chat.id).await;
        let control = match self.poll_locked(chat).await {
            Ok(TickControl::Retire) => {
                self.scheduler.cancel(chat.id);
                TickControl::Retire
            }
            Ok(control) => control,
            Err(e) => {
                tracing::error!(%chat, error = %e, "polling tick failed");
                TickControl::Continue
            }
        };
        drop(guard);
        if control == TickControl::Retire {
            self.locks.prune(chat.id);
        }
        control
    }

    async fn poll_locked(&self, chat: ChatRef) -> Result<TickControl> {
        let mut set = self.store.load(chat).await?;
        let report = self.engine.refresh(&mut set).await;
        self.store.save(chat, &set).await?;

        for notification in &report.notifications {
            self.notify(chat, notification).await;
        }

        if report.retire {
            tracing::info!(%chat, "nothing left to track, retiring poller");
            Ok(TickControl::Retire)
        } else {
            Ok(TickControl::Continue)
        }
    }

    async fn notify(&self, chat: ChatRef, notification: &Notification) {
        if let Err(e) = deliver(self.sink.as_ref(), chat.id, notification).await {
            tracing::error!(%chat, error = %e, "failed to deliver notification");
        }
    }

    /// Starts the chat's poller unless one is already running.
    pub fn ensure_polling(self: &Arc<Self>, chat: ChatRef) -> bool {
        let policy = *self.engine.policy();
        let service = Arc::clone(self);
        let scheduled = self.scheduler.schedule(
            chat.id,
            policy.poll_interval,
            policy.first_poll_delay,
            move || {
                let service = Arc::clone(&service);
                async move { service.poll(chat).await }
            },
        );
        if scheduled {
            tracing::info!(%chat, "polling started");
        }
        scheduled
    }

    /// Re-creates pollers for every stored chat that still tracks something.
    pub async fn recover(self: &Arc<Self>) -> Result<usize> {
        let mut recovered = 0;
        for (chat, set) in self.store.all().await? {
            if !set.is_empty() && self.ensure_polling(chat) {
                recovered += 1;
            }
        }
        tracing::info!(recovered, "polling recovered from storage");
        Ok(recovered)
    }

    /// Stops every poller and flushes the store.
    pub async fn shutdown(&self) -> Result<()> {
        self.scheduler.cancel_all();
        self.store.flush().await
    }

    pub async fn tracking_set(&self, chat: ChatRef) -> Result<ChatTrackingSet> {
        self.store.load(chat).await
    }

    pub fn is_polling(&self, chat_id: ChatId) -> bool {
        self.scheduler.is_scheduled(chat_id)
    }
}
