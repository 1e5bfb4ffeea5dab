use crate::domain::chat::ChatId;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// What a polling tick asks the scheduler to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Retire,
}

struct Entry {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Tasks {
    next_generation: u64,
    entries: HashMap<ChatId, Entry>,
}

/// Runs at most one recurring polling task per chat.
///
/// Cloning shares the same task table.
#[derive(Clone, Default)]
pub struct PollScheduler {
    tasks: Arc<Mutex<Tasks>>,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts polling `chat_id`, first after `first_delay` and then every
    /// `interval`, until `task` returns [`TickControl::Retire`] or the chat is
    /// cancelled. Returns `false` without doing anything if the chat already
    /// has a task.
    pub fn schedule<F, Fut>(
        &self,
        chat_id: ChatId,
        interval: Duration,
        first_delay: Duration,
        task: F,
    ) -> bool
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TickControl> + Send + 'static,
    {
        let mut tasks = self.lock();
        if tasks.entries.contains_key(&chat_id) {
            return false;
        }
        tasks.next_generation += 1;
        let generation = tasks.next_generation;

        let table = Arc::clone(&self.tasks);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + first_delay, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if task().await == TickControl::Retire {
                    break;
                }
            }
            release(&table, chat_id, generation);
            tracing::debug!(chat_id, "polling task retired");
        });

        tasks.entries.insert(chat_id, Entry { generation, handle });
        tracing::debug!(chat_id, "polling task scheduled");
        true
    }

    /// Stops and forgets the chat's task. Safe to call from inside the task's
    /// own tick; the abort lands at its next suspension point.
    pub fn cancel(&self, chat_id: ChatId) -> bool {
        match self.lock().entries.remove(&chat_id) {
            Some(entry) => {
                entry.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        for (_, entry) in self.lock().entries.drain() {
            entry.handle.abort();
        }
    }

    pub fn is_scheduled(&self, chat_id: ChatId) -> bool {
        self.lock().entries.contains_key(&chat_id)
    }

    pub fn active(&self) -> usize {
        self.lock().entries.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tasks> {
        // The table stays consistent even if a holder panicked.
        self.tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn release(tasks: &Mutex<Tasks>, chat_id: ChatId, generation: u64) {
    let mut tasks = tasks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if tasks
        .entries
        .get(&chat_id)
        .is_some_and(|entry| entry.generation == generation)
    {
        tasks.entries.remove(&chat_id);
    }
}
