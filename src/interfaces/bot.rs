use crate::application::service::TrackerService;
use crate::infrastructure::telegram::{CallbackQuery, Message, TelegramClient, Update};
use crate::interfaces::commands::{CallbackAction, Command};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

const ERROR_BACKOFF: Duration = Duration::from_secs(2);

/// Long-polls the Bot API and routes updates to the tracker service.
///
/// Each update is handled on its own task, so a chat stuck behind a slow
/// lookup never holds up the others.
#[derive(Clone)]
pub struct BotRunner {
    client: TelegramClient,
    service: Arc<TrackerService>,
    bot_username: Option<String>,
}

impl BotRunner {
    pub fn new(client: TelegramClient, service: Arc<TrackerService>, bot_username: Option<String>) -> Self {
        Self {
            client,
            service,
            bot_username,
        }
    }

    /// Processes updates until `shutdown` resolves. Handlers still running
    /// at that point are aborted.
    pub async fn run<S>(&self, shutdown: S)
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut offset = 0;
        let mut handlers = JoinSet::new();
        tracing::info!("listening for updates");

        loop {
            while let Some(finished) = handlers.try_join_next() {
                if let Err(e) = finished {
                    tracing::error!(error = %e, "update handler panicked");
                }
            }

            let updates = tokio::select! {
                _ = &mut shutdown => break,
                result = self.client.get_updates(offset) => result,
            };

            match updates {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let runner = self.clone();
                        handlers.spawn(async move { runner.handle_update(update).await });
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "polling updates failed");
                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(ERROR_BACKOFF) => {}
                    }
                }
            }
        }
        if !handlers.is_empty() {
            tracing::info!(in_flight = handlers.len(), "aborting unfinished updates");
        }
        handlers.shutdown().await;
        tracing::info!("update loop stopped");
    }

    /// Routes a single update. Failures are logged and never escape.
    pub async fn handle_update(&self, update: Update) {
        if let Some(message) = update.message {
            self.handle_message(message).await;
        } else if let Some(callback) = update.callback_query {
            self.handle_callback(callback).await;
        }
    }

    async fn handle_message(&self, message: Message) {
        let Some(text) = message.text.as_deref() else {
            return;
        };
        let Some(command) = Command::parse(text, self.bot_username.as_deref()) else {
            return;
        };
        let chat = message.chat.chat_ref();
        tracing::debug!(%chat, ?command, "command received");

        let result = match &command {
            Command::Start => self.service.start(chat).await,
            Command::Track(argument) => self.service.track(chat, argument.as_deref()).await,
            Command::Watching => self.service.watching(chat).await,
            Command::Stop => self.service.stop(chat).await,
        };
        if let Err(e) = result {
            tracing::error!(%chat, ?command, error = %e, "command failed");
        }
    }

    async fn handle_callback(&self, callback: CallbackQuery) {
        if let Err(e) = self.client.answer_callback_query(&callback.id).await {
            tracing::warn!(callback_id = %callback.id, error = %e, "failed to answer callback");
        }
        let (Some(data), Some(message)) = (callback.data.as_deref(), callback.message.as_ref()) else {
            return;
        };
        let Some(action) = CallbackAction::parse(data) else {
            return;
        };
        let chat = message.chat.chat_ref();

        let result = match &action {
            CallbackAction::Replace(selector) => self.service.replace(chat, selector).await,
        };
        if let Err(e) = result {
            tracing::error!(%chat, ?action, error = %e, "callback failed");
        }
    }
}
