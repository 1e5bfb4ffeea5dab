#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use dexwatch::application::engine::{TrackingEngine, TrackingPolicy};
use dexwatch::application::service::TrackerService;
use dexwatch::domain::chat::ChatId;
use dexwatch::domain::ports::{ChatStore, Choice, Clock, NotificationSink, StatusProvider};
use dexwatch::domain::tracking::TokenSnapshot;
use dexwatch::error::{Result, TrackerError};
use dexwatch::infrastructure::in_memory::InMemoryChatStore;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ADDR_A: &str = "So11111111111111111111111111111111111111112";
pub const ADDR_B: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
pub const ADDR_C: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";

/// Status provider whose answers are set by the test.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    statuses: Arc<Mutex<HashMap<String, Option<TokenSnapshot>>>>,
    images: Arc<Mutex<HashMap<String, String>>>,
    stalled: Arc<Mutex<HashSet<String>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedProvider {
    pub fn set_status(&self, address: &str, status: &str, symbol: &str) {
        self.statuses.lock().unwrap().insert(
            address.to_string(),
            Some(TokenSnapshot::new(status, 0, symbol)),
        );
    }

    pub fn set_failing(&self, address: &str) {
        self.statuses.lock().unwrap().insert(address.to_string(), None);
    }

    pub fn set_image(&self, address: &str, url: &str) {
        self.images
            .lock()
            .unwrap()
            .insert(address.to_string(), url.to_string());
    }

    /// Lookups for `address` never complete.
    pub fn set_stalled(&self, address: &str) {
        self.stalled.lock().unwrap().insert(address.to_string());
    }

    pub fn status_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl StatusProvider for ScriptedProvider {
    async fn fetch_status(&self, address: &str) -> Result<TokenSnapshot> {
        self.calls.lock().unwrap().push(address.to_string());
        let stalled = self.stalled.lock().unwrap().contains(address);
        if stalled {
            std::future::pending::<()>().await;
        }
        self.statuses
            .lock()
            .unwrap()
            .get(address)
            .cloned()
            .flatten()
            .ok_or_else(|| TrackerError::FetchError(format!("no status for {}", address)))
    }

    async fn fetch_image(&self, address: &str) -> Option<String> {
        self.images.lock().unwrap().get(address).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text(ChatId, String),
    Image(ChatId, String, String),
    Choices(ChatId, String, Vec<Choice>),
}

impl Sent {
    pub fn text(&self) -> &str {
        match self {
            Sent::Text(_, text) => text,
            Sent::Image(_, _, caption) => caption,
            Sent::Choices(_, text, _) => text,
        }
    }
}

/// Sink that records everything sent through it.
#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<Sent>>,
    reject_images: Mutex<bool>,
    reject_texts: Mutex<bool>,
}

impl RecordingSink {
    pub fn reject_images(&self) {
        *self.reject_images.lock().unwrap() = true;
    }

    /// Every send fails, as when the transport is down.
    pub fn reject_texts(&self) {
        *self.reject_texts.lock().unwrap() = true;
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().iter().map(|s| s.text().to_string()).collect()
    }

    pub fn last(&self) -> Option<Sent> {
        self.sent.lock().unwrap().last().cloned()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        if *self.reject_texts.lock().unwrap() {
            return Err(TrackerError::DeliveryError("transport unavailable".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Text(chat_id, text.to_string()));
        Ok(())
    }

    async fn send_image(&self, chat_id: ChatId, image: &str, caption: &str) -> Result<()> {
        if *self.reject_images.lock().unwrap() {
            return Err(TrackerError::DeliveryError("image rejected".into()));
        }
        self.sent.lock().unwrap().push(Sent::Image(
            chat_id,
            image.to_string(),
            caption.to_string(),
        ));
        Ok(())
    }

    async fn send_choices(&self, chat_id: ChatId, text: &str, choices: &[Choice]) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Choices(
            chat_id,
            text.to_string(),
            choices.to_vec(),
        ));
        Ok(())
    }
}

/// Clock moved by hand.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::from_std(by).unwrap();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub struct Harness {
    pub service: Arc<TrackerService>,
    pub provider: ScriptedProvider,
    pub sink: Arc<RecordingSink>,
    pub clock: Arc<ManualClock>,
}

pub fn harness() -> Harness {
    harness_with_store(InMemoryChatStore::new())
}

pub fn harness_with_store(store: impl ChatStore + 'static) -> Harness {
    let provider = ScriptedProvider::default();
    let sink = Arc::new(RecordingSink::default());
    let clock = Arc::new(ManualClock::new());
    let engine = TrackingEngine::new(
        Box::new(provider.clone()),
        clock.clone(),
        TrackingPolicy::default(),
    );
    let service = Arc::new(TrackerService::new(
        Box::new(store),
        engine,
        sink.clone(),
    ));
    Harness {
        service,
        provider,
        sink,
        clock,
    }
}
