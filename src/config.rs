use crate::application::engine::TrackingPolicy;
use crate::infrastructure::dexscreener::{self, ProviderSettings};
use crate::infrastructure::telegram;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Telegram bot that follows DexScreener order status for Solana tokens.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Telegram Bot API token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: String,

    /// Bot username, used to ignore commands addressed to other bots
    #[arg(long, env = "DEXWATCH_BOT_USERNAME")]
    pub bot_username: Option<String>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "DEXWATCH_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Base URL of the token status API
    #[arg(long, env = "DEXWATCH_STATUS_API_URL", default_value = dexscreener::DEFAULT_BASE_URL)]
    pub status_api_url: String,

    /// Base URL of the Telegram Bot API
    #[arg(long, env = "DEXWATCH_TELEGRAM_API_URL", default_value = telegram::DEFAULT_API_URL)]
    pub telegram_api_url: String,

    /// Seconds between status polls for a chat
    #[arg(long, default_value_t = 10)]
    pub poll_interval_secs: u64,

    /// Seconds before the first poll of a newly tracked chat
    #[arg(long, default_value_t = 10)]
    pub first_poll_delay_secs: u64,

    /// Seconds without a status change before a token is dropped
    #[arg(long, default_value_t = 1800)]
    pub idle_timeout_secs: u64,

    /// Attempts per status lookup
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub fetch_attempts: u32,

    /// Milliseconds to wait between lookup attempts
    #[arg(long, default_value_t = 1000)]
    pub fetch_backoff_ms: u64,

    /// HTTP request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn tracking_policy(&self) -> TrackingPolicy {
        TrackingPolicy {
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            first_poll_delay: Duration::from_secs(self.first_poll_delay_secs),
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
        }
    }

    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            base_url: self.status_api_url.clone(),
            max_attempts: self.fetch_attempts,
            retry_backoff: Duration::from_millis(self.fetch_backoff_ms),
            request_timeout: self.request_timeout(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
