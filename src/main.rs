use clap::Parser;
use dexwatch::application::engine::TrackingEngine;
use dexwatch::application::service::TrackerService;
use dexwatch::config::Config;
use dexwatch::domain::ports::ChatStoreBox;
use dexwatch::infrastructure::clock::SystemClock;
use dexwatch::infrastructure::dexscreener::DexScreenerProvider;
use dexwatch::infrastructure::in_memory::InMemoryChatStore;
use dexwatch::infrastructure::telegram::TelegramClient;
use dexwatch::interfaces::bot::BotRunner;
use miette::{IntoDiagnostic, Result};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(config: &Config) -> Result<ChatStoreBox> {
    if let Some(db_path) = &config.db_path {
        #[cfg(feature = "storage-rocksdb")]
        {
            use dexwatch::infrastructure::rocksdb::RocksDBChatStore;
            let store = RocksDBChatStore::open(db_path).into_diagnostic()?;
            tracing::info!(path = %db_path.display(), "using RocksDB chat store");
            return Ok(Box::new(store));
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        tracing::warn!(
            path = %db_path.display(),
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(Box::new(InMemoryChatStore::new()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing();

    let store = open_store(&config)?;
    let provider = DexScreenerProvider::new(config.provider_settings()).into_diagnostic()?;
    let telegram = TelegramClient::new(
        &config.telegram_api_url,
        &config.bot_token,
        config.request_timeout(),
    )
    .into_diagnostic()?;

    let engine = TrackingEngine::new(
        Box::new(provider),
        Arc::new(SystemClock),
        config.tracking_policy(),
    );
    let service = Arc::new(TrackerService::new(store, engine, Arc::new(telegram.clone())));

    // Resume polling for chats that were tracking before the restart
    service.recover().await.into_diagnostic()?;

    let bot = BotRunner::new(telegram, Arc::clone(&service), config.bot_username.clone());
    bot.run(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    })
    .await;

    tracing::info!("shutting down");
    service.shutdown().await.into_diagnostic()?;
    Ok(())
}
