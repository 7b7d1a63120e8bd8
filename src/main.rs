mod auth;
mod browser;
mod config;
mod extract;
mod models;
mod notify;
mod orchestrator;

use anyhow::{Context, Result};
use config::Config;
use notify::{Notifier, TelegramNotifier};
use orchestrator::Orchestrator;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("🏠 Accommodation Scout - CROUS housing notifier");
    info!("===============================================");

    let config = Config::from_env().context("Failed to load configuration")?;

    let notifier = TelegramNotifier::new(&config.telegram_bot_token)?;
    notifier
        .check()
        .await
        .context("Telegram bot token check failed")?;
    info!("Notification channel ready: {}", notifier.channel_name());

    let orchestrator = Orchestrator::new(config, Box::new(notifier));

    info!("Starting polling loop...");
    if let Err(e) = orchestrator.run().await {
        error!("Polling loop stopped: {e:#}");
        return Err(e);
    }

    Ok(())
}
