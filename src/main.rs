use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;
use teloxide::utils::command::BotCommands;
use tracing::info;
use tracing_subscriber::EnvFilter;

use marketbot::bot::{self, Command, Router};
use marketbot::config::{BotConfig, LogFormat, Transport};
use marketbot::db::{self, PgStore};
use marketbot::marketplace::Marketplace;
use marketbot::memory_store::MemoryStore;
use marketbot::notifier::TelegramNotifier;
use marketbot::store::MarketStore;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().with_target(false).init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = BotConfig::from_env()?;
    init_tracing(config.log_format);

    info!("Starting market bot");

    let store: Arc<dyn MarketStore> = match &config.database_url {
        Some(url) => {
            info!(max_connections = config.max_connections, "Connecting to PostgreSQL");
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(url)
                .await
                .context("Failed to connect to the database")?;
            db::init_database_schema(&pool)
                .await
                .context("Failed to initialize the database schema")?;
            Arc::new(PgStore::new(pool))
        }
        None => {
            info!("DATABASE_URL not set, using the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let bot = Bot::new(&config.bot_token);
    let me = bot.get_me().await.context("Failed to reach the Telegram API")?;
    info!(username = %me.username(), "Bot authenticated");

    bot.set_my_commands(Command::bot_commands())
        .await
        .context("Failed to register bot commands")?;

    let notifier = Arc::new(TelegramNotifier::new(bot.clone()));
    let market = Marketplace::new(store, notifier, config.admin.clone())
        .await
        .context("Failed to load the marketplace")?;
    if market.directory.admin_id().await.is_none() {
        info!("No administrator bound yet, waiting for ADMIN_USERNAME or /claim_admin");
    }
    let router = Arc::new(Router::new(Arc::new(market), me.username()));

    let mut dispatcher = Dispatcher::builder(bot.clone(), bot::build_schema())
        .dependencies(dptree::deps![router])
        .enable_ctrlc_handler()
        .build();

    match config.transport {
        Transport::LongPolling => {
            info!("Bot initialized, starting long polling");
            dispatcher.dispatch().await;
        }
        Transport::Webhook { url, address } => {
            info!(%url, %address, "Bot initialized, starting webhook listener");
            let listener = webhooks::axum(bot, webhooks::Options::new(address, url))
                .await
                .context("Failed to start the webhook listener")?;
            dispatcher
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await;
        }
    }

    Ok(())
}
