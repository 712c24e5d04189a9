mod config;
mod discord_webhook;
mod realtime_search;
mod sent_store;
mod version;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Parser;
use rtnotify_core::{DateBoundary, NotificationPipeline};
use tracing::info;

use crate::{
    config::{open_config, write_default_config},
    discord_webhook::DiscordWebhook,
    realtime_search::RealtimeSearch,
    sent_store::PgSentStore,
    version::{short_version, user_agent},
};

/// 検索結果に今日のポストが現れたら 1 日 1 回だけ Discord に通知する。
///
/// 常駐せず、外部のスケジューラから定期的に起動されることを想定している。
#[derive(Parser)]
#[command(version = short_version())]
struct Args {
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[arg(long)]
    init: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    if args.init {
        write_default_config(&args.config)?;
        info!(path = ?args.config, "Created default configuration");
        return Ok(());
    }

    info!(version = short_version(), "rtnotify version");

    let config = open_config(&args.config).context("Failed to load configuration")?;
    let query = config.search_query()?;
    info!(
        keyword = %query.keyword(),
        author_id = ?query.author_id(),
        utc_offset = %config.utc_offset,
        "Configuration loaded"
    );

    let timeouts = &config.timeouts;
    let scraper = RealtimeSearch::new(&config.search.endpoint, timeouts.scrape, user_agent())?;
    let notifier = DiscordWebhook::new(config.webhook.clone(), timeouts.notify, user_agent())?;
    let store = PgSentStore::connect(&config.store, timeouts.store).await?;

    let pipeline = NotificationPipeline::new(scraper, store, notifier, query)
        .with_boundary(DateBoundary::new(config.utc_offset))
        .with_deadlines(timeouts.deadlines());

    let outcome = pipeline.run().await?;
    info!(outcome = ?outcome, "Run finished");

    Ok(())
}
