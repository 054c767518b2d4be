use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use rent_watchbot::notify::{RetryPolicy, TelegramNotifier};
use rent_watchbot::olx::OlxClient;
use rent_watchbot::pipeline::Watcher;
use rent_watchbot::scheduler::{run_polling, IntervalTicker};
use rent_watchbot::{config, db};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Run a single polling cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    rent_watchbot::init_tracing();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    cfg.ensure_dirs()?;

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| cfg.default_database_url());

    info!("initializing database");
    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool)
        .await
        .context("failed to prepare listings table")?;

    let olx = Arc::new(OlxClient::from_config(&cfg.olx)?);
    let watcher = Watcher {
        pool,
        source: olx.clone(),
        directory: olx,
        notifier: Arc::new(TelegramNotifier::from_token(&cfg.telegram.bot_token)),
        chats: cfg.telegram.chat_ids.clone(),
        retry: RetryPolicy::from(&cfg.telegram),
    };

    if args.once {
        let report = watcher.run_cycle().await?;
        info!(?report, "single cycle finished");
        return Ok(());
    }

    let period = Duration::from_secs(cfg.app.poll_interval_secs);
    info!(every_secs = period.as_secs(), chats = watcher.chats.len(), "scheduler started");
    let mut ticker = IntervalTicker::new(period);
    run_polling(&mut ticker, || watcher.run_cycle()).await;
    Ok(())
}
