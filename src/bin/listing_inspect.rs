//! Dry run: fetch, extract and classify the current search results and print the
//! notifications that would be sent. Touches neither the store nor Telegram.
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use rent_watchbot::classify::classify;
use rent_watchbot::config::{self, Config};
use rent_watchbot::extract;
use rent_watchbot::format::format_message;
use rent_watchbot::model::Listing;
use rent_watchbot::olx::{ListingSource, OlxClient};

#[derive(Parser, Debug)]
struct Args {
    /// Path to YAML config
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Skip owner lookups and classify from the description only
    #[arg(long)]
    no_lookups: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    rent_watchbot::init_tracing();
    let args = Args::parse();

    // Telegram settings are irrelevant here, so skip full validation.
    let raw = std::fs::read_to_string(&args.config)
        .with_context(|| format!("failed to read {}", args.config.display()))?;
    let cfg: Config = serde_yaml::from_str(&raw).map_err(config::ConfigError::from)?;
    let client = OlxClient::from_config(&cfg.olx)?;

    let Some(envelope) = client.fetch_listings().await? else {
        println!("No listing data returned.");
        return Ok(());
    };

    let total = extract::listings_in(&envelope).len();
    let drafts = extract::extract_batch(&envelope);
    println!("Accepted {} of {} listings", drafts.len(), total);

    for mut draft in drafts {
        if args.no_lookups {
            draft.user_id = None;
            draft.user_uuid = None;
        }
        let classification = classify(&draft, &client).await;
        let listing = Listing::new(draft, classification);
        println!("----- {} ({}) -----", listing.id(), listing.draft.district_name);
        println!("{}", format_message(&listing));
    }
    Ok(())
}
