use crate::classify::{classify, UserDirectory};
use crate::config::ChatTarget;
use crate::db;
use crate::extract;
use crate::format::format_message;
use crate::model::Listing;
use crate::notify::{deliver_with_retry, Notifier, RetryPolicy};
use crate::olx::ListingSource;
use anyhow::Result;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Counters for one polling cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub accepted: usize,
    pub skipped_seen: usize,
    pub notified: usize,
    pub failed_deliveries: usize,
}

/// Everything a polling cycle needs, built once at startup.
pub struct Watcher {
    pub pool: SqlitePool,
    pub source: Arc<dyn ListingSource>,
    pub directory: Arc<dyn UserDirectory>,
    pub notifier: Arc<dyn Notifier>,
    pub chats: Vec<ChatTarget>,
    pub retry: RetryPolicy,
}

impl Watcher {
    /// Fetch, extract, classify and notify. Store errors abort the cycle.
    #[instrument(skip_all, fields(cycle_id = %Uuid::new_v4()))]
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let mut report = CycleReport::default();
        let Some(envelope) = self.source.fetch_listings().await? else {
            info!("no listing data this cycle");
            return Ok(report);
        };

        report.fetched = extract::listings_in(&envelope).len();
        let drafts = extract::extract_batch(&envelope);
        report.accepted = drafts.len();

        let mut listings = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let classification = classify(&draft, self.directory.as_ref()).await;
            listings.push(Listing::new(draft, classification));
        }

        self.process_listings(&listings, &mut report).await?;
        info!(
            fetched = report.fetched,
            accepted = report.accepted,
            skipped_seen = report.skipped_seen,
            notified = report.notified,
            failed_deliveries = report.failed_deliveries,
            "cycle finished"
        );
        Ok(report)
    }

    /// Dedup-check, format and deliver each listing in order.
    pub async fn process_listings(
        &self,
        listings: &[Listing],
        report: &mut CycleReport,
    ) -> Result<()> {
        for listing in listings {
            self.process_listing(listing, report).await?;
        }
        Ok(())
    }

    #[instrument(skip_all, fields(listing_id = %listing.id()))]
    async fn process_listing(&self, listing: &Listing, report: &mut CycleReport) -> Result<()> {
        if db::get_or_create_listing(&self.pool, listing.id()).await? {
            debug!("already notified");
            report.skipped_seen += 1;
            return Ok(());
        }

        let text = format_message(listing);
        for chat in &self.chats {
            match deliver_with_retry(self.notifier.as_ref(), chat, &text, &self.retry).await {
                Ok(()) => info!(%chat, "listing sent"),
                Err(err) => {
                    error!(%chat, %err, "failed to send listing");
                    report.failed_deliveries += 1;
                }
            }
        }

        // Marked even when every destination failed: one attempt per listing.
        db::mark_listing_sent(&self.pool, listing.id()).await?;
        report.notified += 1;
        Ok(())
    }
}
