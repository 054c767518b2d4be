use super::model::DedupRecord;
use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, instrument};

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let options = SqliteConnectOptions::from_str(&normalized)
        .with_context(|| format!("invalid database url {normalized}"))?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .context("failed to open listings database")?;
    // Enable WAL and stricter durability.
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous=FULL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

/// In-memory pool pinned to a single connection so every query sees the same database.
pub async fn init_memory_pool() -> Result<Pool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    run_migrations(&pool).await?;
    Ok(pool)
}

/// If using a file-backed SQLite URL, expand a leading `~/` and ensure the parent
/// directory exists. Leaves in-memory URLs untouched. Returns possibly-updated URL.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") || url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    let rest = &url["sqlite:".len()..];
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);
    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };
    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded_path = match (path_part.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path_part.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    let mut rebuilt = String::from("sqlite://");
    rebuilt.push_str(&expanded_path);
    if let Some(q) = query_part {
        rebuilt.push('?');
        rebuilt.push_str(q);
    }
    rebuilt
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Record `id` as seen and return its `sent` flag.
///
/// A fresh id is inserted with `sent = false`. An existing row is left untouched.
#[instrument(skip_all, fields(listing_id = id))]
pub async fn get_or_create_listing(pool: &Pool, id: &str) -> Result<bool> {
    let mut tx = pool.begin().await?;
    let inserted = sqlx::query(
        "INSERT INTO listings (id, sent, first_seen_at) VALUES (?, 0, ?) ON CONFLICT(id) DO NOTHING",
    )
    .bind(id)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?
    .rows_affected();
    let sent: i64 = sqlx::query_scalar("SELECT sent FROM listings WHERE id = ?")
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;
    if inserted > 0 {
        debug!("listing recorded");
    }
    Ok(sent != 0)
}

/// Flag a listing as notified. Calling it again keeps the original `sent_at`.
#[instrument(skip_all, fields(listing_id = id))]
pub async fn mark_listing_sent(pool: &Pool, id: &str) -> Result<()> {
    sqlx::query("UPDATE listings SET sent = 1, sent_at = COALESCE(sent_at, ?) WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

#[instrument(skip_all)]
pub async fn find_listing(pool: &Pool, id: &str) -> Result<Option<DedupRecord>> {
    let row = sqlx::query("SELECT id, sent, first_seen_at, sent_at FROM listings WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let Some(row) = row else {
        return Ok(None);
    };
    Ok(Some(DedupRecord {
        id: row.try_get("id")?,
        sent: row.try_get::<i64, _>("sent")? != 0,
        first_seen_at: row.try_get("first_seen_at")?,
        sent_at: row.try_get("sent_at")?,
    }))
}

pub async fn count_listings(pool: &Pool) -> Result<i64> {
    let cnt: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM listings")
        .fetch_one(pool)
        .await?;
    Ok(cnt)
}
