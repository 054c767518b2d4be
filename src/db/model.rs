//! Database entity models returned by repositories.
//!
//! Keep these structs focused on the data returned by queries. Business logic
//! should live in higher layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One row of the dedup table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DedupRecord {
    pub id: String,
    pub sent: bool,
    pub first_seen_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}
