//! Dedup store: which listing ids were seen and whether they were notified.
//!
//! - `model`: typed rows returned by repositories.
//! - `repo`: SQL-only functions over a SQLite pool.
//!
//! External modules import from `rent_watchbot::db`; the repository API is
//! re-exported here.

pub mod model;
pub mod repo;

pub use model::DedupRecord;
pub use repo::*;
