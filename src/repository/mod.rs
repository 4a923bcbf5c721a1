//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking
//! against a SQLite backend.

pub mod listing;
pub mod migrations;
pub mod models;
pub mod pool;

pub use listing::ListingRepository;
pub use migrations::run_migrations;
pub use pool::{AsyncSqliteConnection, AsyncSqlitePool, DieselError};

use chrono::{DateTime, Utc};

/// Parse a datetime string from the database.
///
/// Timestamps are stored as RFC 3339 text; anything unparsable collapses to
/// the Unix epoch rather than failing the read.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}
