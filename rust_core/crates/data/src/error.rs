//! Data-layer error types.

use chrono::NaiveDateTime;
use swing_calendar::{CacheError, CalendarError};
use thiserror::Error;

/// Errors that can occur while loading, validating or navigating a series.
#[derive(Debug, Error)]
pub enum DataError {
    /// Source bars were out of order, duplicated, or dated on a closed day.
    #[error("Ordering violation for {symbol}: expected {expected}, got {found}")]
    OrderingViolation {
        /// Symbol being loaded.
        symbol: String,
        /// Stamp the calendar expected next.
        expected: NaiveDateTime,
        /// Stamp the source returned.
        found: NaiveDateTime,
    },

    /// A seek target could not be resolved to a bar.
    #[error("No bar for {symbol} at {stamp}")]
    DateNotFound {
        /// Series symbol.
        symbol: String,
        /// Requested stamp.
        stamp: NaiveDateTime,
    },

    /// A series must hold at least one bar.
    #[error("Empty data")]
    EmptyData,

    /// Data violated a structural rule.
    #[error("Corrupt data: {0}")]
    CorruptData(String),

    /// A bar or split source failed.
    #[error("Source error: {0}")]
    Source(String),

    /// Calendar lookup failed.
    #[error(transparent)]
    Calendar(#[from] CalendarError),

    /// Split index failure.
    #[error(transparent)]
    Cache(#[from] CacheError),
}
