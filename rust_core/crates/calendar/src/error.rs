//! Calendar and cache error types.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by [`crate::AssocCache`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Key is longer than the fixed key width.
    #[error("key {key:?} exceeds {max} bytes")]
    KeyTooLong {
        /// Offending key.
        key: String,
        /// Maximum key length.
        max: usize,
    },

    /// A new key would exceed the declared capacity.
    #[error("cache capacity of {capacity} entries exceeded")]
    CapacityExceeded {
        /// Declared capacity.
        capacity: usize,
    },

    /// Keys handed to the sorted variant were not strictly increasing.
    #[error("sorted keys out of order: {prev:?} then {next:?}")]
    UnsortedKeys {
        /// Earlier key.
        prev: String,
        /// Key that should have sorted after it.
        next: String,
    },

    /// A cache must hold at least one entry.
    #[error("cache capacity must be positive")]
    ZeroCapacity,
}

/// Errors raised by [`crate::TradingCalendar`] and its helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    /// The date is not covered by the calendar table.
    #[error("date {0} is not in the calendar")]
    UnknownDate(NaiveDate),

    /// A business-day walk ran off either end of the table.
    #[error("calendar position {0} is out of range")]
    OutOfRange(i64),

    /// Calendar rows were not in strictly increasing date order.
    #[error("calendar rows out of order at {0}")]
    NonMonotonic(NaiveDate),

    /// Calendar rows skipped a day number.
    #[error("calendar day number {found} at {date}, expected {expected}")]
    NonContiguous {
        /// Row date.
        date: NaiveDate,
        /// Day number in the row.
        found: i64,
        /// Day number implied by the row's position.
        expected: i64,
    },

    /// The calendar source returned no rows.
    #[error("calendar has no rows")]
    Empty,

    /// The calendar source failed.
    #[error("calendar source error: {0}")]
    Source(String),

    /// A date computed from calendar fields does not exist.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// Index cache failure.
    #[error(transparent)]
    Cache(#[from] CacheError),
}
